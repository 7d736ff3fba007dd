// SPDX-License-Identifier: MPL-2.0

//! QuadCam - live rectangle detection over a camera preview
//!
//! This library provides camera capture, rectangle detection and the
//! overlay that outlines detected rectangles on the preview.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Main application logic and UI, detection and overlay
//! - [`backends`]: Camera discovery and capture sessions
//! - [`config`]: User configuration handling
//! - [`terminal`]: Terminal viewer
//!
//! # Example
//!
//! ```ignore
//! // This is a GUI application, typically run via:
//! // quadcam
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod i18n;
pub mod terminal;

// Re-export commonly used types
pub use app::frame_processor::{
    ContourRectDetector, DetectionConfig, DeviceOrientation, FrameMetadata, NormalizedPoint,
    Quadrilateral, RectangleDetector,
};
pub use app::{AppModel, Message};
pub use config::Config;
