// SPDX-License-Identifier: MPL-2.0

//! Frame processor module for rectangle detection
//!
//! Camera frames are converted to packed RGBA, handed to a
//! [`RectangleDetector`] together with their [`FrameMetadata`], and the
//! resulting quadrilaterals are forwarded to the overlay.

pub mod dispatch;
pub mod frame_image;
pub mod tasks;
pub mod types;

pub use dispatch::FrameDispatcher;
pub use tasks::{ContourRectDetector, RectangleDetector};
pub use types::{
    CameraIntrinsics, DetectionConfig, DeviceOrientation, FrameMetadata, NormalizedPoint,
    Quadrilateral,
};
