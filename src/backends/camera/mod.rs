// SPDX-License-Identifier: MPL-2.0

//! Camera capture backend
//!
//! ```text
//! ┌─────────────────────┐
//! │   UI / CLI layer    │
//! └──────────┬──────────┘
//!            │ FrameReceiver
//!            ▼
//! ┌─────────────────────┐
//! │   CaptureSession    │  ← Lifecycle, bus watcher
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ GStreamer pipeline  │  ← pipewiresrc / v4l2src → RGBA appsink
//! └─────────────────────┘
//! ```

pub mod enumeration;
pub mod pipeline;
pub mod session;
pub mod types;

pub use enumeration::{enumerate_cameras, select_camera};
pub use session::CaptureSession;
pub use types::*;
