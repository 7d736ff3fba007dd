// SPDX-License-Identifier: MPL-2.0

//! Backend layer for camera capture
//!
//! - [`camera`]: Camera discovery and frame capture via GStreamer
//!   (PipeWire, with a V4L2 fallback)

pub mod camera;
