// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing tasks
//!
//! Detector implementations behind the [`RectangleDetector`] seam.

pub mod rect_detector;

pub use rect_detector::{ContourRectDetector, RectangleDetector};
