// SPDX-License-Identifier: MPL-2.0

//! Camera preview module
//!
//! This module handles the camera preview display widget. The preview is
//! an RGBA image with the rectangle overlay layer stacked on top.

pub mod widget;
