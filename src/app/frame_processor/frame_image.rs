// SPDX-License-Identifier: GPL-3.0-only

//! Conversions from camera frames to `image` buffers
//!
//! Camera rows may carry stride padding; everything downstream (detection,
//! preview handles, snapshots) wants tightly packed RGBA.

use super::types::DeviceOrientation;
use crate::backends::camera::types::CameraFrame;
use crate::errors::DetectionError;
use image::metadata::Orientation;
use image::{DynamicImage, RgbaImage};

/// Copy RGBA frame data without stride padding
pub fn copy_rgba_without_stride(frame: &CameraFrame) -> Vec<u8> {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let stride = frame.stride as usize;

    if stride == width * 4 && frame.data.len() >= width * height * 4 {
        return frame.data[..width * height * 4].to_vec();
    }

    let mut result = Vec::with_capacity(width * height * 4);

    for y in 0..height {
        let row_start = y * stride;
        let row_end = row_start + width * 4;
        if row_end <= frame.data.len() {
            result.extend_from_slice(&frame.data[row_start..row_end]);
        }
    }

    result
}

/// Packed RGBA image for a camera frame
pub fn frame_to_rgba_image(frame: &CameraFrame) -> Result<RgbaImage, DetectionError> {
    if !frame.has_complete_buffer() {
        return Err(DetectionError::InvalidFrame(format!(
            "{}x{} frame with stride {} has only {} bytes",
            frame.width,
            frame.height,
            frame.stride,
            frame.data.len()
        )));
    }

    RgbaImage::from_raw(frame.width, frame.height, copy_rgba_without_stride(frame)).ok_or_else(
        || DetectionError::Image("RGBA data does not match frame dimensions".to_string()),
    )
}

/// EXIF orientation for a device orientation, `None` when it needs no transform
pub fn exif_transform(orientation: DeviceOrientation) -> Option<Orientation> {
    Orientation::from_exif(orientation.exif_orientation())
        .filter(|o| *o != Orientation::NoTransforms)
}

/// Rotate/flip an image so it appears upright for the given orientation
pub fn apply_orientation(image: DynamicImage, orientation: DeviceOrientation) -> DynamicImage {
    match exif_transform(orientation) {
        Some(transform) => {
            let mut image = image;
            image.apply_orientation(transform);
            image
        }
        None => image,
    }
}
