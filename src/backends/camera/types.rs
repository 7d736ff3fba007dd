// SPDX-License-Identifier: GPL-3.0-only
// Shared types for the capture backend

//! Shared types for camera capture

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Where a camera device was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CameraSource {
    /// PipeWire node (path is `pipewire-serial-N`, `pipewire-N`, or empty for default)
    #[default]
    PipeWire,
    /// Raw V4L2 device node (path is `/dev/videoN`)
    V4l2,
}

impl std::fmt::Display for CameraSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraSource::PipeWire => write!(f, "PipeWire"),
            CameraSource::V4l2 => write!(f, "V4L2"),
        }
    }
}

/// Sensor rotation in degrees (clockwise)
///
/// Camera sensors may be physically mounted at various angles relative to the device.
/// This is common on mobile devices where sensors are rotated 90° or 270° relative
/// to the display orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorRotation {
    /// No rotation (sensor is oriented correctly)
    #[default]
    None,
    /// 90 degrees clockwise
    Rotate90,
    /// 180 degrees (upside down)
    Rotate180,
    /// 270 degrees clockwise (90 degrees counter-clockwise)
    Rotate270,
}

impl SensorRotation {
    /// Create rotation from an integer degree value (normalised to 0-360).
    pub fn from_degrees_int(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            90 => SensorRotation::Rotate90,
            180 => SensorRotation::Rotate180,
            270 => SensorRotation::Rotate270,
            _ => SensorRotation::None,
        }
    }

    /// Parse rotation from a string value (degrees)
    pub fn from_degrees(degrees: &str) -> Self {
        degrees
            .trim()
            .parse::<i32>()
            .map(Self::from_degrees_int)
            .unwrap_or_default()
    }

    /// Get the rotation in degrees
    pub fn degrees(&self) -> u32 {
        match self {
            SensorRotation::None => 0,
            SensorRotation::Rotate90 => 90,
            SensorRotation::Rotate180 => 180,
            SensorRotation::Rotate270 => 270,
        }
    }
}

impl std::fmt::Display for SensorRotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq)]
pub struct CameraDevice {
    pub name: String,
    /// Capture path; empty lets PipeWire pick its default camera
    pub path: String,
    pub source: CameraSource,
    /// Sensor rotation reported by libcamera through PipeWire
    pub rotation: SensorRotation,
}

impl CameraDevice {
    /// PipeWire's auto-selected camera
    pub fn pipewire_default() -> Self {
        Self {
            name: "Default Camera (PipeWire)".to_string(),
            path: String::new(),
            source: CameraSource::PipeWire,
            rotation: SensorRotation::None,
        }
    }
}

/// Requested capture format
///
/// The pipeline decodes and converts whatever the device produces into
/// RGBA at this size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraFormat {
    pub width: u32,
    pub height: u32,
    /// Frames per second; `None` lets the source negotiate
    pub framerate: Option<u32>,
}

impl std::fmt::Display for CameraFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(fps) = self.framerate {
            write!(f, "{}x{} @ {}fps", self.width, self.height, fps)
        } else {
            write!(f, "{}x{}", self.width, self.height)
        }
    }
}

/// A single RGBA frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// RGBA pixels, `stride` bytes per row
    pub data: Arc<[u8]>,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// Monotonic frame counter within one capture session
    pub sequence: u64,
    /// Timestamp when frame was captured (for latency diagnostics)
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Whether `data` holds every row the dimensions promise
    pub fn has_complete_buffer(&self) -> bool {
        if self.width == 0 || self.height == 0 || self.stride < self.width * 4 {
            return false;
        }
        let required = (self.height as usize - 1) * self.stride as usize + self.width as usize * 4;
        self.data.len() >= required
    }
}

/// Frame receiver type for preview streams
pub type FrameReceiver = futures::channel::mpsc::Receiver<CameraFrame>;

/// Frame sender type for preview streams
pub type FrameSender = futures::channel::mpsc::Sender<CameraFrame>;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone)]
pub enum BackendError {
    /// Backend is not available on this system
    NotAvailable(String),
    /// No camera device to open
    DeviceNotFound(String),
    /// Failed to build or start the capture pipeline
    InitializationFailed(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Camera not found: {}", msg),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<gstreamer::glib::Error> for BackendError {
    fn from(err: gstreamer::glib::Error) -> Self {
        BackendError::InitializationFailed(err.to_string())
    }
}

impl From<gstreamer::glib::BoolError> for BackendError {
    fn from(err: gstreamer::glib::BoolError) -> Self {
        BackendError::InitializationFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: u32, height: u32, stride: u32, len: usize) -> CameraFrame {
        CameraFrame {
            width,
            height,
            data: Arc::from(vec![0u8; len].as_slice()),
            stride,
            sequence: 0,
            captured_at: Instant::now(),
        }
    }

    #[test]
    fn test_sensor_rotation_parsing() {
        assert_eq!(SensorRotation::from_degrees("90"), SensorRotation::Rotate90);
        assert_eq!(SensorRotation::from_degrees(" 270 "), SensorRotation::Rotate270);
        assert_eq!(SensorRotation::from_degrees("-90"), SensorRotation::Rotate270);
        assert_eq!(SensorRotation::from_degrees("garbage"), SensorRotation::None);
    }

    #[test]
    fn test_complete_buffer_accounts_for_stride() {
        // Last row does not need its padding
        assert!(frame(2, 2, 10, 18).has_complete_buffer());
        assert!(!frame(2, 2, 10, 17).has_complete_buffer());
    }

    #[test]
    fn test_incomplete_buffer_rejected() {
        assert!(!frame(0, 2, 8, 16).has_complete_buffer());
        assert!(!frame(4, 2, 8, 64).has_complete_buffer()); // stride shorter than a row
    }
}
