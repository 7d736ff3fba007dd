// SPDX-License-Identifier: MPL-2.0

//! Core types for frame processing results
//!
//! Detections are expressed in the detector's observation space: coordinates
//! are normalized (0.0 to 1.0) relative to the oriented frame, with the origin
//! at the **bottom-left** corner. The overlay converts them into top-left
//! origin view coordinates at render time (see [`crate::app::rect_overlay`]).

use crate::backends::camera::types::SensorRotation;
use serde::{Deserialize, Serialize};

/// A point in normalized observation space (origin bottom-left, y up)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f32,
    pub y: f32,
}

impl NormalizedPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Convert a top-left origin pixel position into observation space
    pub fn from_pixel(px: f32, py: f32, width: u32, height: u32) -> Self {
        Self {
            x: px / width as f32,
            y: 1.0 - py / height as f32,
        }
    }
}

/// A detected rectangle-like shape
///
/// Corners are ordered top-left, top-right, bottom-right, bottom-left as seen
/// in the oriented frame. Quadrilaterals carry no identity across frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral {
    pub top_left: NormalizedPoint,
    pub top_right: NormalizedPoint,
    pub bottom_right: NormalizedPoint,
    pub bottom_left: NormalizedPoint,
}

impl Quadrilateral {
    pub fn new(
        top_left: NormalizedPoint,
        top_right: NormalizedPoint,
        bottom_right: NormalizedPoint,
        bottom_left: NormalizedPoint,
    ) -> Self {
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    /// Corners in path order (TL, TR, BR, BL)
    pub fn corners(&self) -> [NormalizedPoint; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Area in normalized units (shoelace formula)
    pub fn area(&self) -> f32 {
        let c = self.corners();
        let mut twice_area = 0.0;
        for i in 0..4 {
            let a = c[i];
            let b = c[(i + 1) % 4];
            twice_area += a.x * b.y - b.x * a.y;
        }
        (twice_area / 2.0).abs()
    }
}

/// Physical orientation of the device relative to the camera sensor
///
/// Used to tell the detector how to interpret the raw frame so that
/// "top-left" in a detection means top-left as the user sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeviceOrientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
    /// Face up, face down, or not reported
    Unknown,
}

impl DeviceOrientation {
    pub const ALL: [DeviceOrientation; 5] = [
        DeviceOrientation::Portrait,
        DeviceOrientation::PortraitUpsideDown,
        DeviceOrientation::LandscapeLeft,
        DeviceOrientation::LandscapeRight,
        DeviceOrientation::Unknown,
    ];

    /// EXIF orientation tag for frames captured in this orientation
    ///
    /// `0` means "not specified" and leaves the frame untouched.
    pub fn exif_orientation(&self) -> u8 {
        match self {
            Self::Portrait => 1,
            Self::PortraitUpsideDown => 3,
            Self::LandscapeLeft => 6,
            Self::LandscapeRight => 8,
            Self::Unknown => 0,
        }
    }

    /// Derive the orientation from the sensor mounting angle
    pub fn from_sensor_rotation(rotation: SensorRotation) -> Self {
        match rotation {
            SensorRotation::None => Self::Portrait,
            SensorRotation::Rotate90 => Self::LandscapeLeft,
            SensorRotation::Rotate180 => Self::PortraitUpsideDown,
            SensorRotation::Rotate270 => Self::LandscapeRight,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Portrait => "Portrait",
            Self::PortraitUpsideDown => "Portrait (upside down)",
            Self::LandscapeLeft => "Landscape left",
            Self::LandscapeRight => "Landscape right",
            Self::Unknown => "Unknown",
        }
    }
}

/// Pinhole lens intrinsics in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

impl CameraIntrinsics {
    /// Row-major 3x3 camera matrix
    pub fn matrix(&self) -> [[f32; 3]; 3] {
        [
            [self.fx, 0.0, self.cx],
            [0.0, self.fy, self.cy],
            [0.0, 0.0, 1.0],
        ]
    }
}

/// Per-frame information handed to the detector alongside the pixels
#[derive(Debug, Clone, PartialEq)]
pub struct FrameMetadata {
    pub width: u32,
    pub height: u32,
    pub orientation: DeviceOrientation,
    pub intrinsics: Option<CameraIntrinsics>,
}

impl FrameMetadata {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            orientation: DeviceOrientation::default(),
            intrinsics: None,
        }
    }

    pub fn with_orientation(mut self, orientation: DeviceOrientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_intrinsics(mut self, intrinsics: Option<CameraIntrinsics>) -> Self {
        self.intrinsics = intrinsics;
        self
    }
}

/// Tuning knobs for rectangle detection
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    /// Smallest accepted shape, as a fraction of the smaller frame dimension
    pub minimum_size: f32,
    /// Upper bound on returned observations (largest first)
    pub maximum_observations: usize,
    /// Smallest accepted short-side / long-side ratio
    pub minimum_aspect_ratio: f32,
    /// Largest accepted deviation of any corner angle from 90 degrees
    pub quadrature_tolerance_degrees: f32,
    /// Frames are downscaled so neither side exceeds this before detection
    pub max_dimension: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        use crate::constants::detection;

        Self {
            minimum_size: detection::MINIMUM_SIZE,
            maximum_observations: detection::MAXIMUM_OBSERVATIONS,
            minimum_aspect_ratio: detection::MINIMUM_ASPECT_RATIO,
            quadrature_tolerance_degrees: detection::QUADRATURE_TOLERANCE_DEGREES,
            max_dimension: detection::MAX_DIMENSION,
        }
    }
}

impl DetectionConfig {
    /// Build detection settings from the user configuration
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            minimum_size: config.minimum_size.clamp(0.0, 1.0),
            maximum_observations: config.maximum_observations,
            ..Self::default()
        }
    }
}
