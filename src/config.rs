// SPDX-License-Identifier: GPL-3.0-only

use crate::app::frame_processor::{CameraIntrinsics, DeviceOrientation};
use crate::constants::{detection, overlay, pipeline};
use cosmic::cosmic_config::{self, CosmicConfigEntry, cosmic_config_derive::CosmicConfigEntry};
use cosmic::{Theme, theme};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::error;

/// Application ID shared by the GUI, terminal and CLI front-ends
pub const APP_ID: &str = "io.github.quadcam.QuadCam";

/// Application theme preference
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum AppTheme {
    /// Follow system theme (dark or light based on system setting)
    #[default]
    System,
    /// Always use dark theme
    Dark,
    /// Always use light theme
    Light,
}

impl AppTheme {
    /// Get the COSMIC theme for this app theme preference
    pub fn theme(&self) -> Theme {
        match self {
            Self::Dark => {
                let mut theme = theme::system_dark();
                theme.theme_type.prefer_dark(Some(true));
                theme
            }
            Self::Light => {
                let mut theme = theme::system_light();
                theme.theme_type.prefer_dark(Some(false));
                theme
            }
            Self::System => theme::system_preference(),
        }
    }
}

#[derive(Debug, Clone, CosmicConfigEntry, PartialEq, Serialize, Deserialize)]
#[version = 1]
pub struct Config {
    /// Application theme preference (System, Dark, Light)
    pub app_theme: AppTheme,
    /// Last used camera device path
    pub last_camera_path: Option<String>,
    /// Mirror camera preview horizontally (selfie mode)
    pub mirror_preview: bool,
    /// Run rectangle detection on the live preview
    pub detection_enabled: bool,
    /// Smallest detected shape, as a fraction of the smaller frame dimension
    pub minimum_size: f32,
    /// Most rectangles reported per frame
    pub maximum_observations: usize,
    /// Number of overlay outlines drawn at most
    pub overlay_slots: usize,
    /// Force a device orientation instead of deriving it from the sensor
    pub orientation_override: Option<DeviceOrientation>,
    /// Lens intrinsics per camera (key = camera device path)
    pub intrinsics: HashMap<String, CameraIntrinsics>,
    /// Requested capture width
    pub preferred_width: u32,
    /// Requested capture height
    pub preferred_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_theme: AppTheme::default(),
            last_camera_path: None,
            mirror_preview: true, // Default to mirrored (selfie mode)
            detection_enabled: true,
            minimum_size: detection::MINIMUM_SIZE,
            maximum_observations: detection::MAXIMUM_OBSERVATIONS,
            overlay_slots: overlay::DEFAULT_SLOT_COUNT,
            orientation_override: None,
            intrinsics: HashMap::new(),
            preferred_width: pipeline::DEFAULT_WIDTH,
            preferred_height: pipeline::DEFAULT_HEIGHT,
        }
    }
}

impl Config {
    /// Load the stored configuration, falling back to defaults on any error
    ///
    /// Returns the handler (if the config store is reachable) so callers can
    /// write changes back.
    pub fn load() -> (Option<cosmic_config::Config>, Self) {
        match cosmic_config::Config::new(APP_ID, Self::VERSION) {
            Ok(handler) => {
                let config = match Self::get_entry(&handler) {
                    Ok(config) => config,
                    Err((errors, config)) => {
                        error!(?errors, "Errors loading config");
                        config
                    }
                };
                (Some(handler), config)
            }
            Err(err) => {
                error!(%err, "Failed to create config handler");
                (None, Self::default())
            }
        }
    }

    /// Orientation to report for frames from `rotation`-mounted sensors
    pub fn orientation_for(
        &self,
        rotation: crate::backends::camera::types::SensorRotation,
    ) -> DeviceOrientation {
        self.orientation_override
            .unwrap_or_else(|| DeviceOrientation::from_sensor_rotation(rotation))
    }

    /// Lens intrinsics configured for a camera, if any
    pub fn intrinsics_for(&self, camera_path: &str) -> Option<CameraIntrinsics> {
        self.intrinsics.get(camera_path).copied()
    }

    /// Capture format requested from the pipeline
    pub fn capture_format(&self) -> crate::backends::camera::types::CameraFormat {
        crate::backends::camera::types::CameraFormat {
            width: self.preferred_width,
            height: self.preferred_height,
            framerate: None,
        }
    }
}
