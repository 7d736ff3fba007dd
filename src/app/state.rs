// SPDX-License-Identifier: GPL-3.0-only

//! Application state types
//!
//! - `AppModel`: the live application state
//! - `ContextPage`: which drawer page is shown
//! - `Message`: every UI interaction and background event

use crate::app::frame_processor::{
    DetectionConfig, DeviceOrientation, FrameDispatcher, Quadrilateral,
};
use crate::app::rect_overlay::OverlayPool;
use crate::backends::camera::types::{CameraDevice, CameraFrame};
use crate::config::Config;
use cosmic::cosmic_config;
use cosmic::widget::about::About;
use cosmic::widget::image::Handle;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// The application model stores app-specific state used to describe its interface and
/// drive its logic.
pub struct AppModel {
    /// Application state which is managed by the COSMIC runtime.
    pub core: cosmic::Core,
    /// Display a context drawer with the designated page if defined.
    pub context_page: ContextPage,
    /// The about page for this app.
    pub about: About,
    /// Configuration data that persists between application runs.
    pub config: Config,
    /// Configuration handler for saving settings
    pub config_handler: Option<cosmic_config::Config>,

    /// Cameras found at startup
    pub available_cameras: Vec<CameraDevice>,
    /// Index into `available_cameras`
    pub current_camera_index: usize,
    /// Display names for the camera dropdown
    pub camera_dropdown_options: Vec<String>,
    /// Set to stop the running camera subscription loop
    pub camera_cancel_flag: Arc<AtomicBool>,

    /// Latest frame received from the capture session
    pub current_frame: Option<Arc<CameraFrame>>,
    /// Upright (and possibly mirrored) preview image for `current_frame`
    pub preview: Option<PreviewImage>,

    /// Runs detection off the UI thread, one frame at a time
    pub dispatcher: FrameDispatcher,
    /// Outline slots shown over the preview
    pub overlay: OverlayPool,
    /// Rendered overlay layer, same size as `preview`
    pub overlay_layer: Option<Handle>,
    /// Rectangles found in the last completed detection
    pub detected_count: usize,

    /// Labels for the orientation dropdown ("Automatic" first)
    pub orientation_dropdown_options: Vec<String>,
    /// Labels for the theme dropdown
    pub theme_dropdown_options: Vec<String>,
}

/// Preview image ready for display
#[derive(Debug, Clone)]
pub struct PreviewImage {
    pub handle: Handle,
    pub width: u32,
    pub height: u32,
}

impl AppModel {
    /// Camera currently selected, if cameras are initialized
    pub fn current_camera(&self) -> Option<&CameraDevice> {
        self.available_cameras.get(self.current_camera_index)
    }

    /// Orientation applied to frames from the current camera
    pub fn current_orientation(&self) -> DeviceOrientation {
        let rotation = self
            .current_camera()
            .map(|camera| camera.rotation)
            .unwrap_or_default();
        self.config.orientation_for(rotation)
    }

    /// Push configuration changes into the detection and overlay state
    pub fn apply_detection_config(&mut self) {
        self.dispatcher
            .set_config(DetectionConfig::from_config(&self.config));
        if self.overlay.capacity() != self.config.overlay_slots {
            self.overlay.resize(self.config.overlay_slots);
        }
    }
}

/// The context page to display in the context drawer.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ContextPage {
    #[default]
    About,
    Settings,
}

/// Messages emitted by the application and its widgets.
#[derive(Debug, Clone)]
pub enum Message {
    // ===== UI Navigation =====
    /// Open an external URL
    LaunchUrl(String),
    /// Show or hide a context drawer page
    ToggleContextPage(ContextPage),

    // ===== Camera Control =====
    /// Select camera by index
    SelectCamera(usize),
    /// Cycle to the next camera
    SwitchCamera,
    /// Camera enumeration finished (cameras, selected index)
    CamerasInitialized(Vec<CameraDevice>, usize),
    /// New frame from the capture session
    CameraFrame(Arc<CameraFrame>),

    // ===== Detection =====
    /// Detection finished; `None` means the frame was skipped or failed
    RectanglesDetected(Option<Vec<Quadrilateral>>),
    /// Turn live detection on or off
    ToggleDetection,
    /// Smallest accepted rectangle, fraction of the short frame side
    SetMinimumSize(f32),
    /// Most rectangles reported per frame
    SetMaximumObservations(usize),
    /// Orientation dropdown selection (0 = automatic)
    SelectOrientation(usize),

    // ===== Settings =====
    /// Toggle horizontal mirroring of the preview
    ToggleMirrorPreview,
    /// Theme dropdown selection
    SelectAppTheme(usize),
    /// Configuration changed on disk
    UpdateConfig(Config),
}
