// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! This module handles all application messages by routing them to focused handler methods.
//! The main `update()` function acts as a dispatcher, while specific handlers are implemented
//! in the `handlers` submodules organized by functional domain.
//!
//! # Handler Modules
//!
//! - `handlers::ui`: UI navigation and context pages
//! - `handlers::camera`: Camera selection and frame handling
//! - `handlers::detection`: Detection results, overlay and tuning
//! - `handlers::system`: Theme, mirroring and configuration updates

use crate::app::state::{AppModel, Message};
use cosmic::Task;

impl AppModel {
    /// Main message handler - routes messages to appropriate handler methods.
    pub fn update(&mut self, message: Message) -> Task<cosmic::Action<Message>> {
        match message {
            // ===== UI Navigation =====
            Message::LaunchUrl(url) => self.handle_launch_url(url),
            Message::ToggleContextPage(page) => self.handle_toggle_context_page(page),

            // ===== Camera Control =====
            Message::SelectCamera(index) => self.handle_select_camera(index),
            Message::SwitchCamera => self.handle_switch_camera(),
            Message::CamerasInitialized(cameras, index) => {
                self.handle_cameras_initialized(cameras, index)
            }
            Message::CameraFrame(frame) => self.handle_camera_frame(frame),

            // ===== Detection =====
            Message::RectanglesDetected(result) => self.handle_rectangles_detected(result),
            Message::ToggleDetection => self.handle_toggle_detection(),
            Message::SetMinimumSize(value) => self.handle_set_minimum_size(value),
            Message::SetMaximumObservations(value) => self.handle_set_maximum_observations(value),
            Message::SelectOrientation(index) => self.handle_select_orientation(index),

            // ===== Settings =====
            Message::ToggleMirrorPreview => self.handle_toggle_mirror_preview(),
            Message::SelectAppTheme(index) => self.handle_set_app_theme(index),
            Message::UpdateConfig(config) => self.handle_update_config(config),
        }
    }
}
