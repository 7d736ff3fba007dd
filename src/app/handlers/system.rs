// SPDX-License-Identifier: GPL-3.0-only

//! Settings handlers
//!
//! Handles theme, preview mirroring and external configuration changes.

use crate::app::state::{AppModel, Message};
use crate::config::{AppTheme, Config};
use cosmic::Task;
use tracing::info;

impl AppModel {
    pub(crate) fn handle_update_config(&mut self, config: Config) -> Task<cosmic::Action<Message>> {
        info!("UpdateConfig received");
        let theme_changed = config.app_theme != self.config.app_theme;
        let orientation_changed = config.orientation_override != self.config.orientation_override;

        self.config = config;
        self.apply_detection_config();
        if !self.config.detection_enabled || orientation_changed {
            self.clear_detections();
        } else {
            self.refresh_overlay_layer();
        }

        if theme_changed {
            return cosmic::command::set_theme(self.config.app_theme.theme());
        }
        Task::none()
    }

    pub(crate) fn handle_set_app_theme(&mut self, index: usize) -> Task<cosmic::Action<Message>> {
        let app_theme = match index {
            0 => AppTheme::System,
            1 => AppTheme::Dark,
            2 => AppTheme::Light,
            _ => return Task::none(),
        };

        info!(?app_theme, "Setting application theme");
        self.config.app_theme = app_theme;
        self.save_config("app theme");

        cosmic::command::set_theme(app_theme.theme())
    }

    pub(crate) fn handle_toggle_mirror_preview(&mut self) -> Task<cosmic::Action<Message>> {
        self.config.mirror_preview = !self.config.mirror_preview;
        info!(enabled = self.config.mirror_preview, "Mirror preview toggled");
        self.save_config("mirror preview");

        // Outlines follow the preview; the next frame redraws the preview itself
        self.refresh_overlay_layer();
        Task::none()
    }
}
