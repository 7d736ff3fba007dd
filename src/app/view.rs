// SPDX-License-Identifier: GPL-3.0-only

//! Main application view
//!
//! The camera preview (with the rectangle overlay) fills the window; a
//! slim status bar below it shows the active camera and detection count.

use crate::app::state::{AppModel, Message};
use crate::fl;
use cosmic::Element;
use cosmic::iced::{Alignment, Length};
use cosmic::widget;

impl AppModel {
    /// Build the main application view
    pub fn view(&self) -> Element<'_, Message> {
        let spacing = cosmic::theme::spacing();

        let camera_preview = self.build_camera_preview();

        let status = if !self.config.detection_enabled {
            fl!("detection-off")
        } else {
            fl!("rectangles-found", count = self.detected_count)
        };

        let camera_name = self
            .current_camera()
            .map(|camera| camera.name.clone())
            .unwrap_or_default();

        let mut status_bar = widget::row()
            .push(widget::text(camera_name).size(14))
            .push(widget::horizontal_space().width(Length::Fill))
            .push(widget::text(status).size(14))
            .spacing(spacing.space_s)
            .padding([spacing.space_xxs, spacing.space_s])
            .align_y(Alignment::Center);

        if self.available_cameras.len() > 1 {
            status_bar = status_bar.push(
                widget::button::icon(widget::icon::from_name("camera-switch-symbolic"))
                    .on_press(Message::SwitchCamera),
            );
        }

        widget::column()
            .push(
                widget::container(camera_preview)
                    .width(Length::Fill)
                    .height(Length::Fill),
            )
            .push(status_bar)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}
