// SPDX-License-Identifier: GPL-3.0-only

//! Camera preview widget implementation

use crate::app::rect_overlay::{VideoContentFit, build_rect_overlay};
use crate::app::state::{AppModel, Message};
use crate::fl;
use cosmic::Element;
use cosmic::iced::{Background, Color, Length};
use cosmic::widget;

impl AppModel {
    /// Build the camera preview widget
    ///
    /// Shows a loading indicator when cameras are initializing and a black
    /// placeholder until the first frame arrives. Outlines are stacked on
    /// top of the frame with the same content fit so they stay aligned.
    pub fn build_camera_preview(&self) -> Element<'_, Message> {
        if self.available_cameras.is_empty() {
            return centered_message(fl!("initializing-camera"));
        }

        let Some(preview) = &self.preview else {
            return widget::container(widget::Space::new(Length::Fill, Length::Fill))
                .width(Length::Fill)
                .height(Length::Fill)
                .style(|_theme| widget::container::Style {
                    background: Some(Background::Color(Color::BLACK)),
                    ..Default::default()
                })
                .into();
        };

        let content_fit = VideoContentFit::Contain;
        let frame = widget::image::Image::new(preview.handle.clone())
            .content_fit(content_fit.into())
            .width(Length::Fill)
            .height(Length::Fill);

        let mut layers = cosmic::iced::widget::stack![frame]
            .width(Length::Fill)
            .height(Length::Fill);
        if self.config.detection_enabled {
            layers = layers.push(build_rect_overlay(self.overlay_layer.as_ref(), content_fit));
        }

        widget::container(layers)
            .width(Length::Fill)
            .height(Length::Fill)
            .style(|_theme| widget::container::Style {
                background: Some(Background::Color(Color::BLACK)),
                ..Default::default()
            })
            .into()
    }
}

fn centered_message<'a>(text: String) -> Element<'a, Message> {
    widget::container(widget::text(text).size(20))
        .width(Length::Fill)
        .height(Length::Fill)
        .align_x(cosmic::iced::alignment::Horizontal::Center)
        .align_y(cosmic::iced::alignment::Vertical::Center)
        .style(|theme| widget::container::Style {
            background: Some(Background::Color(theme.cosmic().bg_color().into())),
            text_color: Some(theme.cosmic().on_bg_color().into()),
            ..Default::default()
        })
        .into()
}
