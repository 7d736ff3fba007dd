// SPDX-License-Identifier: MPL-2.0

//! Settings drawer view

use crate::app::frame_processor::DeviceOrientation;
use crate::app::state::{AppModel, ContextPage, Message};
use crate::config::AppTheme;
use crate::constants::{app_info, detection};
use crate::fl;
use cosmic::Element;
use cosmic::app::context_drawer;
use cosmic::iced::{Alignment, Length};
use cosmic::widget;

impl AppModel {
    /// Create the settings view for the context drawer
    pub fn settings_view(&self) -> context_drawer::ContextDrawer<'_, Message> {
        let spacing = cosmic::theme::spacing();

        let camera_dropdown = widget::dropdown(
            &self.camera_dropdown_options,
            Some(self.current_camera_index),
            Message::SelectCamera,
        );

        let orientation_index = self
            .config
            .orientation_override
            .and_then(|o| DeviceOrientation::ALL.iter().position(|x| *x == o))
            .map_or(0, |i| i + 1);
        let orientation_dropdown = widget::dropdown(
            &self.orientation_dropdown_options,
            Some(orientation_index),
            Message::SelectOrientation,
        );

        let theme_index = match self.config.app_theme {
            AppTheme::System => 0,
            AppTheme::Dark => 1,
            AppTheme::Light => 2,
        };
        let theme_dropdown = widget::dropdown(
            &self.theme_dropdown_options,
            Some(theme_index),
            Message::SelectAppTheme,
        );

        let mirror_toggle =
            widget::toggler(self.config.mirror_preview).on_toggle(|_| Message::ToggleMirrorPreview);
        let detection_toggle = widget::toggler(self.config.detection_enabled)
            .on_toggle(|_| Message::ToggleDetection);

        let minimum_size_slider = widget::slider(
            0.0..=detection::MINIMUM_SIZE_LIMIT,
            self.config.minimum_size,
            Message::SetMinimumSize,
        )
        .step(0.01);

        let max_observations = self
            .config
            .maximum_observations
            .min(detection::MAXIMUM_OBSERVATIONS_LIMIT as usize) as u16;
        let max_observations_slider = widget::slider(
            1..=detection::MAXIMUM_OBSERVATIONS_LIMIT,
            max_observations,
            |value: u16| Message::SetMaximumObservations(value as usize),
        );

        let settings_column: Element<'_, Message> = widget::column()
            .push(heading(fl!("camera")))
            .push(widget::vertical_space().height(spacing.space_xxs))
            .push(camera_dropdown)
            .push(widget::vertical_space().height(spacing.space_s))
            .push(toggle_row(fl!("mirror-preview"), mirror_toggle))
            .push(widget::vertical_space().height(spacing.space_l))
            .push(widget::divider::horizontal::default())
            .push(widget::vertical_space().height(spacing.space_s))
            .push(toggle_row(fl!("detect-rectangles"), detection_toggle))
            .push(widget::vertical_space().height(spacing.space_s))
            .push(value_row(
                fl!("minimum-size"),
                format!("{:.0}%", self.config.minimum_size * 100.0),
            ))
            .push(minimum_size_slider)
            .push(widget::vertical_space().height(spacing.space_s))
            .push(value_row(
                fl!("maximum-rectangles"),
                self.config.maximum_observations.to_string(),
            ))
            .push(max_observations_slider)
            .push(widget::vertical_space().height(spacing.space_s))
            .push(heading(fl!("orientation")))
            .push(widget::vertical_space().height(spacing.space_xxs))
            .push(orientation_dropdown)
            .push(widget::vertical_space().height(spacing.space_l))
            .push(widget::divider::horizontal::default())
            .push(widget::vertical_space().height(spacing.space_s))
            .push(heading(fl!("appearance")))
            .push(widget::vertical_space().height(spacing.space_xxs))
            .push(theme_dropdown)
            .push(widget::vertical_space().height(spacing.space_l))
            .push(widget::divider::horizontal::default())
            .push(widget::vertical_space().height(spacing.space_s))
            .push(
                widget::text(fl!("version", version = app_info::version()))
                    .size(12)
                    .class(cosmic::theme::Text::Accent),
            )
            .spacing(0)
            .into();

        context_drawer::context_drawer(
            settings_column,
            Message::ToggleContextPage(ContextPage::Settings),
        )
        .title(fl!("settings"))
    }
}

fn heading<'a>(label: String) -> Element<'a, Message> {
    widget::text(label).size(16).font(cosmic::font::bold()).into()
}

fn toggle_row<'a>(label: String, toggle: impl Into<Element<'a, Message>>) -> Element<'a, Message> {
    widget::row()
        .push(heading(label))
        .push(widget::horizontal_space().width(Length::Fill))
        .push(toggle)
        .align_y(Alignment::Center)
        .into()
}

fn value_row<'a>(label: String, value: String) -> Element<'a, Message> {
    widget::row()
        .push(widget::text(label).size(14))
        .push(widget::horizontal_space().width(Length::Fill))
        .push(widget::text(value).size(14))
        .align_y(Alignment::Center)
        .into()
}
