// SPDX-License-Identifier: GPL-3.0-only

//! Rectangle detection handlers
//!
//! Handles detection results, the detection toggle and detection tuning.

use crate::app::frame_processor::{DeviceOrientation, Quadrilateral};
use crate::app::rect_overlay::OverlayPool;
use crate::app::rect_overlay::raster::render_layer;
use crate::app::state::{AppModel, Message};
use cosmic::Task;
use cosmic::cosmic_config::CosmicConfigEntry;
use cosmic::widget::image::Handle;
use image::RgbaImage;
use tracing::{debug, error, info};

impl AppModel {
    pub(crate) fn handle_rectangles_detected(
        &mut self,
        result: Option<Vec<Quadrilateral>>,
    ) -> Task<cosmic::Action<Message>> {
        let Some(found) =
            apply_detection_result(&mut self.overlay, self.config.detection_enabled, result)
        else {
            return Task::none();
        };

        if found != self.detected_count {
            debug!(found, shown = self.overlay.active_count(), "Rectangle count changed");
        }
        self.detected_count = found;
        self.refresh_overlay_layer();

        Task::none()
    }

    /// Re-render the overlay layer at the current preview size
    pub(crate) fn refresh_overlay_layer(&mut self) {
        let preview_size = self
            .preview
            .as_ref()
            .map(|preview| (preview.width, preview.height));

        self.overlay_layer =
            overlay_layer_image(&self.overlay, preview_size, self.config.mirror_preview).map(
                |layer| {
                    let (width, height) = layer.dimensions();
                    Handle::from_rgba(width, height, layer.into_raw())
                },
            );
    }

    /// Hide all outlines
    pub(crate) fn clear_detections(&mut self) {
        self.overlay.clear();
        self.overlay_layer = None;
        self.detected_count = 0;
    }

    pub(crate) fn handle_toggle_detection(&mut self) -> Task<cosmic::Action<Message>> {
        self.config.detection_enabled = !self.config.detection_enabled;
        info!(
            enabled = self.config.detection_enabled,
            "Rectangle detection toggled"
        );

        if !self.config.detection_enabled {
            self.clear_detections();
        }

        self.save_config("detection toggle");
        Task::none()
    }

    pub(crate) fn handle_set_minimum_size(&mut self, value: f32) -> Task<cosmic::Action<Message>> {
        let value = value.clamp(0.0, 1.0);
        if (self.config.minimum_size - value).abs() < f32::EPSILON {
            return Task::none();
        }
        debug!(minimum_size = value, "Setting minimum rectangle size");
        self.config.minimum_size = value;
        self.apply_detection_config();
        self.save_config("minimum size");
        Task::none()
    }

    pub(crate) fn handle_set_maximum_observations(
        &mut self,
        value: usize,
    ) -> Task<cosmic::Action<Message>> {
        let value = value.max(1);
        if self.config.maximum_observations == value {
            return Task::none();
        }
        debug!(maximum_observations = value, "Setting maximum observations");
        self.config.maximum_observations = value;
        self.apply_detection_config();
        self.save_config("maximum observations");
        Task::none()
    }

    pub(crate) fn handle_select_orientation(
        &mut self,
        index: usize,
    ) -> Task<cosmic::Action<Message>> {
        let orientation = match index {
            0 => None,
            i => match DeviceOrientation::ALL.get(i - 1) {
                Some(orientation) => Some(*orientation),
                None => return Task::none(),
            },
        };

        info!(?orientation, "Setting orientation override");
        self.config.orientation_override = orientation;
        self.clear_detections();
        self.save_config("orientation override");
        Task::none()
    }

    /// Persist the configuration, logging failures
    pub(crate) fn save_config(&self, what: &str) {
        if let Some(handler) = self.config_handler.as_ref()
            && let Err(err) = self.config.write_entry(handler)
        {
            error!(?err, setting = what, "Failed to save setting");
        }
    }
}

/// Fold a detection result into the overlay pool
///
/// Returns how many rectangles were found, or `None` when the pool was left
/// untouched.
fn apply_detection_result(
    pool: &mut OverlayPool,
    detection_enabled: bool,
    result: Option<Vec<Quadrilateral>>,
) -> Option<usize> {
    // Skipped or failed frames keep the previous outlines
    let quads = result?;

    // A result may land after detection was switched off
    if !detection_enabled {
        return None;
    }

    pool.assign(&quads);
    Some(quads.len())
}

/// Outline layer for a preview of `preview_size`; `None` when nothing is drawn
fn overlay_layer_image(
    pool: &OverlayPool,
    preview_size: Option<(u32, u32)>,
    mirrored: bool,
) -> Option<RgbaImage> {
    let (width, height) = preview_size?;
    if pool.is_empty() {
        return None;
    }
    Some(render_layer(pool, width, height, mirrored))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::frame_processor::NormalizedPoint;

    fn quad() -> Quadrilateral {
        Quadrilateral::new(
            NormalizedPoint::new(0.2, 0.8),
            NormalizedPoint::new(0.8, 0.8),
            NormalizedPoint::new(0.8, 0.2),
            NormalizedPoint::new(0.2, 0.2),
        )
    }

    #[test]
    fn test_missing_result_keeps_previous_outlines() {
        let mut pool = OverlayPool::new(4);
        pool.assign(&[quad()]);

        assert_eq!(apply_detection_result(&mut pool, true, None), None);
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn test_empty_result_clears_the_layer() {
        let mut pool = OverlayPool::new(4);
        pool.assign(&[quad()]);

        assert_eq!(apply_detection_result(&mut pool, true, Some(Vec::new())), Some(0));
        assert!(pool.is_empty());
        assert!(overlay_layer_image(&pool, Some((100, 100)), false).is_none());
    }

    #[test]
    fn test_late_result_ignored_when_detection_disabled() {
        let mut pool = OverlayPool::new(4);

        assert_eq!(apply_detection_result(&mut pool, false, Some(vec![quad()])), None);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_layer_matches_preview_size() {
        let mut pool = OverlayPool::new(4);
        assert_eq!(apply_detection_result(&mut pool, true, Some(vec![quad(), quad()])), Some(2));

        let layer = overlay_layer_image(&pool, Some((120, 90)), true).expect("layer");
        assert_eq!(layer.dimensions(), (120, 90));
        assert_eq!(layer.get_pixel(2, 2)[3], 0);
    }

    #[test]
    fn test_no_layer_without_preview() {
        let mut pool = OverlayPool::new(4);
        pool.assign(&[quad()]);
        assert!(overlay_layer_image(&pool, None, false).is_none());
    }
}
