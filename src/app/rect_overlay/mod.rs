// SPDX-License-Identifier: MPL-2.0

//! Rectangle overlay module
//!
//! Renders detected quadrilaterals as yellow outlines over the camera
//! preview.
//!
//! # Coordinate System
//!
//! Detections use normalized coordinates (0.0 to 1.0) relative to the
//! oriented camera frame with the origin at the **bottom-left**. Drawing
//! surfaces (widgets, terminal cells, image buffers) use a top-left origin.
//! [`map_point`] converts between the two; the target rectangle is the
//! visible video content area (see [`calculate_video_bounds`]).

pub mod pool;
pub mod raster;

pub use pool::OverlayPool;

use crate::app::frame_processor::{NormalizedPoint, Quadrilateral};
use crate::app::state::Message;
use cosmic::Element;
use cosmic::iced::{ContentFit, Length};
use cosmic::widget;

/// A point in a top-left origin drawing space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewPoint {
    pub x: f32,
    pub y: f32,
}

impl ViewPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Destination rectangle in a top-left origin drawing space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a whole `width` x `height` surface
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f32, height as f32)
    }

    pub fn min_x(&self) -> f32 {
        self.x
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    pub fn min_y(&self) -> f32 {
        self.y
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, point: ViewPoint) -> bool {
        point.x >= self.min_x()
            && point.x <= self.max_x()
            && point.y >= self.min_y()
            && point.y <= self.max_y()
    }
}

/// How video content is scaled within its container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoContentFit {
    /// Scale to fit within bounds, maintaining aspect ratio (letterboxing)
    #[default]
    Contain,
    /// Fill the entire container
    Cover,
}

impl From<VideoContentFit> for ContentFit {
    fn from(fit: VideoContentFit) -> Self {
        match fit {
            VideoContentFit::Contain => ContentFit::Contain,
            VideoContentFit::Cover => ContentFit::Cover,
        }
    }
}

/// Map a normalized bottom-left origin point into `target`
///
/// The vertical axis is inverted: `y = 0` lands on the bottom edge of the
/// target and `y = 1` on its top edge.
pub fn map_point(point: NormalizedPoint, target: ViewRect) -> ViewPoint {
    ViewPoint {
        x: target.min_x() + target.width * point.x,
        y: target.max_y() - target.height * point.y,
    }
}

/// Reflect a point across the vertical centre line of `target`
pub fn mirror_horizontal(point: ViewPoint, target: ViewRect) -> ViewPoint {
    ViewPoint {
        x: target.min_x() + target.max_x() - point.x,
        y: point.y,
    }
}

impl Quadrilateral {
    /// Corners mapped into `target`, in TL, TR, BR, BL order
    pub fn map_to(&self, target: ViewRect) -> [ViewPoint; 4] {
        self.corners().map(|corner| map_point(corner, target))
    }
}

/// Calculate the video content bounds within a container
///
/// Returns the area the frame actually occupies, accounting for
/// letterboxing. With [`VideoContentFit::Cover`] the content fills the
/// container.
pub fn calculate_video_bounds(
    container_width: f32,
    container_height: f32,
    frame_width: u32,
    frame_height: u32,
    content_fit: VideoContentFit,
) -> ViewRect {
    if frame_width == 0 || frame_height == 0 || container_height <= 0.0 {
        return ViewRect::new(0.0, 0.0, container_width, container_height);
    }

    let frame_aspect = frame_width as f32 / frame_height as f32;
    let container_aspect = container_width / container_height;

    match content_fit {
        VideoContentFit::Contain => {
            let (video_width, video_height) = if frame_aspect > container_aspect {
                // Frame is wider - fit to width
                (container_width, container_width / frame_aspect)
            } else {
                // Frame is taller - fit to height
                (container_height * frame_aspect, container_height)
            };

            ViewRect::new(
                (container_width - video_width) / 2.0,
                (container_height - video_height) / 2.0,
                video_width,
                video_height,
            )
        }
        VideoContentFit::Cover => ViewRect::new(0.0, 0.0, container_width, container_height),
    }
}

/// Build the overlay layer for the preview
///
/// The layer is a transparent image the size of the oriented frame, scaled
/// with the same content fit as the preview so outlines stay aligned.
pub fn build_rect_overlay<'a>(
    overlay: Option<&widget::image::Handle>,
    content_fit: VideoContentFit,
) -> Element<'a, Message> {
    match overlay {
        Some(handle) => widget::image::Image::new(handle.clone())
            .content_fit(content_fit.into())
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
        None => widget::Space::new(Length::Fill, Length::Fill).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_point_inverts_vertical_axis() {
        let target = ViewRect::new(10.0, 20.0, 200.0, 100.0);

        assert_eq!(
            map_point(NormalizedPoint::new(0.0, 0.0), target),
            ViewPoint::new(10.0, 120.0)
        );
        assert_eq!(
            map_point(NormalizedPoint::new(1.0, 1.0), target),
            ViewPoint::new(210.0, 20.0)
        );
        assert_eq!(
            map_point(NormalizedPoint::new(0.5, 0.25), target),
            ViewPoint::new(110.0, 95.0)
        );
    }

    #[test]
    fn test_map_to_preserves_corner_order() {
        let quad = Quadrilateral::new(
            NormalizedPoint::new(0.0, 1.0),
            NormalizedPoint::new(1.0, 1.0),
            NormalizedPoint::new(1.0, 0.0),
            NormalizedPoint::new(0.0, 0.0),
        );
        let mapped = quad.map_to(ViewRect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(
            mapped,
            [
                ViewPoint::new(0.0, 0.0),
                ViewPoint::new(100.0, 0.0),
                ViewPoint::new(100.0, 50.0),
                ViewPoint::new(0.0, 50.0),
            ]
        );
    }

    #[test]
    fn test_mirror_horizontal() {
        let target = ViewRect::new(10.0, 0.0, 100.0, 50.0);
        assert_eq!(
            mirror_horizontal(ViewPoint::new(30.0, 5.0), target),
            ViewPoint::new(90.0, 5.0)
        );
        // Mirroring twice is the identity
        let p = ViewPoint::new(42.0, 7.0);
        assert_eq!(mirror_horizontal(mirror_horizontal(p, target), target), p);
    }

    #[test]
    fn test_video_bounds_letterbox_wide_frame() {
        // 16:9 frame in a square container: bars top and bottom
        let bounds = calculate_video_bounds(160.0, 160.0, 1600, 900, VideoContentFit::Contain);
        assert_eq!(bounds, ViewRect::new(0.0, 35.0, 160.0, 90.0));
    }

    #[test]
    fn test_video_bounds_pillarbox_tall_frame() {
        let bounds = calculate_video_bounds(200.0, 100.0, 100, 100, VideoContentFit::Contain);
        assert_eq!(bounds, ViewRect::new(50.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn test_video_bounds_cover_fills_container() {
        let bounds = calculate_video_bounds(200.0, 100.0, 100, 100, VideoContentFit::Cover);
        assert_eq!(bounds, ViewRect::new(0.0, 0.0, 200.0, 100.0));
    }
}
