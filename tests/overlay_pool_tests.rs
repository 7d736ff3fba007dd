// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the overlay slot pool and its rendering

use image::Rgba;
use quadcam::app::rect_overlay::raster::{render_layer, stroke_color};
use quadcam::app::rect_overlay::{OverlayPool, ViewRect};
use quadcam::{NormalizedPoint, Quadrilateral};

fn quad(left: f32, bottom: f32, size: f32) -> Quadrilateral {
    Quadrilateral::new(
        NormalizedPoint::new(left, bottom + size),
        NormalizedPoint::new(left + size, bottom + size),
        NormalizedPoint::new(left + size, bottom),
        NormalizedPoint::new(left, bottom),
    )
}

#[test]
fn test_no_detections_clears_every_slot() {
    let mut pool = OverlayPool::new(4);
    pool.assign(&[quad(0.1, 0.1, 0.2), quad(0.5, 0.5, 0.2)]);
    assert_eq!(pool.active_count(), 2);

    let shown = pool.assign(&[]);
    assert_eq!(shown, 0);
    assert!(pool.is_empty());
    assert!(pool.slots().iter().all(Option::is_none));
}

#[test]
fn test_excess_detections_are_dropped() {
    let mut pool = OverlayPool::new(2);
    let quads = [quad(0.1, 0.1, 0.1), quad(0.3, 0.3, 0.1), quad(0.6, 0.6, 0.1)];

    let shown = pool.assign(&quads);
    assert_eq!(shown, 2);
    assert_eq!(pool.slots(), &[Some(quads[0]), Some(quads[1])]);
}

#[test]
fn test_fewer_detections_clear_trailing_slots() {
    let mut pool = OverlayPool::new(3);
    pool.assign(&[quad(0.1, 0.1, 0.1), quad(0.3, 0.3, 0.1), quad(0.6, 0.6, 0.1)]);
    pool.assign(&[quad(0.2, 0.2, 0.1)]);

    assert_eq!(pool.active_count(), 1);
    assert!(pool.slots()[1].is_none());
    assert!(pool.slots()[2].is_none());
}

#[test]
fn test_layout_only_includes_active_slots() {
    let mut pool = OverlayPool::new(5);
    pool.assign(&[quad(0.25, 0.25, 0.5)]);

    let paths = pool.layout(ViewRect::from_size(200, 100), false);
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0][0].x, 50.0);
    assert_eq!(paths[0][0].y, 25.0);

    let mirrored = pool.layout(ViewRect::from_size(200, 100), true);
    assert_eq!(mirrored[0][0].x, 150.0);
}

#[test]
fn test_rendered_layer_is_transparent_outside_outlines() {
    let mut pool = OverlayPool::new(2);
    pool.assign(&[quad(0.25, 0.25, 0.5)]);

    let layer = render_layer(&pool, 100, 100, false);
    assert_eq!(layer.dimensions(), (100, 100));
    assert_eq!(*layer.get_pixel(5, 5), Rgba([0, 0, 0, 0]));
    assert_eq!(*layer.get_pixel(25, 50), stroke_color());
}

#[test]
fn test_empty_pool_renders_blank_layer() {
    let layer = render_layer(&OverlayPool::default(), 32, 16, true);
    assert!(layer.pixels().all(|p| p.0[3] == 0));
}
