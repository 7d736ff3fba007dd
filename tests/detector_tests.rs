// SPDX-License-Identifier: MPL-2.0

//! Integration tests for rectangle detection through the public API

use image::{Rgba, RgbaImage};
use quadcam::app::frame_processor::FrameDispatcher;
use quadcam::backends::camera::types::CameraFrame;
use quadcam::{
    ContourRectDetector, DetectionConfig, FrameMetadata, NormalizedPoint, RectangleDetector,
};
use std::sync::Arc;
use std::time::Instant;

/// Dark canvas with light filled rectangles given as (x0, y0, x1, y1), end exclusive
fn canvas(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let inside = rects
            .iter()
            .any(|&(x0, y0, x1, y1)| x >= x0 && x < x1 && y >= y0 && y < y1);
        if inside {
            Rgba([240, 240, 240, 255])
        } else {
            Rgba([20, 20, 20, 255])
        }
    })
}

/// Camera frame holding `image` with `padding` extra bytes per row
fn padded_frame(image: &RgbaImage, padding: u32) -> CameraFrame {
    let stride = image.width() * 4 + padding;
    let mut data = Vec::with_capacity((stride * image.height()) as usize);
    for row in image.rows() {
        for pixel in row {
            data.extend_from_slice(&pixel.0);
        }
        data.extend(std::iter::repeat_n(0u8, padding as usize));
    }

    CameraFrame {
        width: image.width(),
        height: image.height(),
        data: Arc::from(data.as_slice()),
        stride,
        sequence: 0,
        captured_at: Instant::now(),
    }
}

fn near(actual: NormalizedPoint, expected: NormalizedPoint) -> bool {
    (actual.x - expected.x).abs() < 0.02 && (actual.y - expected.y).abs() < 0.02
}

#[test]
fn test_corners_are_top_left_clockwise() {
    let image = canvas(160, 120, &[(40, 30, 120, 90)]);
    let metadata = FrameMetadata::new(160, 120);
    let quads = ContourRectDetector::new()
        .detect(&image, &metadata, &DetectionConfig::default())
        .expect("detection should succeed");

    assert_eq!(quads.len(), 1);
    let quad = quads[0];
    // Observation space has y pointing up
    assert!(quad.top_left.x < quad.top_right.x);
    assert!(quad.top_left.y > quad.bottom_left.y);
    assert!(quad.bottom_right.x > quad.bottom_left.x);
    assert!(quad.top_right.y > quad.bottom_right.y);
    assert!((quad.area() - 0.25).abs() < 0.03);
}

#[test]
fn test_results_are_largest_first() {
    let image = canvas(160, 120, &[(20, 20, 70, 60), (100, 50, 145, 105)]);
    let metadata = FrameMetadata::new(160, 120);
    let quads = ContourRectDetector::new()
        .detect(&image, &metadata, &DetectionConfig::default())
        .expect("detection should succeed");

    assert_eq!(quads.len(), 2);
    assert!(quads[0].area() >= quads[1].area());
}

#[test]
fn test_raising_minimum_size_filters_small_shapes() {
    let image = canvas(160, 120, &[(20, 20, 70, 60), (110, 80, 130, 100)]);
    let metadata = FrameMetadata::new(160, 120);
    let detector = ContourRectDetector::new();

    let relaxed = detector
        .detect(&image, &metadata, &DetectionConfig::default())
        .expect("detection should succeed");
    assert_eq!(relaxed.len(), 2);

    // The 20px square is below 25% of the 120px short side
    let strict = DetectionConfig {
        minimum_size: 0.25,
        ..DetectionConfig::default()
    };
    let filtered = detector
        .detect(&image, &metadata, &strict)
        .expect("detection should succeed");
    assert_eq!(filtered.len(), 1);
}

#[test]
fn test_dispatcher_handles_padded_rows() {
    let image = canvas(160, 120, &[(40, 30, 120, 90)]);
    let metadata = FrameMetadata::new(160, 120);

    let direct = ContourRectDetector::new()
        .detect(&image, &metadata, &DetectionConfig::default())
        .expect("detection should succeed");

    let frame = padded_frame(&image, 64);
    assert!(frame.has_complete_buffer());
    let dispatched = FrameDispatcher::default()
        .dispatch(&frame, &metadata)
        .expect("dispatch should produce a result");

    assert_eq!(dispatched.len(), direct.len());
    for (a, b) in dispatched.iter().zip(&direct) {
        for (ca, cb) in a.corners().into_iter().zip(b.corners()) {
            assert!(near(ca, cb), "{ca:?} != {cb:?}");
        }
    }
}

#[test]
fn test_truncated_frame_is_skipped() {
    let image = canvas(32, 32, &[]);
    let mut frame = padded_frame(&image, 0);
    frame.data = Arc::from(&frame.data[..100]);

    assert!(!frame.has_complete_buffer());
    assert!(
        FrameDispatcher::default()
            .dispatch(&frame, &FrameMetadata::new(32, 32))
            .is_none()
    );
}
