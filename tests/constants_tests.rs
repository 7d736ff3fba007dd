// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use quadcam::constants::{detection, overlay, pipeline, timing};

#[test]
fn test_detection_defaults_are_sane() {
    assert!(detection::MINIMUM_SIZE > 0.0 && detection::MINIMUM_SIZE < 1.0);
    assert!(detection::MINIMUM_SIZE <= detection::MINIMUM_SIZE_LIMIT);
    assert!(detection::MAXIMUM_OBSERVATIONS >= 1);
    assert!(detection::MAXIMUM_OBSERVATIONS <= detection::MAXIMUM_OBSERVATIONS_LIMIT as usize);
    assert!(detection::MINIMUM_ASPECT_RATIO > 0.0 && detection::MINIMUM_ASPECT_RATIO <= 1.0);
    assert!(detection::QUADRATURE_TOLERANCE_DEGREES < 90.0);
    assert!(detection::POLYGON_EPSILON_RATIO > 0.0);
    assert!(detection::DUPLICATE_CORNER_RATIO > 0.0 && detection::DUPLICATE_CORNER_RATIO < 0.5);
}

#[test]
fn test_overlay_has_room_for_every_observation() {
    assert!(overlay::DEFAULT_SLOT_COUNT >= detection::MAXIMUM_OBSERVATIONS);
}

#[test]
fn test_overlay_style() {
    let (r, g, b) = overlay::STROKE_RGB;
    // Yellow: strong red and green, no blue
    assert!(r > 0.9 && g > 0.7 && b < 0.1);
    assert!(overlay::FILL_ALPHA > 0.0 && overlay::FILL_ALPHA < 1.0);
    assert!(overlay::STROKE_WIDTH >= 1.0);
}

#[test]
fn test_pipeline_outputs_rgba() {
    assert_eq!(pipeline::OUTPUT_FORMAT, "RGBA");
    assert!(pipeline::FRAME_CHANNEL_CAPACITY >= 1);
}

#[test]
fn test_frame_wait_is_short() {
    assert!(timing::FRAME_WAIT < timing::BUS_POLL_INTERVAL * 10);
    assert!(timing::FRAME_LOG_INTERVAL > 0);
}
