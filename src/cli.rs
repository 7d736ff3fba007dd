// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for rectangle detection
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Detecting rectangles in an image file
//! - Streaming live detections as JSON lines

use chrono::Local;
use quadcam::app::frame_processor::{
    ContourRectDetector, DetectionConfig, FrameDispatcher, FrameMetadata, Quadrilateral,
    RectangleDetector,
};
use quadcam::app::rect_overlay::ViewRect;
use quadcam::app::rect_overlay::raster::draw_paths;
use quadcam::backends::camera::{CaptureSession, enumerate_cameras, select_camera};
use quadcam::config::Config;
use quadcam::errors::AppResult;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Detection overrides shared by `detect` and `watch`
#[derive(Debug, Clone, Copy, Default)]
pub struct DetectionOverrides {
    pub minimum_size: Option<f32>,
    pub maximum_observations: Option<usize>,
}

impl DetectionOverrides {
    fn apply(self, config: &Config) -> DetectionConfig {
        let mut detection = DetectionConfig::from_config(config);
        if let Some(minimum_size) = self.minimum_size {
            detection.minimum_size = minimum_size.clamp(0.0, 1.0);
        }
        if let Some(maximum_observations) = self.maximum_observations {
            detection.maximum_observations = maximum_observations;
        }
        detection
    }
}

#[derive(Serialize)]
struct ImageReport<'a> {
    image: &'a Path,
    width: u32,
    height: u32,
    rectangles: &'a [Quadrilateral],
}

#[derive(Serialize)]
struct FrameReport<'a> {
    timestamp: String,
    sequence: u64,
    latency_ms: u128,
    rectangles: &'a [Quadrilateral],
}

/// List all available cameras
pub fn list_cameras() -> AppResult<()> {
    gstreamer::init()?;

    let cameras = enumerate_cameras();

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        if !camera.path.is_empty() {
            println!("      Path: {}", camera.path);
        }
        println!(
            "      Source: {} | Sensor rotation: {}",
            camera.source, camera.rotation
        );
        println!();
    }

    Ok(())
}

/// Detect rectangles in an image file and print them as JSON
///
/// With `output`, an annotated copy of the image is written as well.
pub fn detect_image(
    image_path: PathBuf,
    output: Option<PathBuf>,
    overrides: DetectionOverrides,
) -> AppResult<()> {
    let (_, config) = Config::load();
    let detection = overrides.apply(&config);

    let image = image::open(&image_path)?.into_rgba8();
    let (width, height) = image.dimensions();
    let metadata = FrameMetadata::new(width, height);

    let detector = ContourRectDetector::new();
    let rectangles = detector.detect(&image, &metadata, &detection)?;

    let report = ImageReport {
        image: &image_path,
        width,
        height,
        rectangles: &rectangles,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(output_path) = output {
        if let Some(parent) = output_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let mut annotated = image;
        let target = ViewRect::from_size(width, height);
        let paths: Vec<_> = rectangles.iter().map(|quad| quad.map_to(target)).collect();
        draw_paths(&mut annotated, &paths);
        annotated.save(&output_path)?;
        eprintln!("Annotated image saved: {}", output_path.display());
    }

    Ok(())
}

/// Stream detections from a live camera as JSON lines until Ctrl+C
pub fn watch_camera(
    camera_index: usize,
    overrides: DetectionOverrides,
) -> AppResult<()> {
    gstreamer::init()?;

    let (_, config) = Config::load();
    let cameras = enumerate_cameras();
    let camera = select_camera(&cameras, camera_index)?;
    let format = config.capture_format();
    eprintln!("Using camera: {} ({})", camera.name, format);

    let mut dispatcher = FrameDispatcher::default();
    dispatcher.set_config(overrides.apply(&config));
    let orientation = config.orientation_for(camera.rotation);
    let intrinsics = config.intrinsics_for(&camera.path);

    let (session, mut receiver) = CaptureSession::open(camera, &format)?;

    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    eprintln!("Watching... (press Ctrl+C to stop)");

    while !stop_flag.load(Ordering::SeqCst) {
        // Only the newest pending frame is worth detecting on
        let mut latest = None;
        while let Ok(frame) = receiver.try_recv() {
            latest = Some(frame);
        }

        let Some(frame) = latest else {
            std::thread::sleep(Duration::from_millis(10));
            continue;
        };

        let metadata = FrameMetadata::new(frame.width, frame.height)
            .with_orientation(orientation)
            .with_intrinsics(intrinsics);
        if let Some(rectangles) = dispatcher.dispatch(&frame, &metadata) {
            let report = FrameReport {
                timestamp: Local::now().to_rfc3339(),
                sequence: frame.sequence,
                latency_ms: frame.captured_at.elapsed().as_millis(),
                rectangles: &rectangles,
            };
            println!("{}", serde_json::to_string(&report)?);
        }
    }

    eprintln!("Stopping...");
    session.stop()?;

    Ok(())
}
