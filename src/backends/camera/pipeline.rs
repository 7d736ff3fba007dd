// SPDX-License-Identifier: MPL-2.0

//! GStreamer pipeline for RGBA camera capture
//!
//! The pipeline decodes whatever the source produces and converts it to
//! RGBA at the requested size before handing frames to an appsink.

use super::types::*;
use crate::constants::{pipeline, timing};
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Source element for a camera device
pub fn source_element(device: &CameraDevice) -> String {
    match device.source {
        CameraSource::V4l2 => format!("v4l2src device={}", device.path),
        CameraSource::PipeWire => {
            let target = device
                .path
                .strip_prefix("pipewire-serial-")
                .or_else(|| device.path.strip_prefix("pipewire-"));
            match target {
                Some(target) => format!("pipewiresrc target-object={}", target),
                None => "pipewiresrc".to_string(),
            }
        }
    }
}

/// Full `gst-launch` style pipeline description
pub fn pipeline_description(device: &CameraDevice, format: &CameraFormat) -> String {
    let mut caps = format!(
        "video/x-raw,format={},width={},height={}",
        pipeline::OUTPUT_FORMAT,
        format.width,
        format.height
    );
    let mut rate = String::new();
    if let Some(fps) = format.framerate {
        caps.push_str(&format!(",framerate={}/1", fps));
        rate.push_str("videorate ! ");
    }

    format!(
        "{} ! decodebin ! videoconvert ! videoscale ! {}{} ! appsink name=sink",
        source_element(device),
        rate,
        caps
    )
}

/// Build the pipeline and return it with its appsink
pub fn build_pipeline(
    device: &CameraDevice,
    format: &CameraFormat,
) -> BackendResult<(gstreamer::Pipeline, AppSink)> {
    gstreamer::init().map_err(|e| BackendError::NotAvailable(e.to_string()))?;

    let description = pipeline_description(device, format);
    info!(device = %device.name, %format, pipeline = %description, "Creating capture pipeline");

    let pipeline = gstreamer::parse::launch(&description)
        .map_err(|e| BackendError::InitializationFailed(e.to_string()))?
        .dynamic_cast::<gstreamer::Pipeline>()
        .map_err(|_| {
            BackendError::InitializationFailed("Parsed element is not a pipeline".to_string())
        })?;

    let appsink = pipeline
        .by_name("sink")
        .ok_or_else(|| BackendError::InitializationFailed("Failed to get appsink".to_string()))?
        .dynamic_cast::<AppSink>()
        .map_err(|_| BackendError::InitializationFailed("Failed to cast appsink".to_string()))?;

    appsink.set_property("emit-signals", true);
    appsink.set_property("sync", false); // Disable sync for lowest latency
    appsink.set_property("max-buffers", pipeline::MAX_BUFFERS);
    appsink.set_property("drop", true); // Drop old frames if processing is slow
    appsink.set_property("enable-last-sample", false);

    Ok((pipeline, appsink))
}

/// Forward every decoded sample to `frame_sender`
///
/// Frames are sent with `try_send`; when the receiver lags behind they are
/// dropped.
pub fn attach_frame_callback(appsink: &AppSink, frame_sender: FrameSender) {
    let sequence = Arc::new(AtomicU64::new(0));

    appsink.set_callbacks(
        gstreamer_app::AppSinkCallbacks::builder()
            .new_sample(move |appsink| {
                let frame_start = Instant::now();
                let frame_num = sequence.fetch_add(1, Ordering::Relaxed);
                let log_this_frame = frame_num % timing::FRAME_LOG_INTERVAL == 0;

                let sample = appsink.pull_sample().map_err(|e| {
                    if log_this_frame {
                        error!(frame = frame_num, error = ?e, "Failed to pull sample");
                    }
                    gstreamer::FlowError::Eos
                })?;

                let buffer = sample.buffer().ok_or_else(|| {
                    if log_this_frame {
                        error!(frame = frame_num, "No buffer in sample");
                    }
                    gstreamer::FlowError::Error
                })?;

                if buffer.flags().contains(gstreamer::BufferFlags::CORRUPTED) {
                    if log_this_frame {
                        warn!(frame = frame_num, "Buffer marked as corrupted, skipping frame");
                    }
                    return Ok(gstreamer::FlowSuccess::Ok);
                }

                let caps = sample.caps().ok_or_else(|| {
                    if log_this_frame {
                        error!(frame = frame_num, "No caps in sample");
                    }
                    gstreamer::FlowError::Error
                })?;

                let video_info = VideoInfo::from_caps(caps).map_err(|e| {
                    if log_this_frame {
                        error!(frame = frame_num, error = ?e, "Failed to get video info");
                    }
                    gstreamer::FlowError::Error
                })?;

                let map = buffer.map_readable().map_err(|e| {
                    if log_this_frame {
                        error!(frame = frame_num, error = ?e, "Failed to map buffer");
                    }
                    gstreamer::FlowError::Error
                })?;

                let frame = CameraFrame {
                    width: video_info.width(),
                    height: video_info.height(),
                    data: Arc::from(map.as_slice()),
                    stride: video_info.stride()[0] as u32,
                    sequence: frame_num,
                    captured_at: frame_start,
                };

                let mut sender = frame_sender.clone();
                match sender.try_send(frame) {
                    Ok(()) => {
                        if log_this_frame {
                            debug!(
                                frame = frame_num,
                                width = video_info.width(),
                                height = video_info.height(),
                                stride = video_info.stride()[0],
                                total_us = frame_start.elapsed().as_micros(),
                                "Frame delivered"
                            );
                        }
                    }
                    Err(e) if e.is_disconnected() => {
                        debug!(frame = frame_num, "Frame receiver closed");
                        return Err(gstreamer::FlowError::Eos);
                    }
                    Err(_) => {
                        if log_this_frame {
                            debug!(frame = frame_num, "Frame dropped (channel full)");
                        }
                    }
                }

                Ok(gstreamer::FlowSuccess::Ok)
            })
            .build(),
    );
}

/// Detach callbacks so the sender is released
pub fn detach_frame_callback(appsink: &AppSink) {
    appsink.set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(path: &str, source: CameraSource) -> CameraDevice {
        CameraDevice {
            name: "Test".to_string(),
            path: path.to_string(),
            source,
            rotation: SensorRotation::None,
        }
    }

    #[test]
    fn test_pipewire_source_targets_serial() {
        assert_eq!(
            source_element(&device("pipewire-serial-2146", CameraSource::PipeWire)),
            "pipewiresrc target-object=2146"
        );
        assert_eq!(
            source_element(&device("pipewire-76", CameraSource::PipeWire)),
            "pipewiresrc target-object=76"
        );
        assert_eq!(
            source_element(&CameraDevice::pipewire_default()),
            "pipewiresrc"
        );
    }

    #[test]
    fn test_v4l2_source_uses_device_node() {
        assert_eq!(
            source_element(&device("/dev/video2", CameraSource::V4l2)),
            "v4l2src device=/dev/video2"
        );
    }

    #[test]
    fn test_pipeline_description_requests_rgba() {
        let format = CameraFormat {
            width: 640,
            height: 480,
            framerate: None,
        };
        let description = pipeline_description(&CameraDevice::pipewire_default(), &format);
        assert_eq!(
            description,
            "pipewiresrc ! decodebin ! videoconvert ! videoscale ! \
             video/x-raw,format=RGBA,width=640,height=480 ! appsink name=sink"
        );
    }

    #[test]
    fn test_pipeline_description_with_framerate() {
        let format = CameraFormat {
            width: 1280,
            height: 720,
            framerate: Some(30),
        };
        let description = pipeline_description(&CameraDevice::pipewire_default(), &format);
        assert!(description.contains("videorate ! video/x-raw"));
        assert!(description.ends_with("framerate=30/1 ! appsink name=sink"));
    }
}
