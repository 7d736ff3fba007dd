// SPDX-License-Identifier: GPL-3.0-only

//! Capture session lifecycle
//!
//! A [`CaptureSession`] owns one running pipeline. Frames arrive on
//! GStreamer's streaming thread and are pushed into a bounded channel; a
//! separate watcher thread drains the pipeline bus and logs runtime errors.
//! Dropping the session releases the camera.

use super::pipeline::{attach_frame_callback, build_pipeline, detach_frame_callback};
use super::types::*;
use crate::constants::{pipeline, timing};
use gstreamer::prelude::*;
use gstreamer::{ClockTime, MessageType, MessageView};
use gstreamer_app::AppSink;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use tracing::{debug, error, info, warn};

/// A running camera capture
pub struct CaptureSession {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
    bus_watcher: Option<BusWatcher>,
    device: CameraDevice,
    format: CameraFormat,
    stopped: bool,
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("device", &self.device.name)
            .field("format", &self.format)
            .field("stopped", &self.stopped)
            .finish()
    }
}

impl CaptureSession {
    /// Open a device and start delivering frames to `frame_sender`
    pub fn start(
        device: &CameraDevice,
        format: &CameraFormat,
        frame_sender: FrameSender,
    ) -> BackendResult<Self> {
        let (pipeline, appsink) = build_pipeline(device, format)?;
        attach_frame_callback(&appsink, frame_sender);

        let bus = pipeline.bus().ok_or_else(|| {
            BackendError::InitializationFailed("Pipeline has no bus".to_string())
        })?;

        let mut session = Self {
            pipeline,
            appsink,
            bus_watcher: None,
            device: device.clone(),
            format: *format,
            stopped: false,
        };

        // Drop performs cleanup if anything below fails
        session.bus_watcher = Some(BusWatcher::spawn(bus, device.name.clone())?);

        debug!("Setting pipeline to PLAYING state");
        session
            .pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| {
                BackendError::InitializationFailed(format!("Failed to start pipeline: {}", e))
            })?;

        let (result, state, pending) = session
            .pipeline
            .state(ClockTime::from_seconds(timing::START_TIMEOUT_SECS));
        debug!(result = ?result, state = ?state, pending = ?pending, "Pipeline state");
        if let Err(e) = result {
            return Err(BackendError::InitializationFailed(format!(
                "Pipeline failed to reach PLAYING: {}",
                e
            )));
        }
        if state != gstreamer::State::Playing {
            warn!(state = ?state, "Pipeline is not in PLAYING state yet");
        }

        info!(device = %device.name, format = %format, "Capture session started");
        Ok(session)
    }

    /// Open a device with a fresh frame channel
    pub fn open(
        device: &CameraDevice,
        format: &CameraFormat,
    ) -> BackendResult<(Self, FrameReceiver)> {
        let (sender, receiver) =
            futures::channel::mpsc::channel(pipeline::FRAME_CHANNEL_CAPACITY);
        let session = Self::start(device, format, sender)?;
        Ok((session, receiver))
    }

    /// Stop capture and release the camera
    pub fn stop(mut self) -> BackendResult<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> BackendResult<()> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;
        info!(device = %self.device.name, "Stopping capture session");

        // Clear appsink callbacks to release the frame sender
        detach_frame_callback(&self.appsink);

        let result = self
            .pipeline
            .set_state(gstreamer::State::Null)
            .map(|_| ())
            .map_err(|e| BackendError::Other(format!("Failed to stop pipeline: {}", e)));

        let (state_result, state, _) = self
            .pipeline
            .state(ClockTime::from_seconds(timing::STOP_TIMEOUT_SECS));
        match state_result {
            Ok(_) => debug!(state = ?state, "Pipeline stopped"),
            Err(e) => debug!(error = ?e, state = ?state, "Pipeline state change had issues"),
        }

        if let Some(mut watcher) = self.bus_watcher.take() {
            watcher.stop();
        }

        result
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(error = %e, "Error while dropping capture session");
        }
    }
}

/// Background thread logging pipeline bus messages
struct BusWatcher {
    handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
}

impl BusWatcher {
    fn spawn(bus: gstreamer::Bus, device_name: String) -> BackendResult<Self> {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&stop_signal);
        let poll = ClockTime::from_mseconds(timing::BUS_POLL_INTERVAL.as_millis() as u64);

        let handle = std::thread::Builder::new()
            .name("capture-bus".to_string())
            .spawn(move || {
                debug!(device = %device_name, "Bus watcher started");

                while !stop.load(Ordering::SeqCst) {
                    let Some(message) = bus.timed_pop_filtered(
                        poll,
                        &[MessageType::Error, MessageType::Warning, MessageType::Eos],
                    ) else {
                        continue;
                    };

                    match message.view() {
                        MessageView::Error(err) => {
                            error!(
                                device = %device_name,
                                source = ?err.src().map(|s| s.path_string()),
                                error = %err.error(),
                                debug = ?err.debug(),
                                "Capture session runtime error"
                            );
                        }
                        MessageView::Warning(w) => {
                            warn!(
                                device = %device_name,
                                source = ?w.src().map(|s| s.path_string()),
                                error = %w.error(),
                                debug = ?w.debug(),
                                "Capture session warning"
                            );
                        }
                        MessageView::Eos(_) => {
                            info!(device = %device_name, "Capture stream ended");
                            break;
                        }
                        _ => {}
                    }
                }

                debug!(device = %device_name, "Bus watcher exiting");
            })
            .map_err(|e| BackendError::Other(format!("Failed to spawn bus watcher: {}", e)))?;

        Ok(Self {
            handle: Some(handle),
            stop_signal,
        })
    }

    fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("Bus watcher thread panicked");
        }
    }
}

impl Drop for BusWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
