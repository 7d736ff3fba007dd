// SPDX-License-Identifier: GPL-3.0-only

//! Camera control handlers
//!
//! Handles camera selection, enumeration results and incoming frames.

use crate::app::frame_processor::FrameMetadata;
use crate::app::frame_processor::frame_image::{apply_orientation, frame_to_rgba_image};
use crate::app::state::{AppModel, Message, PreviewImage};
use crate::backends::camera::types::{CameraDevice, CameraFrame};
use crate::constants::timing;
use cosmic::Task;
use cosmic::widget::image::Handle;
use image::DynamicImage;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

impl AppModel {
    pub(crate) fn handle_switch_camera(&mut self) -> Task<cosmic::Action<Message>> {
        info!(
            current_index = self.current_camera_index,
            "Received SwitchCamera message"
        );
        if self.available_cameras.len() > 1 {
            let next = (self.current_camera_index + 1) % self.available_cameras.len();
            self.activate_camera(next);
        } else {
            info!("Only one camera available, cannot switch");
        }
        Task::none()
    }

    pub(crate) fn handle_select_camera(&mut self, index: usize) -> Task<cosmic::Action<Message>> {
        if index < self.available_cameras.len() && index != self.current_camera_index {
            info!(index, "Selected camera index");
            self.activate_camera(index);
        }
        Task::none()
    }

    /// Stop the running capture and make `index` the active camera
    ///
    /// The camera subscription is keyed on the index, so the next
    /// `subscription()` call opens the new device.
    fn activate_camera(&mut self, index: usize) {
        self.camera_cancel_flag.store(true, Ordering::Release);
        self.camera_cancel_flag = Arc::new(AtomicBool::new(false));

        self.current_camera_index = index;
        self.current_frame = None;
        self.preview = None;
        self.clear_detections();

        if let Some(camera) = self.available_cameras.get(index) {
            info!(camera = %camera.name, path = %camera.path, "Switching to camera");
            self.config.last_camera_path = Some(camera.path.clone());
            self.save_config("last camera");
        }
    }

    pub(crate) fn handle_cameras_initialized(
        &mut self,
        cameras: Vec<CameraDevice>,
        camera_index: usize,
    ) -> Task<cosmic::Action<Message>> {
        info!(
            count = cameras.len(),
            camera_index, "Cameras initialized asynchronously"
        );

        self.camera_dropdown_options = cameras
            .iter()
            .map(|cam| {
                cam.name
                    .strip_suffix(" (V4L2)")
                    .unwrap_or(&cam.name)
                    .to_string()
            })
            .collect();
        self.current_camera_index = camera_index.min(cameras.len().saturating_sub(1));
        self.available_cameras = cameras;

        Task::none()
    }

    pub(crate) fn handle_camera_frame(
        &mut self,
        frame: Arc<CameraFrame>,
    ) -> Task<cosmic::Action<Message>> {
        if frame.sequence % timing::FRAME_LOG_INTERVAL == 0 {
            debug!(
                sequence = frame.sequence,
                width = frame.width,
                height = frame.height,
                bytes = frame.data.len(),
                "CameraFrame message received in update()"
            );
        }

        if !frame.has_complete_buffer() {
            warn!(
                sequence = frame.sequence,
                width = frame.width,
                height = frame.height,
                bytes = frame.data.len(),
                "Dropping frame with truncated buffer"
            );
            return Task::none();
        }

        let orientation = self.current_orientation();
        match build_preview(&frame, orientation, self.config.mirror_preview) {
            Some(preview) => {
                let resized = self
                    .preview
                    .as_ref()
                    .is_some_and(|old| old.width != preview.width || old.height != preview.height);
                if resized {
                    // Outlines were laid out for the previous frame size
                    self.clear_detections();
                }
                self.preview = Some(preview);
            }
            None => return Task::none(),
        }
        self.current_frame = Some(Arc::clone(&frame));

        if !self.config.detection_enabled || self.dispatcher.is_busy() {
            return Task::none();
        }

        let intrinsics = self
            .current_camera()
            .and_then(|camera| self.config.intrinsics_for(&camera.path));
        let metadata = FrameMetadata::new(frame.width, frame.height)
            .with_orientation(orientation)
            .with_intrinsics(intrinsics);
        let dispatcher = self.dispatcher.clone();

        Task::perform(
            async move { dispatcher.dispatch_async(frame, metadata).await },
            |result| cosmic::Action::App(Message::RectanglesDetected(result)),
        )
    }
}

/// Convert a frame into the upright (and optionally mirrored) preview image
fn build_preview(
    frame: &CameraFrame,
    orientation: crate::app::frame_processor::DeviceOrientation,
    mirrored: bool,
) -> Option<PreviewImage> {
    let image = match frame_to_rgba_image(frame) {
        Ok(image) => image,
        Err(e) => {
            warn!(sequence = frame.sequence, error = %e, "Failed to convert frame for preview");
            return None;
        }
    };

    let mut upright = apply_orientation(DynamicImage::ImageRgba8(image), orientation);
    if mirrored {
        upright = upright.fliph();
    }
    let rgba = upright.into_rgba8();
    let (width, height) = rgba.dimensions();

    Some(PreviewImage {
        handle: Handle::from_rgba(width, height, rgba.into_raw()),
        width,
        height,
    })
}
