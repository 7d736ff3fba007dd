// SPDX-License-Identifier: MPL-2.0

//! Main application module for QuadCam
//!
//! This module contains the application state, message handling, UI rendering,
//! and the wiring between capture, detection and the overlay.
//!
//! # Architecture
//!
//! - `state`: Application state types (AppModel, Message, ContextPage)
//! - `camera_preview`: Camera preview display widget
//! - `frame_processor`: Rectangle detection and per-frame dispatch
//! - `rect_overlay`: Coordinate mapping and outline rendering
//! - `settings`: Settings drawer UI
//! - `view`: Main view rendering
//! - `update`: Message handling
//!
//! # Threads
//!
//! Frames arrive from the capture session on a background subscription and
//! are forwarded to the UI with `try_send`. Detection runs on tokio's blocking
//! pool; its result comes back as [`Message::RectanglesDetected`]. All drawing
//! happens on the UI thread.

mod camera_preview;
pub mod frame_processor;
mod handlers;
pub mod rect_overlay;
pub mod settings;
mod state;
mod update;
mod view;

use crate::config::{APP_ID, Config};
use crate::constants::{app_info, timing};
use crate::fl;
use cosmic::app::context_drawer;
use cosmic::iced::Subscription;
use cosmic::widget::{self, about::About};
use cosmic::{Element, Task};
use frame_processor::{DeviceOrientation, FrameDispatcher};
use rect_overlay::OverlayPool;
pub use state::{AppModel, ContextPage, Message, PreviewImage};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};

const REPOSITORY: &str = "https://github.com/quadcam/quadcam";
const APP_ICON: &[u8] =
    include_bytes!("../../resources/icons/hicolor/scalable/apps/io.github.quadcam.QuadCam.svg");

impl cosmic::Application for AppModel {
    /// The async executor that will be used to run your application's commands.
    type Executor = cosmic::executor::Default;

    /// Data that your application receives to its init method.
    type Flags = ();

    /// Messages which the application and its widgets will emit.
    type Message = Message;

    /// Unique identifier in RDNN (reverse domain name notation) format.
    const APP_ID: &'static str = APP_ID;

    fn core(&self) -> &cosmic::Core {
        &self.core
    }

    fn core_mut(&mut self) -> &mut cosmic::Core {
        &mut self.core
    }

    /// Initializes the application with any given flags and startup commands.
    fn init(
        core: cosmic::Core,
        _flags: Self::Flags,
    ) -> (Self, Task<cosmic::Action<Self::Message>>) {
        let about = About::default()
            .name(fl!("app-title"))
            .icon(widget::icon::from_svg_bytes(APP_ICON))
            .version(app_info::version())
            .links([(fl!("repository"), REPOSITORY)])
            .license(env!("CARGO_PKG_LICENSE"));

        let (config_handler, config) = Config::load();

        // Initialize GStreamer early (required before any GStreamer calls)
        if let Err(e) = gstreamer::init() {
            error!(error = %e, "Failed to initialize GStreamer");
        }

        let orientation_dropdown_options = std::iter::once(fl!("orientation-automatic"))
            .chain(
                DeviceOrientation::ALL
                    .iter()
                    .map(|o| o.display_name().to_string()),
            )
            .collect();

        let mut app = AppModel {
            core,
            context_page: ContextPage::default(),
            about,
            overlay: OverlayPool::new(config.overlay_slots),
            config,
            config_handler,
            available_cameras: Vec::new(),
            current_camera_index: 0,
            camera_dropdown_options: Vec::new(),
            camera_cancel_flag: Arc::new(AtomicBool::new(false)),
            current_frame: None,
            preview: None,
            dispatcher: FrameDispatcher::default(),
            overlay_layer: None,
            detected_count: 0,
            orientation_dropdown_options,
            theme_dropdown_options: vec![fl!("theme-system"), fl!("theme-dark"), fl!("theme-light")],
        };
        app.apply_detection_config();

        // Enumerate cameras off the UI thread (pw-cli can be slow)
        let last_camera_path = app.config.last_camera_path.clone();
        let init_task = Task::perform(
            async move {
                let cameras = tokio::task::spawn_blocking(crate::backends::camera::enumerate_cameras)
                    .await
                    .unwrap_or_else(|e| {
                        error!(error = %e, "Camera enumeration task failed");
                        Vec::new()
                    });
                info!(count = cameras.len(), "Found camera(s)");

                let camera_index = last_camera_path
                    .and_then(|last_path| cameras.iter().position(|cam| cam.path == last_path))
                    .unwrap_or(0);

                (cameras, camera_index)
            },
            |(cameras, index)| cosmic::Action::App(Message::CamerasInitialized(cameras, index)),
        );

        // Restore the saved theme preference
        let theme_task = cosmic::command::set_theme(app.config.app_theme.theme());

        (app, Task::batch([init_task, theme_task]))
    }

    /// Elements to pack at the end of the header bar.
    fn header_end(&self) -> Vec<Element<'_, Self::Message>> {
        vec![
            widget::button::icon(widget::icon::from_name("preferences-system-symbolic"))
                .on_press(Message::ToggleContextPage(ContextPage::Settings))
                .into(),
        ]
    }

    /// Display a context drawer if the context page is requested.
    fn context_drawer(&self) -> Option<context_drawer::ContextDrawer<'_, Self::Message>> {
        if !self.core.window.show_context {
            return None;
        }

        Some(match self.context_page {
            ContextPage::About => context_drawer::about(
                &self.about,
                |url| Message::LaunchUrl(url.to_string()),
                Message::ToggleContextPage(ContextPage::About),
            ),
            ContextPage::Settings => self.settings_view(),
        })
    }

    /// Describes the interface based on the current state of the application model.
    fn view(&self) -> Element<'_, Self::Message> {
        self.view()
    }

    /// Register subscriptions for this application.
    fn subscription(&self) -> Subscription<Self::Message> {
        use cosmic::iced::futures::StreamExt;

        let config_sub = self
            .core()
            .watch_config::<Config>(Self::APP_ID)
            .map(|update| Message::UpdateConfig(update.config));

        let current_camera = self.current_camera().cloned();
        let camera_index = self.current_camera_index;
        let format = self.config.capture_format();
        let cancel_flag = Arc::clone(&self.camera_cancel_flag);
        let cameras_initialized = !self.available_cameras.is_empty();

        let camera_sub = Subscription::run_with_id(
            (
                "camera",
                camera_index,
                (format.width, format.height),
                cameras_initialized,
            ),
            cosmic::iced::stream::channel(
                crate::constants::pipeline::FRAME_CHANNEL_CAPACITY,
                move |mut output| async move {
                    // The subscription restarts once cameras are initialized
                    let Some(device) = current_camera else {
                        info!("No camera available yet");
                        return;
                    };

                    info!(camera_index, name = %device.name, path = %device.path, %format, "Camera subscription started");

                    let (session, mut receiver) =
                        match crate::backends::camera::CaptureSession::open(&device, &format) {
                            Ok(opened) => opened,
                            Err(e) => {
                                error!(error = %e, device = %device.name, "Failed to start capture session");
                                return;
                            }
                        };

                    let mut frame_count = 0u64;
                    loop {
                        if cancel_flag.load(Ordering::Acquire) {
                            info!("Cancel flag set - camera subscription exiting");
                            break;
                        }
                        if output.is_closed() {
                            info!("Output channel closed - camera subscription exiting");
                            break;
                        }

                        // Wait with a timeout to periodically check cancellation
                        match tokio::time::timeout(timing::FRAME_WAIT, receiver.next()).await {
                            Ok(Some(frame)) => {
                                frame_count += 1;
                                // Dropping frames is fine for live preview
                                if let Err(e) = output.try_send(Message::CameraFrame(Arc::new(frame)))
                                {
                                    if e.is_disconnected() {
                                        break;
                                    }
                                    if frame_count % timing::FRAME_LOG_INTERVAL == 0 {
                                        tracing::debug!(frame = frame_count, "Frame dropped (UI channel full)");
                                    }
                                }
                            }
                            Ok(None) => {
                                info!("Capture frame stream ended");
                                break;
                            }
                            Err(_) => continue,
                        }
                    }

                    info!(frames = frame_count, "Releasing capture session");
                    drop(session);
                },
            ),
        );

        Subscription::batch([config_sub, camera_sub])
    }

    /// Handles messages emitted by the application and its widgets.
    fn update(&mut self, message: Self::Message) -> Task<cosmic::Action<Self::Message>> {
        self.update(message)
    }
}
