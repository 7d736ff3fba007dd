// SPDX-License-Identifier: GPL-3.0-only

//! Terminal-based camera viewer
//!
//! Renders the camera feed to the terminal using Unicode half-block
//! characters for improved vertical resolution, with detected rectangles
//! outlined in yellow.

use crate::app::frame_processor::frame_image::{apply_orientation, frame_to_rgba_image};
use crate::app::frame_processor::{
    DetectionConfig, DeviceOrientation, FrameDispatcher, FrameMetadata,
};
use crate::app::rect_overlay::raster::{draw_paths, outline_pixels};
use crate::app::rect_overlay::{OverlayPool, ViewRect, VideoContentFit, calculate_video_bounds};
use crate::backends::camera::types::{CameraDevice, CameraFormat, CameraFrame, FrameReceiver};
use crate::backends::camera::{CaptureSession, enumerate_cameras, select_camera};
use crate::config::Config;
use crate::errors::AppResult;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use image::{DynamicImage, RgbaImage};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    widgets::Widget,
};
use std::collections::HashSet;
use std::io::{self, stdout};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

/// Capture size for terminal mode; higher resolutions are wasted on cells
const TERMINAL_FORMAT: CameraFormat = CameraFormat {
    width: 640,
    height: 480,
    framerate: None,
};

/// Run the terminal camera viewer
pub fn run() -> AppResult<()> {
    gstreamer::init()?;

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

struct CameraPipeline {
    _session: CaptureSession,
    receiver: FrameReceiver,
}

impl CameraPipeline {
    fn new(device: &CameraDevice) -> AppResult<Self> {
        let (session, receiver) = CaptureSession::open(device, &TERMINAL_FORMAT)?;
        Ok(Self {
            _session: session,
            receiver,
        })
    }

    fn try_get_frame(&mut self) -> Option<CameraFrame> {
        // Non-blocking receive
        self.receiver.try_recv().ok()
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> AppResult<()> {
    let (_, config) = Config::load();
    let cameras = enumerate_cameras();
    info!(count = cameras.len(), "Found cameras");

    let multi_camera = cameras.len() > 1;
    let mut current_camera_index = config
        .last_camera_path
        .as_ref()
        .and_then(|path| cameras.iter().position(|cam| &cam.path == path))
        .unwrap_or(0);
    let mut pipeline = initialize_camera(select_camera(&cameras, current_camera_index)?)?;

    let mut dispatcher = FrameDispatcher::default();
    dispatcher.set_config(DetectionConfig::from_config(&config));

    let mut frame_widget = FrameWidget::new(config.overlay_slots);
    let mut detection_enabled = config.detection_enabled;
    let mut show_help = false;
    let mut status_message = build_status_message(multi_camera, detection_enabled, 0);

    loop {
        // Drain all available frames to get the latest
        let mut latest = None;
        while let Some(frame) = pipeline.try_get_frame() {
            latest = Some(frame);
        }

        if let Some(frame) = latest {
            let orientation = config.orientation_for(cameras[current_camera_index].rotation);
            if frame_widget.update_frame(&frame, orientation) && detection_enabled {
                let metadata = FrameMetadata::new(frame.width, frame.height)
                    .with_orientation(orientation)
                    .with_intrinsics(config.intrinsics_for(&cameras[current_camera_index].path));
                if let Some(quads) = dispatcher.dispatch(&frame, &metadata) {
                    frame_widget.overlay.assign(&quads);
                    if !show_help {
                        status_message =
                            build_status_message(multi_camera, detection_enabled, quads.len());
                    }
                }
            }
        }

        terminal.draw(|f| {
            let area = f.area();

            // Reserve bottom line for status
            let camera_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(1),
            };
            f.render_widget(&frame_widget, camera_area);

            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };
            f.render_widget(
                StatusBar {
                    message: &status_message,
                },
                status_area,
            );
        })?;

        // Handle input with timeout for frame updates
        if event::poll(Duration::from_millis(16))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match key.code {
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
                KeyCode::Char('q') => break,
                KeyCode::Char('p') => {
                    show_help = false;
                    if let Some(image) = &frame_widget.image {
                        status_message = match save_snapshot(image, &frame_widget.overlay) {
                            Ok(path) => format!("Saved: {}", path.display()),
                            Err(e) => {
                                error!(error = %e, "Failed to save snapshot");
                                format!("Error: {}", e)
                            }
                        };
                    }
                }
                KeyCode::Char('d') => {
                    show_help = false;
                    detection_enabled = !detection_enabled;
                    frame_widget.overlay.clear();
                    status_message = build_status_message(multi_camera, detection_enabled, 0);
                }
                KeyCode::Char('s') if multi_camera => {
                    show_help = false;
                    let previous = current_camera_index;
                    current_camera_index = (current_camera_index + 1) % cameras.len();

                    // Release the old camera before opening the next
                    drop(pipeline);

                    match initialize_camera(&cameras[current_camera_index]) {
                        Ok(new_pipeline) => {
                            pipeline = new_pipeline;
                            status_message =
                                build_status_message(multi_camera, detection_enabled, 0);
                            frame_widget = FrameWidget::new(config.overlay_slots);
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to switch camera");
                            status_message = format!("Error: {}", e);
                            current_camera_index = previous;
                            pipeline = initialize_camera(&cameras[current_camera_index])?;
                        }
                    }
                }
                KeyCode::Char('h') => {
                    show_help = !show_help;
                    status_message = if show_help {
                        build_help_message(multi_camera)
                    } else {
                        build_status_message(
                            multi_camera,
                            detection_enabled,
                            frame_widget.overlay.active_count(),
                        )
                    };
                }
                _ => {}
            }
        }
    }

    Ok(())
}

fn initialize_camera(device: &CameraDevice) -> AppResult<CameraPipeline> {
    info!(device = %device.name, format = %TERMINAL_FORMAT, "Initializing camera");
    CameraPipeline::new(device)
}

fn build_status_message(multi_camera: bool, detection_enabled: bool, found: usize) -> String {
    let mut msg = if detection_enabled {
        format!("{} rectangle(s) | 'd' detection off", found)
    } else {
        "detection off | 'd' detection on".to_string()
    };
    msg.push_str(" | 'p' snapshot");
    if multi_camera {
        msg.push_str(" | 's' switch camera");
    }
    msg.push_str(" | 'h' help | 'q' quit");
    msg
}

fn build_help_message(multi_camera: bool) -> String {
    let mut msg = String::from("p: Save annotated snapshot | d: Toggle detection | ");
    if multi_camera {
        msg.push_str("s: Switch camera | ");
    }
    msg.push_str("h: Toggle help | q/Ctrl+C: Quit");
    msg
}

/// Save the upright frame with outlines drawn in
fn save_snapshot(
    image: &RgbaImage,
    overlay: &OverlayPool,
) -> AppResult<PathBuf> {
    let mut annotated = image.clone();
    let paths = overlay.layout(
        ViewRect::from_size(annotated.width(), annotated.height()),
        false,
    );
    draw_paths(&mut annotated, &paths);

    let dir = dirs::picture_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("QuadCam");
    std::fs::create_dir_all(&dir)?;

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let filepath = dir.join(format!("QUAD_{}.png", timestamp));

    annotated.save(&filepath)?;
    info!(path = %filepath.display(), "Snapshot saved");

    Ok(filepath)
}

/// Widget that renders a camera frame using half-block characters
struct FrameWidget {
    image: Option<RgbaImage>,
    overlay: OverlayPool,
}

impl FrameWidget {
    fn new(slots: usize) -> Self {
        Self {
            image: None,
            overlay: OverlayPool::new(slots),
        }
    }

    /// Replace the displayed frame; returns false when the frame is unusable
    fn update_frame(
        &mut self,
        frame: &CameraFrame,
        orientation: DeviceOrientation,
    ) -> bool {
        match frame_to_rgba_image(frame) {
            Ok(image) => {
                self.image =
                    Some(apply_orientation(DynamicImage::ImageRgba8(image), orientation).into_rgba8());
                true
            }
            Err(e) => {
                warn!(sequence = frame.sequence, error = %e, "Skipping frame");
                false
            }
        }
    }
}

impl Widget for &FrameWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(image) = &self.image else {
            let msg = "Waiting for camera...";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, ratatui::style::Style::default());
            }
            return;
        };

        if image.width() == 0 || image.height() == 0 {
            return;
        }

        // Each terminal cell displays 2 vertical pixels
        let bounds = calculate_video_bounds(
            area.width as f32,
            (area.height * 2) as f32,
            image.width(),
            image.height(),
            VideoContentFit::Contain,
        );
        let display_width = bounds.width as u16;
        let display_rows = (bounds.height / 2.0) as u16;
        if display_width == 0 || display_rows == 0 {
            return;
        }

        let x_offset = area.x + (bounds.x as u16);
        let y_offset = area.y + (bounds.y / 2.0) as u16;

        let x_scale = image.width() as f32 / display_width as f32;
        let y_scale = image.height() as f32 / (display_rows * 2) as f32;

        // Outline pixels in display space
        let target = ViewRect::new(0.0, 0.0, display_width as f32, (display_rows * 2) as f32);
        let outline: HashSet<(i32, i32)> = self
            .overlay
            .layout(target, false)
            .iter()
            .flat_map(|path| outline_pixels(path).collect::<Vec<_>>())
            .collect();

        for ty in 0..display_rows {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;
                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let top_row = ty as i32 * 2;
                let pixel_color = |row: i32| -> Color {
                    if outline.contains(&(tx as i32, row)) {
                        return Color::Yellow;
                    }
                    let src_x = ((tx as f32 * x_scale) as u32).min(image.width() - 1);
                    let src_y = ((row as f32 * y_scale) as u32).min(image.height() - 1);
                    let [r, g, b, _] = image.get_pixel(src_x, src_y).0;
                    Color::Rgb(r, g, b)
                };

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(pixel_color(top_row));
                    cell.set_bg(pixel_color(top_row + 1));
                }
            }
        }
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();

        buf.set_string(
            area.x,
            area.y,
            text,
            ratatui::style::Style::default()
                .fg(Color::White)
                .bg(Color::DarkGray),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_mentions_switch_only_with_multiple_cameras() {
        assert!(build_status_message(true, true, 2).contains("'s' switch camera"));
        assert!(!build_status_message(false, true, 2).contains("'s' switch camera"));
        assert!(build_status_message(false, true, 2).starts_with("2 rectangle(s)"));
        assert!(build_status_message(false, false, 0).starts_with("detection off"));
    }
}
