// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Rectangle detection defaults
pub mod detection {
    /// Smallest shape to report, as a fraction of the smaller frame dimension
    pub const MINIMUM_SIZE: f32 = 0.1;

    /// Most observations returned per frame
    pub const MAXIMUM_OBSERVATIONS: usize = 20;

    /// Upper end of the minimum size slider
    pub const MINIMUM_SIZE_LIMIT: f32 = 0.5;

    /// Upper end of the maximum observations slider
    pub const MAXIMUM_OBSERVATIONS_LIMIT: u16 = 50;

    /// Short side over long side; thinner shapes are rejected
    pub const MINIMUM_ASPECT_RATIO: f32 = 0.5;

    /// Allowed deviation of each corner angle from a right angle
    pub const QUADRATURE_TOLERANCE_DEGREES: f32 = 30.0;

    /// Frames are processed at most this large (longest side, pixels)
    pub const MAX_DIMENSION: u32 = 640;

    /// Douglas-Peucker tolerance relative to the contour perimeter
    pub const POLYGON_EPSILON_RATIO: f64 = 0.02;

    /// Corner distance, relative to the larger shape's shortest side, under
    /// which a nested shape counts as the same rectangle
    pub const DUPLICATE_CORNER_RATIO: f64 = 0.1;

    /// Contours shorter than this many points are ignored outright
    pub const MIN_CONTOUR_POINTS: usize = 16;
}

/// Overlay drawing
pub mod overlay {
    /// Number of outline slots allocated up front
    pub const DEFAULT_SLOT_COUNT: usize = 20;

    /// Outline colour (yellow), RGB 0.0-1.0
    pub const STROKE_RGB: (f32, f32, f32) = (1.0, 0.84, 0.0);

    /// Fill alpha for the outline interior
    pub const FILL_ALPHA: f32 = 0.2;

    /// Outline width in frame pixels
    pub const STROKE_WIDTH: f32 = 2.0;
}

/// GStreamer pipeline configuration
pub mod pipeline {
    /// Maximum buffers in appsink queue
    pub const MAX_BUFFERS: u32 = 2;

    /// Output format for appsink (RGBA for direct display and detection)
    pub const OUTPUT_FORMAT: &str = "RGBA";

    /// Capture size requested when the configuration has none
    pub const DEFAULT_WIDTH: u32 = 1280;
    pub const DEFAULT_HEIGHT: u32 = 720;

    /// Capacity of the frame channel between appsink and consumers
    pub const FRAME_CHANNEL_CAPACITY: usize = 4;
}

/// Timing constants
pub mod timing {
    use std::time::Duration;

    /// Frame counter log interval (log every N frames)
    pub const FRAME_LOG_INTERVAL: u64 = 30;

    /// Timeout for pipeline start (seconds)
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// Timeout for pipeline stop (seconds)
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// Bus watcher poll interval
    pub const BUS_POLL_INTERVAL: Duration = Duration::from_millis(100);

    /// How long the camera subscription waits for a frame before re-checking cancellation
    pub const FRAME_WAIT: Duration = Duration::from_millis(16);
}

/// Application info
pub mod app_info {
    /// Version string baked in by build.rs
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}
