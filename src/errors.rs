// SPDX-License-Identifier: MPL-2.0

//! Error types for the application

use crate::backends::camera::types::BackendError;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera capture errors
    Backend(BackendError),
    /// Rectangle detection errors
    Detection(DetectionError),
    /// Filesystem and terminal I/O errors
    Io(String),
    /// Generic error with message
    Other(String),
}

/// Rectangle detection errors
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionError {
    /// Frame buffer missing or shorter than its dimensions
    InvalidFrame(String),
    /// Image conversion failed
    Image(String),
    /// Detection task panicked or was cancelled
    TaskFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Backend(e) => write!(f, "Camera error: {}", e),
            AppError::Detection(e) => write!(f, "Detection error: {}", e),
            AppError::Io(msg) => write!(f, "I/O error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for DetectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionError::InvalidFrame(msg) => write!(f, "Invalid frame: {}", msg),
            DetectionError::Image(msg) => write!(f, "Image error: {}", msg),
            DetectionError::TaskFailed(msg) => write!(f, "Detection task failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for DetectionError {}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Backend(err)
    }
}

impl From<DetectionError> for AppError {
    fn from(err: DetectionError) -> Self {
        AppError::Detection(err)
    }
}

impl From<gstreamer::glib::Error> for AppError {
    fn from(err: gstreamer::glib::Error) -> Self {
        AppError::Backend(BackendError::NotAvailable(err.to_string()))
    }
}

impl From<ctrlc::Error> for AppError {
    fn from(err: ctrlc::Error) -> Self {
        AppError::Other(format!("Failed to install Ctrl+C handler: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Detection(DetectionError::Image(err.to_string()))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Other(err.to_string())
    }
}
