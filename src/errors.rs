//! # Application Error Types
//!
//! This module defines the error types shared by the feature extractor, the
//! reference index, the fuzzy matcher and the recovery orchestrator.
//!
//! Business-level outcomes such as "no match" are never errors; they are
//! reported through degraded results. `AppError` is reserved for conditions
//! the caller must handle: invalid configuration, unreadable files, corrupt
//! snapshots and failing collaborators.

use std::fmt;

use crate::ocr_errors::OcrError;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration validation errors
    Config(String),
    /// Validation errors (empty names, malformed records, etc.)
    Validation(String),
    /// Reference store errors
    Storage(String),
    /// OCR collaborator errors
    Ocr(String),
    /// Snapshot or dictionary (de)serialization errors
    Serialization(String),
    /// File system errors
    FileSystem(String),
    /// Internal application errors
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            AppError::Validation(msg) => write!(f, "[VALIDATION] {}", msg),
            AppError::Storage(msg) => write!(f, "[STORAGE] {}", msg),
            AppError::Ocr(msg) => write!(f, "[OCR] {}", msg),
            AppError::Serialization(msg) => write!(f, "[SERIALIZATION] {}", msg),
            AppError::FileSystem(msg) => write!(f, "[FILESYSTEM] {}", msg),
            AppError::Internal(msg) => write!(f, "[INTERNAL] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileSystem(err.to_string())
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::FileSystem(format!("image decoding failed: {}", err))
    }
}

impl From<OcrError> for AppError {
    fn from(err: OcrError) -> Self {
        AppError::Ocr(err.to_string())
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Standardized error logging utilities for consistent error reporting
pub mod error_logging {
    use tracing::{error, warn};

    /// Log reference store errors with contextual information
    pub fn log_storage_error(
        error: &impl std::fmt::Display,
        operation: &str,
        item_id: Option<u64>,
        item_name: Option<&str>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            item_id = ?item_id,
            item_name = ?item_name,
            "Reference store operation failed"
        );
    }

    /// Log OCR collaborator errors with image and processing context
    pub fn log_ocr_error(
        error: &impl std::fmt::Display,
        operation: &str,
        image_dimensions: Option<(u32, u32)>,
        processing_duration: Option<std::time::Duration>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            image_dimensions = ?image_dimensions,
            processing_duration_ms = ?processing_duration.map(|d| d.as_millis()),
            "OCR provider call failed"
        );
    }

    /// Log a feature family that was dropped from an extraction.
    ///
    /// Family failures are expected on tiny or degenerate images, so this
    /// is a warning rather than an error.
    pub fn log_extraction_error(
        error: &impl std::fmt::Display,
        family: &str,
        image_dimensions: (u32, u32),
    ) {
        warn!(
            error = %error,
            family = %family,
            width = image_dimensions.0,
            height = image_dimensions.1,
            "Feature family extraction failed, family omitted"
        );
    }

    /// Log file system errors with path and operation context
    pub fn log_filesystem_error(error: &impl std::fmt::Display, operation: &str, path: Option<&str>) {
        error!(
            error = %error,
            operation = %operation,
            path = ?path,
            "File system operation failed"
        );
    }

    /// Log configuration errors during startup/initialization
    pub fn log_config_error(error: &impl std::fmt::Display, config_key: &str, operation: &str) {
        error!(
            error = %error,
            config_key = %config_key,
            operation = %operation,
            "Configuration error"
        );
    }
}
