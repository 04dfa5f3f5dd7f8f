//! # OCR Error Types Module
//!
//! Errors reported by the external OCR collaborator. The recovery
//! orchestrator treats every variant as "the EnhancedOCR strategy produced
//! zero candidates" and moves on to the next strategy.

/// Custom error types for OCR provider calls
#[derive(Debug, Clone, PartialEq)]
pub enum OcrError {
    /// Provider cannot be reached or is not configured
    Unavailable(String),
    /// Provider answered but text extraction failed
    Extraction(String),
    /// Provider call exceeded the caller's budget
    Timeout(String),
    /// The supplied image has no pixels
    EmptyImage,
}

impl std::fmt::Display for OcrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OcrError::Unavailable(msg) => write!(f, "[OCR_UNAVAILABLE] OCR provider unreachable: {}", msg),
            OcrError::Extraction(msg) => write!(f, "[OCR_EXTRACT] Text extraction from image failed: {}", msg),
            OcrError::Timeout(msg) => write!(f, "[OCR_TIMEOUT] OCR processing timed out: {}", msg),
            OcrError::EmptyImage => write!(f, "[OCR_EMPTY] Image has no pixels"),
        }
    }
}

impl std::error::Error for OcrError {}

impl From<anyhow::Error> for OcrError {
    fn from(err: anyhow::Error) -> Self {
        OcrError::Extraction(err.to_string())
    }
}
