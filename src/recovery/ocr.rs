//! # OCR Collaborator
//!
//! The recovery orchestrator consumes OCR output through [`OcrProvider`]; it
//! never implements text recognition itself.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::ocr_errors::OcrError;

/// Text read by an OCR provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrOutput {
    pub text: String,
    /// Provider confidence, 0.0-1.0
    pub confidence: f32,
}

impl OcrOutput {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence: if confidence.is_finite() {
                confidence.clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }
}

/// External text recognition service
///
/// # Arguments
///
/// * `image` - The package photograph
/// * `prompt` - Optional hint, such as the partially read name
pub trait OcrProvider: Send + Sync {
    fn recognize(&self, image: &DynamicImage, prompt: Option<&str>) -> Result<OcrOutput, OcrError>;
}

/// Prompt sent with EnhancedOCR calls
pub(crate) fn recovery_prompt(partial_text: &str) -> Option<String> {
    let partial = partial_text.trim();
    if partial.is_empty() {
        None
    } else {
        Some(format!(
            "Read the medication name printed on this package. A partial reading was: {}",
            partial
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_confidence_is_clamped() {
        assert_eq!(OcrOutput::new("Advil", 1.7).confidence, 1.0);
        assert_eq!(OcrOutput::new("Advil", f32::NAN).confidence, 0.0);
    }

    #[test]
    fn test_prompt_only_with_partial_text() {
        assert!(recovery_prompt("  ").is_none());
        assert!(recovery_prompt("Amox").unwrap().ends_with("Amox"));
    }
}
