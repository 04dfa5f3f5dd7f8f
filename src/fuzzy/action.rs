//! What a consumer should do with a match of a given confidence.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendedAction {
    /// Confidence of at least 0.9
    AutoAccept,
    /// At least 0.7: show the candidates and let the user pick
    PresentOptions,
    /// At least 0.5: ask the user to type the name
    ManualEntry,
    /// Below 0.5: take another picture
    Rescan,
}

impl RecommendedAction {
    pub fn for_confidence(confidence: f32) -> Self {
        if confidence >= 0.9 {
            RecommendedAction::AutoAccept
        } else if confidence >= 0.7 {
            RecommendedAction::PresentOptions
        } else if confidence >= 0.5 {
            RecommendedAction::ManualEntry
        } else {
            RecommendedAction::Rescan
        }
    }
}

impl std::fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            RecommendedAction::AutoAccept => "auto_accept",
            RecommendedAction::PresentOptions => "present_options",
            RecommendedAction::ManualEntry => "manual_entry",
            RecommendedAction::Rescan => "rescan",
        };
        f.write_str(text)
    }
}
