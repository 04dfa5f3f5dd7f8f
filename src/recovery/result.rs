//! Recovery outcomes.

use serde::{Deserialize, Serialize};

use super::strategy::RecoveryStrategy;
use crate::fuzzy::{MatchCandidate, RecommendedAction};

/// Fixed confidence reported when nothing was recovered
pub const FAILED_RECOVERY_CONFIDENCE: f32 = 0.1;

/// Text reported when nothing was recovered and no partial text was given
pub const UNRECOGNIZED_TEXT: &str = "[unrecognized]";

/// How the recovered text was obtained
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryMethod {
    /// Strategies that produced the winning label, in execution order
    Recovered(Vec<RecoveryStrategy>),
    /// No strategy produced a candidate
    Failed,
    /// Visual-only mode found no candidate
    NoVisualMatch,
}

impl RecoveryMethod {
    pub fn is_success(&self) -> bool {
        matches!(self, RecoveryMethod::Recovered(_))
    }
}

impl std::fmt::Display for RecoveryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoveryMethod::Recovered(strategies) => {
                let joined: Vec<&str> = strategies.iter().map(|s| s.as_str()).collect();
                f.write_str(&joined.join("+"))
            }
            RecoveryMethod::Failed => f.write_str("failed"),
            RecoveryMethod::NoVisualMatch => f.write_str("no_visual_match"),
        }
    }
}

/// Result of one recovery call. Always produced, even when nothing matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryResult {
    /// Never empty. A failed recovery reports the partial text exactly as
    /// given, or [`UNRECOGNIZED_TEXT`] when it is blank.
    pub recovered_text: String,
    /// 0.0-1.0
    pub confidence: f32,
    pub method: RecoveryMethod,
    /// Next-best merged candidates, best first
    pub alternatives: Vec<MatchCandidate>,
    /// Strategies actually executed, in order
    pub strategies_run: Vec<RecoveryStrategy>,
    /// Whether remaining strategies were skipped after a confident candidate
    pub early_exit: bool,
}

impl RecoveryResult {
    pub fn is_success(&self) -> bool {
        self.method.is_success()
    }

    /// What the consumer should do with this result
    pub fn recommended_action(&self) -> RecommendedAction {
        if self.is_success() {
            RecommendedAction::for_confidence(self.confidence)
        } else {
            RecommendedAction::Rescan
        }
    }
}
