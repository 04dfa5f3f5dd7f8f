//! Recovery strategies and the modes that order them.

use serde::{Deserialize, Serialize};

/// One method of producing name candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecoveryStrategy {
    /// Re-run the OCR provider and fuzzy match its text
    EnhancedOcr,
    /// Complete prefixes and wildcards against the dictionary
    PatternCompletion,
    /// Look the package up in the visual index
    VisualSimilarity,
    /// Compare against expected names and recent results
    ContextAware,
    /// Undo common OCR character confusions
    MlCharacterRestoration,
}

impl RecoveryStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryStrategy::EnhancedOcr => "enhanced_ocr",
            RecoveryStrategy::PatternCompletion => "pattern_completion",
            RecoveryStrategy::VisualSimilarity => "visual_similarity",
            RecoveryStrategy::ContextAware => "context_aware",
            RecoveryStrategy::MlCharacterRestoration => "ml_character_restoration",
        }
    }
}

impl std::fmt::Display for RecoveryStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which strategies run, and in what order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecoveryMode {
    Fast,
    #[default]
    Balanced,
    Comprehensive,
    VisualOnly,
}

impl RecoveryMode {
    /// Fixed priority order of this mode's strategies
    pub fn strategies(&self) -> &'static [RecoveryStrategy] {
        use RecoveryStrategy::*;
        match self {
            RecoveryMode::Fast => &[PatternCompletion, EnhancedOcr],
            RecoveryMode::Balanced => &[EnhancedOcr, PatternCompletion, VisualSimilarity, ContextAware],
            RecoveryMode::Comprehensive => &[
                EnhancedOcr,
                PatternCompletion,
                VisualSimilarity,
                ContextAware,
                MlCharacterRestoration,
            ],
            RecoveryMode::VisualOnly => &[VisualSimilarity, EnhancedOcr],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryMode::Fast => "fast",
            RecoveryMode::Balanced => "balanced",
            RecoveryMode::Comprehensive => "comprehensive",
            RecoveryMode::VisualOnly => "visual_only",
        }
    }
}

impl std::fmt::Display for RecoveryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
