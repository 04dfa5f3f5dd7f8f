//! Match candidates shared by the fuzzy matcher and the recovery strategies.

use serde::{Deserialize, Serialize};

/// Algorithm that produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchAlgorithm {
    Exact,
    BrandAlias,
    Levenshtein,
    Jaccard,
    Phonetic,
    PartialWord,
    Prefix,
    Pattern,
    VisualSimilarity,
    Context,
    CharRestoration,
    Ocr,
}

impl MatchAlgorithm {
    /// Tag recorded on candidates
    pub fn tag(&self) -> &'static str {
        match self {
            MatchAlgorithm::Exact => "exact",
            MatchAlgorithm::BrandAlias => "brand_alias",
            MatchAlgorithm::Levenshtein => "levenshtein",
            MatchAlgorithm::Jaccard => "jaccard",
            MatchAlgorithm::Phonetic => "phonetic",
            MatchAlgorithm::PartialWord => "partial_word",
            MatchAlgorithm::Prefix => "prefix",
            MatchAlgorithm::Pattern => "pattern",
            MatchAlgorithm::VisualSimilarity => "visual_similarity",
            MatchAlgorithm::Context => "context",
            MatchAlgorithm::CharRestoration => "char_restoration",
            MatchAlgorithm::Ocr => "ocr",
        }
    }
}

impl std::fmt::Display for MatchAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A proposed label for the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub label: String,
    /// 0.0-1.0
    pub confidence: f32,
    /// Producing algorithm tag, or several joined with `+` after merging
    pub algorithm: String,
    /// Which field of the source record matched (name, brand, generic...)
    pub matched_field: String,
}

impl MatchCandidate {
    pub fn new(
        label: impl Into<String>,
        confidence: f32,
        algorithm: MatchAlgorithm,
        matched_field: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            confidence: if confidence.is_finite() {
                confidence.clamp(0.0, 1.0)
            } else {
                0.0
            },
            algorithm: algorithm.tag().to_string(),
            matched_field: matched_field.into(),
        }
    }

    /// Tags that contributed to this candidate
    pub fn algorithms(&self) -> impl Iterator<Item = &str> {
        self.algorithm.split('+')
    }
}
