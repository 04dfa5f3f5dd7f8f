//! # Context-Aware Recovery
//!
//! Scores names the caller expects (for example from a prescription) and
//! recently recovered names against the partial text.

use serde::{Deserialize, Serialize};

use super::history::RecentResults;
use crate::fuzzy::algorithms::{edit_similarity, jaccard_similarity, normalize};
use crate::fuzzy::{Dictionary, MatchAlgorithm, MatchCandidate};

/// Discount applied to context similarities
pub const CONTEXT_FACTOR: f32 = 0.9;
/// Context candidates below this confidence are dropped
pub const CONTEXT_MIN_CONFIDENCE: f32 = 0.5;
/// Added when a candidate belongs to the expected category
pub const CATEGORY_BONUS: f32 = 0.05;

/// Caller-supplied hints for one recovery
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoveryContext {
    /// Names the package is likely to carry
    pub expected_names: Vec<String>,
    /// Drug class the package is likely to belong to
    pub expected_category: Option<String>,
}

impl RecoveryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_expected_names(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.expected_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_expected_category(mut self, category: impl Into<String>) -> Self {
        self.expected_category = Some(category.into());
        self
    }
}

/// Candidates from expected names, then from successful recent results
///
/// Each source is scored with the mean of edit and character-set
/// similarity, discounted by [`CONTEXT_FACTOR`]. Sources in the expected
/// category get [`CATEGORY_BONUS`].
pub fn context_candidates(
    partial_text: &str,
    context: &RecoveryContext,
    recent: &RecentResults,
    dictionary: &Dictionary,
) -> Vec<MatchCandidate> {
    let query = normalize(partial_text);
    if query.is_empty() {
        return Vec::new();
    }

    let expected_category = context
        .expected_category
        .as_deref()
        .map(normalize)
        .filter(|category| !category.is_empty());

    let expected = context
        .expected_names
        .iter()
        .map(|name| (name.as_str(), "expected_name"));
    // Newest first, so the most recent duplicate wins
    let remembered = recent
        .iter()
        .rev()
        .filter(|result| result.is_success())
        .map(|result| (result.recovered_text.as_str(), "recent_result"));

    let mut seen = std::collections::HashSet::new();
    let mut candidates = Vec::new();

    for (source, field) in expected.chain(remembered) {
        let normalized = normalize(source);
        if normalized.is_empty() || !seen.insert(normalized.clone()) {
            continue;
        }

        let similarity =
            (edit_similarity(&query, &normalized) + jaccard_similarity(&query, &normalized)) / 2.0;
        let mut confidence = similarity * CONTEXT_FACTOR;
        if confidence < CONTEXT_MIN_CONFIDENCE {
            continue;
        }

        if let Some(category) = &expected_category {
            if dictionary.category_of(&normalized) == *category {
                confidence += CATEGORY_BONUS;
            }
        }

        candidates.push(MatchCandidate::new(
            source.trim(),
            confidence,
            MatchAlgorithm::Context,
            field,
        ));
    }

    candidates
}
