//! # Similarity Scorer
//!
//! Confidence-weighted aggregate of per-family similarities between two
//! feature sets.

use serde::{Deserialize, Serialize};

use crate::features::{FeatureFamily, FeatureSet};

use super::compare::compare_vectors;

/// Aggregate weight of each family
pub fn family_weight(family: FeatureFamily) -> f32 {
    match family {
        FeatureFamily::Keypoint => 0.25,
        FeatureFamily::TextLayout => 0.25,
        FeatureFamily::Color => 0.20,
        FeatureFamily::Edge => 0.15,
        FeatureFamily::Shape => 0.10,
        FeatureFamily::Texture => 0.05,
        FeatureFamily::BasicStats => 0.05,
    }
}

/// Contribution of one family to an aggregate score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyScore {
    pub family: FeatureFamily,
    /// Raw similarity of the two vectors
    pub similarity: f32,
    /// Mean of the two vectors' confidences
    pub confidence: f32,
    pub weight: f32,
}

/// Compares feature sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityScorer;

impl SimilarityScorer {
    pub fn new() -> Self {
        Self
    }

    /// Per-family scores for the families present in both sets, in family
    /// order.
    pub fn breakdown(&self, query: &FeatureSet, reference: &FeatureSet) -> Vec<FamilyScore> {
        query
            .iter()
            .filter_map(|q| {
                let r = reference.get(q.family)?;
                Some(FamilyScore {
                    family: q.family,
                    similarity: compare_vectors(q, r),
                    confidence: (q.confidence + r.confidence) / 2.0,
                    weight: family_weight(q.family),
                })
            })
            .collect()
    }

    /// `sum(similarity * mean confidence * weight) / sum(weight)` over the
    /// families both sets carry. Sets with no family in common score 0.
    pub fn score(&self, query: &FeatureSet, reference: &FeatureSet) -> f32 {
        let breakdown = self.breakdown(query, reference);
        let total_weight: f32 = breakdown.iter().map(|s| s.weight).sum();
        if total_weight <= 0.0 {
            return 0.0;
        }

        let weighted: f32 = breakdown
            .iter()
            .map(|s| s.similarity * s.confidence * s.weight)
            .sum();
        let score = (weighted / total_weight).clamp(0.0, 1.0);

        tracing::trace!(
            target: "similarity",
            families = breakdown.len(),
            score,
            "Feature sets compared"
        );
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureVector;

    fn stats(values: [f32; 3], confidence: f32) -> FeatureVector {
        FeatureVector::new(FeatureFamily::BasicStats, values.to_vec(), confidence, "basic_stats")
    }

    #[test]
    fn test_weights_sum() {
        let total: f32 = FeatureFamily::DESCRIPTOR_FAMILIES
            .iter()
            .map(|f| family_weight(*f))
            .sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_disjoint_sets_score_zero() {
        let a: FeatureSet = vec![stats([0.5, 0.1, 1.0], 0.5)].into_iter().collect();
        let b: FeatureSet = vec![FeatureVector::new(FeatureFamily::Texture, vec![0.0; 256], 0.5, "lbp_8_1")]
            .into_iter()
            .collect();
        assert_eq!(SimilarityScorer::new().score(&a, &b), 0.0);
        assert_eq!(SimilarityScorer::new().score(&a, &FeatureSet::new()), 0.0);
    }

    #[test]
    fn test_score_is_confidence_weighted() {
        let a: FeatureSet = vec![stats([0.5, 0.1, 1.0], 1.0)].into_iter().collect();
        let b: FeatureSet = vec![stats([0.5, 0.1, 1.0], 0.5)].into_iter().collect();
        let score = SimilarityScorer::new().score(&a, &b);
        assert!((score - 0.75).abs() < 1e-6);
    }
}
