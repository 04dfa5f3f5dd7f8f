//! # Feature Similarity
//!
//! Per-family comparison functions and the weighted scorer built on them.

pub mod compare;
pub mod scorer;

pub use compare::{
    chi_square_similarity, compare_vectors, cosine_similarity, edge_similarity,
    histogram_intersection, keypoint_similarity, shape_similarity, text_layout_similarity,
};
pub use scorer::{family_weight, FamilyScore, SimilarityScorer};
