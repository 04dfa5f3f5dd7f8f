//! # Visual Feature Extraction
//!
//! Turns a package photo into a set of independent descriptor families
//! that the similarity scorer can compare.

pub mod basic_stats;
pub mod color;
pub mod edge;
pub mod extractor;
pub mod keypoint;
pub mod prepared;
pub mod shape;
pub mod text_layout;
pub mod texture;
pub mod types;

pub use basic_stats::basic_stats;
pub use extractor::{FeatureConfig, FeatureExtractor};
pub use keypoint::keypoint_count;
pub use prepared::PreparedImage;
pub use shape::contour_count;
pub use types::{
    FeatureError, FeatureFamily, FeatureSet, FeatureVector, COLOR_BINS, CONTOUR_FEATURE_LEN,
    KEYPOINT_DESCRIPTOR_LEN, MAX_CONTOURS, MAX_KEYPOINTS,
};
