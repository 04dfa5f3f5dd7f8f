//! # Shared Types for Feature Extraction
//!
//! Descriptor families, feature vectors and the per-image feature set, plus
//! the error raised when a single family cannot be computed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of histogram bins per color channel.
pub const COLOR_BINS: usize = 64;
/// Number of gradient orientation bins in the edge descriptor.
pub const ORIENTATION_BINS: usize = 8;
/// Maximum number of keypoints stored per image.
pub const MAX_KEYPOINTS: usize = 32;
/// Values per keypoint descriptor (4x4 blocks over a 16x16 window).
pub const KEYPOINT_DESCRIPTOR_LEN: usize = 16;
/// Number of text layout features.
pub const TEXT_LAYOUT_LEN: usize = 8;
/// Maximum number of contours stored per image.
pub const MAX_CONTOURS: usize = 16;
/// Values per contour (area, perimeter, circularity, aspect ratio).
pub const CONTOUR_FEATURE_LEN: usize = 4;
/// Number of local binary pattern codes.
pub const LBP_BINS: usize = 256;
/// Number of basic statistics values.
pub const BASIC_STATS_LEN: usize = 3;

/// One independently computed descriptor type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeatureFamily {
    /// Per-channel color histogram
    Color,
    /// Sobel edge statistics and orientation histogram
    Edge,
    /// Multi-scale extrema with block-averaged descriptors
    Keypoint,
    /// Adaptive-threshold text block layout
    TextLayout,
    /// Contour geometry over edge pixels
    Shape,
    /// Local binary pattern histogram
    Texture,
    /// Brightness, contrast and aspect ratio fallback
    BasicStats,
}

impl FeatureFamily {
    /// The six descriptor families computed by a full extraction, in
    /// extraction order. `BasicStats` is only added as a fallback.
    pub const DESCRIPTOR_FAMILIES: [FeatureFamily; 6] = [
        FeatureFamily::Color,
        FeatureFamily::Edge,
        FeatureFamily::Keypoint,
        FeatureFamily::TextLayout,
        FeatureFamily::Shape,
        FeatureFamily::Texture,
    ];

    /// Short lowercase name used in logs and metrics labels
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureFamily::Color => "color",
            FeatureFamily::Edge => "edge",
            FeatureFamily::Keypoint => "keypoint",
            FeatureFamily::TextLayout => "text_layout",
            FeatureFamily::Shape => "shape",
            FeatureFamily::Texture => "texture",
            FeatureFamily::BasicStats => "basic_stats",
        }
    }

    /// Length of `values` for every vector of this family.
    pub fn expected_len(&self) -> usize {
        match self {
            FeatureFamily::Color => 3 * COLOR_BINS,
            FeatureFamily::Edge => 3 + ORIENTATION_BINS,
            FeatureFamily::Keypoint => 1 + MAX_KEYPOINTS * KEYPOINT_DESCRIPTOR_LEN,
            FeatureFamily::TextLayout => TEXT_LAYOUT_LEN,
            FeatureFamily::Shape => 1 + MAX_CONTOURS * CONTOUR_FEATURE_LEN,
            FeatureFamily::Texture => LBP_BINS,
            FeatureFamily::BasicStats => BASIC_STATS_LEN,
        }
    }
}

impl std::fmt::Display for FeatureFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One descriptor family computed from one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Descriptor family
    pub family: FeatureFamily,
    /// Descriptor values, `family.expected_len()` long
    pub values: Vec<f32>,
    /// Family-specific quality estimate (0.0-1.0)
    pub confidence: f32,
    /// Tag identifying the exact algorithm variant
    pub method: String,
}

impl FeatureVector {
    /// Create a vector, clamping the confidence into [0, 1].
    pub fn new(family: FeatureFamily, values: Vec<f32>, confidence: f32, method: &str) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            family,
            values,
            confidence,
            method: method.to_string(),
        }
    }

    /// Whether `values` has the length every vector of this family shares
    pub fn has_expected_len(&self) -> bool {
        self.values.len() == self.family.expected_len()
    }

    /// Reject vectors carrying NaN or infinite values.
    pub(crate) fn ensure_finite(self) -> Result<Self, FeatureError> {
        if self.values.iter().all(|v| v.is_finite()) {
            Ok(self)
        } else {
            Err(FeatureError::NonFinite {
                family: self.family,
            })
        }
    }
}

/// Feature vectors extracted from one image, at most one per family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    vectors: BTreeMap<FeatureFamily, FeatureVector>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a vector, replacing any previous vector of the same family.
    pub fn insert(&mut self, vector: FeatureVector) -> Option<FeatureVector> {
        self.vectors.insert(vector.family, vector)
    }

    pub fn get(&self, family: FeatureFamily) -> Option<&FeatureVector> {
        self.vectors.get(&family)
    }

    pub fn contains(&self, family: FeatureFamily) -> bool {
        self.vectors.contains_key(&family)
    }

    /// Families present, in `FeatureFamily` order
    pub fn families(&self) -> Vec<FeatureFamily> {
        self.vectors.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureVector> {
        self.vectors.values()
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl FromIterator<FeatureVector> for FeatureSet {
    fn from_iter<T: IntoIterator<Item = FeatureVector>>(iter: T) -> Self {
        let mut set = FeatureSet::new();
        for vector in iter {
            set.insert(vector);
        }
        set
    }
}

/// Errors that make a single feature family unavailable.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureError {
    /// Image is smaller than the family's minimum working size
    ImageTooSmall {
        family: FeatureFamily,
        width: u32,
        height: u32,
        min_dimension: u32,
    },
    /// Computation produced NaN or infinite values
    NonFinite { family: FeatureFamily },
    /// Input cannot support the computation (e.g. empty buffer)
    Degenerate {
        family: FeatureFamily,
        reason: String,
    },
}

impl std::fmt::Display for FeatureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureError::ImageTooSmall {
                family,
                width,
                height,
                min_dimension,
            } => write!(
                f,
                "{} extraction needs at least {}x{} pixels, got {}x{}",
                family, min_dimension, min_dimension, width, height
            ),
            FeatureError::NonFinite { family } => {
                write!(f, "{} extraction produced non-finite values", family)
            }
            FeatureError::Degenerate { family, reason } => {
                write!(f, "{} extraction failed: {}", family, reason)
            }
        }
    }
}

impl std::error::Error for FeatureError {}
