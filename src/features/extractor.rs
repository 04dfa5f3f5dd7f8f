//! # Feature Extractor
//!
//! Runs every descriptor family over one image. Each family is computed
//! independently: a family that fails is dropped from the set, and when
//! anything was dropped the basic-statistics fallback is added so that
//! callers always receive a non-empty set.

use std::time::Instant;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::errors::{error_logging, AppError, AppResult};
use crate::observability::metrics::{record_extraction_metrics, record_family_failure};

use super::basic_stats::basic_stats;
use super::color::extract_color;
use super::edge::extract_edge;
use super::keypoint::extract_keypoints;
use super::prepared::{PreparedImage, MAX_SOBEL_MAGNITUDE};
use super::shape::extract_shape;
use super::text_layout::extract_text_layout;
use super::texture::extract_texture;
use super::types::{FeatureError, FeatureFamily, FeatureSet, FeatureVector};

/// Tunables shared by the descriptor families
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Sobel magnitude above which a pixel counts as an edge
    pub edge_threshold: f32,
    /// Smallest image side any family will work on
    pub min_dimension: u32,
    /// Darkness below the local mean for a pixel to count as text ink
    pub adaptive_offset: f32,
    /// Sample every n-th row and column for texture codes
    pub texture_sample_stride: u32,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            edge_threshold: 100.0,
            min_dimension: 8,
            adaptive_offset: 5.0,
            texture_sample_stride: 1,
        }
    }
}

impl FeatureConfig {
    /// Validate feature configuration
    pub fn validate(&self) -> AppResult<()> {
        if !self.edge_threshold.is_finite() || self.edge_threshold < 0.0 {
            return Err(AppError::Config(
                "Edge threshold must be a non-negative number".to_string(),
            ));
        }

        if self.edge_threshold >= MAX_SOBEL_MAGNITUDE {
            return Err(AppError::Config(format!(
                "Edge threshold must be below the maximum Sobel magnitude ({:.1})",
                MAX_SOBEL_MAGNITUDE
            )));
        }

        // Gradients need a full 3x3 neighborhood
        if self.min_dimension < 3 {
            return Err(AppError::Config(
                "Minimum dimension must be at least 3 pixels".to_string(),
            ));
        }

        if !self.adaptive_offset.is_finite() || !(0.0..=255.0).contains(&self.adaptive_offset) {
            return Err(AppError::Config(
                "Adaptive threshold offset must be between 0 and 255".to_string(),
            ));
        }

        if self.texture_sample_stride == 0 {
            return Err(AppError::Config(
                "Texture sample stride cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Computes feature sets from raster images.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: FeatureConfig,
}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor after validating `config`.
    pub fn with_config(config: FeatureConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Extract every descriptor family from `image`.
    ///
    /// Never fails: malformed or tiny images produce a set holding only the
    /// basic-statistics fallback. The result is a pure function of the
    /// pixels and the configuration.
    pub fn extract(&self, image: &DynamicImage) -> FeatureSet {
        let start = Instant::now();
        let prepared = PreparedImage::new(image);
        let dimensions = (prepared.width, prepared.height);

        let mut set = FeatureSet::new();
        let mut failed = 0usize;

        for family in FeatureFamily::DESCRIPTOR_FAMILIES {
            match self.extract_family(&prepared, family) {
                Ok(vector) => {
                    set.insert(vector);
                }
                Err(err) => {
                    failed += 1;
                    error_logging::log_extraction_error(&err, family.as_str(), dimensions);
                    record_family_failure(family.as_str());
                }
            }
        }

        if failed > 0 {
            set.insert(basic_stats(image));
        }

        let duration = start.elapsed();
        record_extraction_metrics(duration, set.len(), failed);
        tracing::debug!(
            target: "feature_extraction",
            width = dimensions.0,
            height = dimensions.1,
            families = set.len(),
            failed,
            duration_ms = duration.as_millis(),
            "Feature extraction completed"
        );

        set
    }

    /// Compute a single family, without the fallback.
    pub fn extract_family(
        &self,
        prepared: &PreparedImage,
        family: FeatureFamily,
    ) -> Result<FeatureVector, FeatureError> {
        let config = &self.config;
        match family {
            FeatureFamily::Color => extract_color(prepared, config.min_dimension),
            FeatureFamily::Edge => extract_edge(prepared, config.min_dimension, config.edge_threshold),
            FeatureFamily::Keypoint => {
                extract_keypoints(prepared, config.min_dimension, config.edge_threshold)
            }
            FeatureFamily::TextLayout => {
                extract_text_layout(prepared, config.min_dimension, config.adaptive_offset)
            }
            FeatureFamily::Shape => extract_shape(prepared, config.min_dimension, config.edge_threshold),
            FeatureFamily::Texture => {
                extract_texture(prepared, config.min_dimension, config.texture_sample_stride)
            }
            FeatureFamily::BasicStats => Ok(basic_stats(&DynamicImage::ImageRgb8(prepared.rgb.clone()))),
        }
    }
}
