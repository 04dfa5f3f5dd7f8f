//! # Basic Statistics Fallback
//!
//! Brightness, contrast and aspect ratio. Defined for every image,
//! including empty ones, so a feature set is never empty.

use image::DynamicImage;

use super::prepared::luma;
use super::types::{FeatureFamily, FeatureVector};

pub const METHOD: &str = "basic_stats";

/// Fixed confidence of the fallback vector.
pub const BASIC_STATS_CONFIDENCE: f32 = 0.5;

/// `[mean brightness / 255, brightness std / 255, width / height]`.
///
/// An empty image yields zero brightness and contrast. A zero height
/// reports an aspect ratio of 1.
pub fn basic_stats(image: &DynamicImage) -> FeatureVector {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let count = (width as usize) * (height as usize);

    let (mean, std_dev) = if count == 0 {
        (0.0, 0.0)
    } else {
        let values: Vec<f32> = rgb.pixels().map(|p| luma(p[0], p[1], p[2])).collect();
        let mean = values.iter().sum::<f32>() / count as f32;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / count as f32;
        (mean, variance.sqrt())
    };

    let aspect = if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    };

    FeatureVector::new(
        FeatureFamily::BasicStats,
        vec![mean / 255.0, std_dev / 255.0, aspect],
        BASIC_STATS_CONFIDENCE,
        METHOD,
    )
}
