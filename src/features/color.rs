//! # Color Histogram Descriptor
//!
//! Quantizes each RGB channel into `COLOR_BINS` bins and concatenates the
//! three per-channel histograms, each normalized by the pixel count.

use super::prepared::PreparedImage;
use super::types::{FeatureError, FeatureFamily, FeatureVector, COLOR_BINS};

pub const METHOD: &str = "rgb_histogram_64";

/// Compute the 3 x `COLOR_BINS` color histogram.
///
/// Confidence is the spread of each channel's intensity distribution (the
/// standard deviation of bin indices weighted by the normalized histogram),
/// relative to the widest possible spread and averaged over channels. A
/// package photographed against a single flat color scores near zero.
pub fn extract_color(
    prepared: &PreparedImage,
    min_dimension: u32,
) -> Result<FeatureVector, FeatureError> {
    prepared.ensure_min_dimension(FeatureFamily::Color, min_dimension)?;

    let mut histogram = vec![0f32; 3 * COLOR_BINS];
    for pixel in prepared.rgb.pixels() {
        for channel in 0..3 {
            let bin = pixel[channel] as usize * COLOR_BINS / 256;
            histogram[channel * COLOR_BINS + bin] += 1.0;
        }
    }

    let total = prepared.pixel_count() as f32;
    for value in histogram.iter_mut() {
        *value /= total;
    }

    let confidence = (0..3)
        .map(|channel| channel_spread(&histogram[channel * COLOR_BINS..(channel + 1) * COLOR_BINS]))
        .sum::<f32>()
        / 3.0;

    FeatureVector::new(FeatureFamily::Color, histogram, confidence, METHOD).ensure_finite()
}

/// Standard deviation of bin indices under `channel`, divided by half the
/// bin range and clipped to [0, 1].
fn channel_spread(channel: &[f32]) -> f32 {
    let mass: f32 = channel.iter().sum();
    if mass <= 0.0 {
        return 0.0;
    }
    let mean = channel
        .iter()
        .enumerate()
        .map(|(i, p)| i as f32 * p)
        .sum::<f32>()
        / mass;
    let variance = channel
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f32 - mean).powi(2) * p)
        .sum::<f32>()
        / mass;

    (variance.sqrt() / (COLOR_BINS as f32 / 2.0)).clamp(0.0, 1.0)
}
