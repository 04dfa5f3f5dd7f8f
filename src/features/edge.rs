//! # Edge Descriptor
//!
//! Sobel gradient statistics over the luma plane: edge density, mean and
//! max magnitude among edge pixels, and an orientation histogram.

use std::f32::consts::PI;

use super::prepared::{PreparedImage, MAX_SOBEL_MAGNITUDE};
use super::types::{FeatureError, FeatureFamily, FeatureVector, ORIENTATION_BINS};

pub const METHOD: &str = "sobel_3x3";

/// Compute `[density, mean magnitude, max magnitude, 8 orientation bins]`.
///
/// Magnitudes are divided by `MAX_SOBEL_MAGNITUDE`. Orientation bins are
/// normalized over edge pixels only and are all zero when no pixel exceeds
/// `edge_threshold`.
pub fn extract_edge(
    prepared: &PreparedImage,
    min_dimension: u32,
    edge_threshold: f32,
) -> Result<FeatureVector, FeatureError> {
    prepared.ensure_min_dimension(FeatureFamily::Edge, min_dimension)?;
    let gradients = prepared.gradients(FeatureFamily::Edge)?;

    let mut edge_count = 0usize;
    let mut magnitude_sum = 0f32;
    let mut magnitude_max = 0f32;
    let mut orientation = [0f32; ORIENTATION_BINS];

    for (i, &magnitude) in gradients.magnitude.iter().enumerate() {
        if magnitude <= edge_threshold {
            continue;
        }
        edge_count += 1;
        magnitude_sum += magnitude;
        magnitude_max = magnitude_max.max(magnitude);
        orientation[orientation_bin(gradients.gx[i], gradients.gy[i])] += 1.0;
    }

    let density = edge_count as f32 / prepared.pixel_count() as f32;
    let mean_magnitude = if edge_count > 0 {
        magnitude_sum / edge_count as f32 / MAX_SOBEL_MAGNITUDE
    } else {
        0.0
    };
    let max_magnitude = magnitude_max / MAX_SOBEL_MAGNITUDE;

    if edge_count > 0 {
        for bin in orientation.iter_mut() {
            *bin /= edge_count as f32;
        }
    }

    let mut values = Vec::with_capacity(FeatureFamily::Edge.expected_len());
    values.push(density);
    values.push(mean_magnitude);
    values.push(max_magnitude);
    values.extend_from_slice(&orientation);

    let confidence = 0.7 * density.min(1.0) + 0.3 * mean_magnitude.min(1.0);

    tracing::trace!(
        target: "feature_extraction",
        edge_pixels = edge_count,
        density,
        mean_magnitude,
        "Edge statistics computed"
    );

    FeatureVector::new(FeatureFamily::Edge, values, confidence, METHOD).ensure_finite()
}

/// Bin index of a gradient direction over the full circle.
fn orientation_bin(gx: f32, gy: f32) -> usize {
    let mut angle = gy.atan2(gx);
    if angle < 0.0 {
        angle += 2.0 * PI;
    }
    let bin = (angle / (2.0 * PI / ORIENTATION_BINS as f32)) as usize;
    bin.min(ORIENTATION_BINS - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};

    fn step_image() -> PreparedImage {
        let mut img = RgbImage::new(20, 20);
        for (x, _, pixel) in img.enumerate_pixels_mut() {
            *pixel = if x < 10 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) };
        }
        PreparedImage::new(&DynamicImage::ImageRgb8(img))
    }

    #[test]
    fn test_black_image_has_no_edges() {
        let prepared = PreparedImage::new(&DynamicImage::ImageRgb8(RgbImage::new(20, 20)));
        let vector = extract_edge(&prepared, 3, 100.0).unwrap();
        assert_eq!(vector.values.len(), 11);
        assert_eq!(vector.confidence, 0.0);
        assert!(vector.values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_step_edge_is_detected() {
        let vector = extract_edge(&step_image(), 3, 100.0).unwrap();
        let density = vector.values[0];
        // Two columns straddle the step
        assert!((density - 0.1).abs() < 1e-4);
        let orientation_sum: f32 = vector.values[3..].iter().sum();
        assert!((orientation_sum - 1.0).abs() < 1e-4);
        assert!(vector.confidence > 0.0);
    }

    #[test]
    fn test_orientation_bins_cover_circle() {
        assert_eq!(orientation_bin(1.0, 0.0), 0);
        assert_eq!(orientation_bin(0.0, 1.0), 2);
        assert_eq!(orientation_bin(-1.0, 0.0), 4);
        assert_eq!(orientation_bin(0.0, -1.0), 6);
    }
}
