//! # Per-Family Comparison Functions
//!
//! Every function maps two vectors of the same family to a similarity in
//! [0, 1] and returns exactly 1.0 when a vector is compared with itself.

use crate::features::{
    contour_count, keypoint_count, FeatureFamily, FeatureVector, CONTOUR_FEATURE_LEN,
    KEYPOINT_DESCRIPTOR_LEN,
};

/// Guards divisions in relative differences.
const EPSILON: f32 = 1e-6;

/// Keypoint pairs whose similarity is not above this are ignored.
const KEYPOINT_MATCH_FLOOR: f32 = 0.7;

/// Text layout weights for top, center, bottom, left, right, density and
/// mean block size. The block count is not compared.
const TEXT_LAYOUT_WEIGHTS: [f32; 7] = [0.15, 0.25, 0.15, 0.15, 0.15, 0.10, 0.05];

/// Shape weights for area, perimeter, circularity and aspect ratio.
const CONTOUR_WEIGHTS: [f32; CONTOUR_FEATURE_LEN] = [0.3, 0.2, 0.3, 0.2];

/// Compare two vectors with the function dedicated to their family.
///
/// Vectors whose length does not match their family, or whose families
/// differ, fall back to cosine similarity.
pub fn compare_vectors(query: &FeatureVector, reference: &FeatureVector) -> f32 {
    if query.family != reference.family || !query.has_expected_len() || !reference.has_expected_len() {
        return cosine_similarity(&query.values, &reference.values);
    }

    let (q, r) = (query.values.as_slice(), reference.values.as_slice());
    let similarity = match query.family {
        FeatureFamily::Color => chi_square_similarity(q, r),
        FeatureFamily::Edge => edge_similarity(q, r),
        FeatureFamily::Keypoint => keypoint_similarity(q, r),
        FeatureFamily::TextLayout => text_layout_similarity(q, r),
        FeatureFamily::Shape => shape_similarity(q, r),
        FeatureFamily::Texture => histogram_intersection(q, r),
        FeatureFamily::BasicStats => cosine_similarity(q, r),
    };
    similarity.clamp(0.0, 1.0)
}

/// `1 / (1 + chi_square)` where bins empty on both sides are skipped.
pub fn chi_square_similarity(a: &[f32], b: &[f32]) -> f32 {
    let chi_square: f32 = a
        .iter()
        .zip(b.iter())
        .filter(|(x, y)| *x + *y > 0.0)
        .map(|(x, y)| (x - y).powi(2) / (x + y))
        .sum();
    1.0 / (1.0 + chi_square)
}

/// Sum of bin-wise minima over the larger of the two masses.
///
/// Two empty histograms are identical.
pub fn histogram_intersection(a: &[f32], b: &[f32]) -> f32 {
    let mass = a.iter().sum::<f32>().max(b.iter().sum::<f32>());
    if mass <= 0.0 {
        return 1.0;
    }
    let overlap: f32 = a.iter().zip(b.iter()).map(|(x, y)| x.min(*y)).sum();
    (overlap / mass).clamp(0.0, 1.0)
}

/// Cosine of the angle between two vectors, clipped to [0, 1].
///
/// Two zero vectors are identical; one zero vector matches nothing.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    match (norm_a > 0.0, norm_b > 0.0) {
        (false, false) => 1.0,
        (true, true) => {
            if a == b {
                1.0
            } else {
                (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
            }
        }
        _ => 0.0,
    }
}

/// `1 - |a - b| / max(a, b)`, which is 1.0 when both are zero.
pub fn relative_similarity(a: f32, b: f32) -> f32 {
    let scale = a.abs().max(b.abs()).max(EPSILON);
    (1.0 - (a - b).abs() / scale).clamp(0.0, 1.0)
}

/// 60% the mean relative similarity of density, mean and max magnitude,
/// 40% orientation histogram intersection.
pub fn edge_similarity(a: &[f32], b: &[f32]) -> f32 {
    let scalars = (0..3).map(|i| relative_similarity(a[i], b[i])).sum::<f32>() / 3.0;
    let orientation = histogram_intersection(&a[3..], &b[3..]);
    (0.6 * scalars + 0.4 * orientation).min(1.0)
}

/// Average best-match similarity of the query's keypoint descriptors.
///
/// Each query descriptor is paired with its nearest reference descriptor
/// (Euclidean distance `d`, similarity `1 / (1 + d)`); only pairs above the
/// match floor count. No keypoints on either side is a perfect match, and
/// keypoints on one side only match nothing.
pub fn keypoint_similarity(a: &[f32], b: &[f32]) -> f32 {
    let query = descriptors(a, keypoint_count(a));
    let reference = descriptors(b, keypoint_count(b));

    match (query.is_empty(), reference.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        (false, false) => {}
    }

    let kept: Vec<f32> = query
        .iter()
        .filter_map(|q| {
            let nearest = reference
                .iter()
                .map(|r| euclidean(q, r))
                .fold(f32::INFINITY, f32::min);
            let similarity = 1.0 / (1.0 + nearest);
            (similarity > KEYPOINT_MATCH_FLOOR).then_some(similarity)
        })
        .collect();

    if kept.is_empty() {
        0.0
    } else {
        kept.iter().sum::<f32>() / kept.len() as f32
    }
}

fn descriptors(values: &[f32], count: usize) -> Vec<&[f32]> {
    (0..count)
        .map(|slot| {
            let start = 1 + slot * KEYPOINT_DESCRIPTOR_LEN;
            &values[start..start + KEYPOINT_DESCRIPTOR_LEN]
        })
        .collect()
}

fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        .sqrt()
}

/// Weighted relative similarity of the region ratios, density and mean
/// block size.
pub fn text_layout_similarity(a: &[f32], b: &[f32]) -> f32 {
    let total: f32 = TEXT_LAYOUT_WEIGHTS.iter().sum();
    TEXT_LAYOUT_WEIGHTS
        .iter()
        .enumerate()
        .map(|(i, w)| w * relative_similarity(a[i], b[i]))
        .sum::<f32>()
        / total
}

/// Average over query contours of the best weighted match among the
/// reference contours. Contour-free images match each other perfectly.
pub fn shape_similarity(a: &[f32], b: &[f32]) -> f32 {
    let query = contours(a);
    let reference = contours(b);

    match (query.is_empty(), reference.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        (false, false) => {}
    }

    let total: f32 = query
        .iter()
        .map(|q| {
            reference
                .iter()
                .map(|r| contour_similarity(q, r))
                .fold(0.0, f32::max)
        })
        .sum();
    total / query.len() as f32
}

fn contours(values: &[f32]) -> Vec<&[f32]> {
    (0..contour_count(values))
        .map(|slot| {
            let start = 1 + slot * CONTOUR_FEATURE_LEN;
            &values[start..start + CONTOUR_FEATURE_LEN]
        })
        .collect()
}

fn contour_similarity(a: &[f32], b: &[f32]) -> f32 {
    let total: f32 = CONTOUR_WEIGHTS.iter().sum();
    CONTOUR_WEIGHTS
        .iter()
        .enumerate()
        .map(|(i, w)| w * relative_similarity(a[i], b[i]))
        .sum::<f32>()
        / total
}
