//! # Keypoint Descriptor
//!
//! A simplified multi-scale keypoint scheme. It borrows the shape of SIFT
//! (a scale pyramid and extrema across adjacent scales) but none of its
//! invariance guarantees.
//!
//! The pyramid has `OCTAVES` octaves of `LEVELS` levels. Each level is a
//! 3x3 box blur of the previous one, and every octave after the first
//! starts from the previous octave's last level downsampled by two. Each
//! level contributes a response plane (the level minus its own box blur,
//! scaled by the level's ordinal so coarser levels are comparable). A
//! keypoint is a strict extremum of the middle response over its 3x3x3
//! neighborhood where the strongest Sobel magnitude in its 3x3 patch
//! exceeds the edge threshold.
//!
//! Each keypoint is described by the means of the sixteen 4x4 blocks of
//! the 16x16 window centered on it, scaled to [0, 1].

use image::imageops::{self, FilterType};
use image::GrayImage;
use imageproc::filter::box_filter;

use super::prepared::{GradientField, PreparedImage};
use super::types::{FeatureError, FeatureFamily, FeatureVector, KEYPOINT_DESCRIPTOR_LEN, MAX_KEYPOINTS};

pub const METHOD: &str = "box_pyramid_extrema";

const OCTAVES: usize = 4;
const LEVELS: usize = 3;
const WINDOW: u32 = 16;
const BLOCK: u32 = 4;
const HALF_WINDOW: u32 = WINDOW / 2;
/// Smallest octave side that still fits a descriptor window plus the 3x3 check.
const MIN_OCTAVE_SIDE: u32 = WINDOW + 2;

#[derive(Debug, Clone)]
struct Keypoint {
    octave: usize,
    x: u32,
    y: u32,
    strength: f32,
    descriptor: [f32; KEYPOINT_DESCRIPTOR_LEN],
}

/// Detect keypoints and emit `[count, MAX_KEYPOINTS x 16 descriptor values]`.
///
/// The strongest `MAX_KEYPOINTS` keypoints are kept and unused slots are
/// zero. Confidence is the number of kept keypoints per 10,000 pixels of
/// the original image, clipped to [0, 1].
pub fn extract_keypoints(
    prepared: &PreparedImage,
    min_dimension: u32,
    edge_threshold: f32,
) -> Result<FeatureVector, FeatureError> {
    prepared.ensure_min_dimension(FeatureFamily::Keypoint, min_dimension)?;

    let mut keypoints = Vec::new();
    let mut base = prepared.gray.clone();

    for octave in 0..OCTAVES {
        if base.width() < MIN_OCTAVE_SIDE || base.height() < MIN_OCTAVE_SIDE {
            break;
        }

        let levels = build_levels(&base);
        let responses: Vec<Vec<f32>> = levels
            .iter()
            .enumerate()
            .map(|(i, level)| response_plane(level, (i + 1) as f32))
            .collect();
        let gradients = GradientField::from_gray(&levels[1]);

        detect_extrema(octave, &levels[1], &responses, &gradients, edge_threshold, &mut keypoints);

        let last = &levels[LEVELS - 1];
        base = imageops::resize(last, last.width() / 2, last.height() / 2, FilterType::Triangle);
    }

    keypoints.sort_by(|a, b| {
        b.strength
            .partial_cmp(&a.strength)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.octave.cmp(&b.octave))
            .then(a.y.cmp(&b.y))
            .then(a.x.cmp(&b.x))
    });
    let detected = keypoints.len();
    keypoints.truncate(MAX_KEYPOINTS);

    let mut values = vec![0f32; FeatureFamily::Keypoint.expected_len()];
    values[0] = keypoints.len() as f32;
    for (slot, keypoint) in keypoints.iter().enumerate() {
        let start = 1 + slot * KEYPOINT_DESCRIPTOR_LEN;
        values[start..start + KEYPOINT_DESCRIPTOR_LEN].copy_from_slice(&keypoint.descriptor);
    }

    let confidence = keypoints.len() as f32 / (prepared.pixel_count() as f32 / 10_000.0);

    tracing::trace!(
        target: "feature_extraction",
        detected,
        kept = keypoints.len(),
        "Keypoints detected"
    );

    FeatureVector::new(FeatureFamily::Keypoint, values, confidence, METHOD).ensure_finite()
}

/// Number of keypoints encoded in a keypoint vector's header
pub fn keypoint_count(values: &[f32]) -> usize {
    values
        .first()
        .map(|&count| (count.max(0.0) as usize).min(MAX_KEYPOINTS))
        .unwrap_or(0)
}

fn build_levels(base: &GrayImage) -> Vec<GrayImage> {
    let mut levels = Vec::with_capacity(LEVELS);
    levels.push(base.clone());
    for i in 1..LEVELS {
        let blurred = box_filter(&levels[i - 1], 1, 1);
        levels.push(blurred);
    }
    levels
}

fn response_plane(level: &GrayImage, scale: f32) -> Vec<f32> {
    let blurred = box_filter(level, 1, 1);
    level
        .as_raw()
        .iter()
        .zip(blurred.as_raw().iter())
        .map(|(&v, &b)| (v as f32 - b as f32) * scale)
        .collect()
}

fn strongest_gradient(gradients: &GradientField, x: u32, y: u32) -> f32 {
    let mut strongest = 0f32;
    for ny in y - 1..=y + 1 {
        for nx in x - 1..=x + 1 {
            strongest = strongest.max(gradients.magnitude_at(nx, ny));
        }
    }
    strongest
}

fn detect_extrema(
    octave: usize,
    level: &GrayImage,
    responses: &[Vec<f32>],
    gradients: &GradientField,
    edge_threshold: f32,
    out: &mut Vec<Keypoint>,
) {
    let (width, height) = level.dimensions();
    let index = |x: u32, y: u32| (y * width + x) as usize;

    for y in HALF_WINDOW..height - HALF_WINDOW {
        for x in HALF_WINDOW..width - HALF_WINDOW {
            let value = responses[1][index(x, y)];
            if value == 0.0 {
                continue;
            }

            let mut is_max = true;
            let mut is_min = true;
            'neighborhood: for plane in responses {
                for dy in -1i32..=1 {
                    for dx in -1i32..=1 {
                        let nx = (x as i32 + dx) as u32;
                        let ny = (y as i32 + dy) as u32;
                        if std::ptr::eq(plane, &responses[1]) && nx == x && ny == y {
                            continue;
                        }
                        let neighbor = plane[index(nx, ny)];
                        if neighbor >= value {
                            is_max = false;
                        }
                        if neighbor <= value {
                            is_min = false;
                        }
                        if !is_max && !is_min {
                            break 'neighborhood;
                        }
                    }
                }
            }

            if !(is_max || is_min) || strongest_gradient(gradients, x, y) <= edge_threshold {
                continue;
            }

            out.push(Keypoint {
                octave,
                x,
                y,
                strength: value.abs(),
                descriptor: describe(level, x, y),
            });
        }
    }
}

fn describe(level: &GrayImage, x: u32, y: u32) -> [f32; KEYPOINT_DESCRIPTOR_LEN] {
    let mut descriptor = [0f32; KEYPOINT_DESCRIPTOR_LEN];
    let origin_x = x - HALF_WINDOW;
    let origin_y = y - HALF_WINDOW;
    let blocks_per_row = WINDOW / BLOCK;

    for by in 0..blocks_per_row {
        for bx in 0..blocks_per_row {
            let mut sum = 0f32;
            for py in 0..BLOCK {
                for px in 0..BLOCK {
                    sum += level.get_pixel(origin_x + bx * BLOCK + px, origin_y + by * BLOCK + py)[0] as f32;
                }
            }
            descriptor[(by * blocks_per_row + bx) as usize] = sum / (BLOCK * BLOCK) as f32 / 255.0;
        }
    }
    descriptor
}
