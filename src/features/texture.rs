//! # Texture Descriptor
//!
//! 8-neighbor local binary patterns over the grayscale plane.

use super::prepared::PreparedImage;
use super::types::{FeatureError, FeatureFamily, FeatureVector, LBP_BINS};

pub const METHOD: &str = "lbp_8_1";

/// Neighbor offsets, clockwise from the top-left corner. Bit `i` of a code
/// is set when neighbor `i` is at least as bright as the center.
const RING: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
];

/// Compute the 256-bin LBP histogram over interior pixels, sampling every
/// `stride`-th row and column. Confidence is the histogram's Shannon
/// entropy in bits divided by 8.
pub fn extract_texture(
    prepared: &PreparedImage,
    min_dimension: u32,
    stride: u32,
) -> Result<FeatureVector, FeatureError> {
    prepared.ensure_min_dimension(FeatureFamily::Texture, min_dimension)?;
    if prepared.width < 3 || prepared.height < 3 {
        return Err(FeatureError::Degenerate {
            family: FeatureFamily::Texture,
            reason: "no interior pixels".to_string(),
        });
    }

    let gray = &prepared.gray;
    let step = stride.max(1) as usize;
    let mut histogram = vec![0f32; LBP_BINS];
    let mut sampled = 0usize;

    for y in (1..prepared.height - 1).step_by(step) {
        for x in (1..prepared.width - 1).step_by(step) {
            let center = gray.get_pixel(x, y)[0];
            let mut code = 0usize;
            for (bit, (dx, dy)) in RING.iter().enumerate() {
                let neighbor = gray.get_pixel((x as i32 + dx) as u32, (y as i32 + dy) as u32)[0];
                if neighbor >= center {
                    code |= 1 << bit;
                }
            }
            histogram[code] += 1.0;
            sampled += 1;
        }
    }

    for bin in histogram.iter_mut() {
        *bin /= sampled as f32;
    }

    let entropy: f32 = histogram
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| -p * p.log2())
        .sum();

    FeatureVector::new(FeatureFamily::Texture, histogram, entropy / 8.0, METHOD).ensure_finite()
}
