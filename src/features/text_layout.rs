//! # Text Layout Descriptor
//!
//! Finds text-like blocks on a package face and summarizes where they sit.
//!
//! The grayscale plane is binarized with an adaptive threshold: a pixel is
//! ink when it is darker than the mean of its 15x15 neighborhood by more
//! than a fixed offset. Ink pixels are grouped into 8-connected components
//! and every component whose bounding box is at least 20x20 counts as a
//! text block.

use image::{GrayImage, Luma};
use imageproc::filter::box_filter;
use imageproc::region_labelling::{connected_components, Connectivity};

use super::prepared::PreparedImage;
use super::types::{FeatureError, FeatureFamily, FeatureVector};

pub const METHOD: &str = "adaptive_mean_components";

/// Radius of the local mean window (15x15).
const LOCAL_MEAN_RADIUS: u32 = 7;
/// Smallest bounding box side for a component to count as a text block.
const MIN_BLOCK_SIDE: u32 = 20;

#[derive(Debug, Clone, Copy)]
struct Bounds {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
}

impl Bounds {
    fn at(x: u32, y: u32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn grow(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }
}

/// Compute the text layout vector.
///
/// # Arguments
///
/// * `prepared` - Shared image planes
/// * `min_dimension` - Smallest accepted image side
/// * `adaptive_offset` - How much darker than its local mean a pixel must be to count as ink
///
/// # Returns
///
/// `[top, center, bottom, left, right, density, mean_block_size, block_count]`
/// where the five region ratios are the share of each third of the image
/// covered by text-block pixels, density is the share of the whole image,
/// and mean block size is the mean bounding box area as a fraction of the
/// image area. The block count is stored unnormalized.
pub fn extract_text_layout(
    prepared: &PreparedImage,
    min_dimension: u32,
    adaptive_offset: f32,
) -> Result<FeatureVector, FeatureError> {
    prepared.ensure_min_dimension(FeatureFamily::TextLayout, min_dimension)?;

    let binary = binarize(&prepared.gray, adaptive_offset);
    let labels = connected_components(&binary, Connectivity::Eight, Luma([0u8]));

    // Label 0 is background
    let mut bounds: Vec<Option<Bounds>> = Vec::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let label = label[0] as usize;
        if label == 0 {
            continue;
        }
        if bounds.len() <= label {
            bounds.resize(label + 1, None);
        }
        match bounds[label].as_mut() {
            Some(b) => b.grow(x, y),
            None => bounds[label] = Some(Bounds::at(x, y)),
        }
    }

    let is_block: Vec<bool> = bounds
        .iter()
        .map(|b| {
            b.map(|b| b.width() >= MIN_BLOCK_SIDE && b.height() >= MIN_BLOCK_SIDE)
                .unwrap_or(false)
        })
        .collect();
    let blocks: Vec<Bounds> = bounds
        .iter()
        .zip(is_block.iter())
        .filter_map(|(b, &block)| if block { *b } else { None })
        .collect();

    let (width, height) = (prepared.width, prepared.height);
    let third_w = width / 3;
    let third_h = height / 3;

    let mut top = 0usize;
    let mut center = 0usize;
    let mut bottom = 0usize;
    let mut left = 0usize;
    let mut right = 0usize;
    let mut text_pixels = 0usize;

    for (x, y, label) in labels.enumerate_pixels() {
        let label = label[0] as usize;
        if label == 0 || !is_block.get(label).copied().unwrap_or(false) {
            continue;
        }
        text_pixels += 1;
        if y < third_h {
            top += 1;
        } else if y < 2 * third_h {
            center += 1;
        } else {
            bottom += 1;
        }
        if x < third_w {
            left += 1;
        } else if x >= width - third_w {
            right += 1;
        }
    }

    let area = prepared.pixel_count() as f32;
    let band_rows = |rows: u32| (rows as f32 * width as f32).max(1.0);
    let band_cols = |cols: u32| (cols as f32 * height as f32).max(1.0);

    let density = text_pixels as f32 / area;
    let mean_block_size = if blocks.is_empty() {
        0.0
    } else {
        blocks
            .iter()
            .map(|b| (b.width() * b.height()) as f32 / area)
            .sum::<f32>()
            / blocks.len() as f32
    };

    let values = vec![
        top as f32 / band_rows(third_h),
        center as f32 / band_rows(third_h),
        bottom as f32 / band_rows(height - 2 * third_h),
        left as f32 / band_cols(third_w),
        right as f32 / band_cols(third_w),
        density,
        mean_block_size,
        blocks.len() as f32,
    ];

    let confidence =
        0.5 * density + 0.3 * (blocks.len() as f32 / 10.0).min(1.0) + 0.2 * mean_block_size;

    tracing::trace!(
        target: "feature_extraction",
        blocks = blocks.len(),
        density,
        "Text layout computed"
    );

    FeatureVector::new(FeatureFamily::TextLayout, values, confidence, METHOD).ensure_finite()
}

/// Ink is 255, background is 0.
fn binarize(gray: &GrayImage, offset: f32) -> GrayImage {
    let local_mean = box_filter(gray, LOCAL_MEAN_RADIUS, LOCAL_MEAN_RADIUS);
    let mut binary = GrayImage::new(gray.width(), gray.height());
    for ((out, pixel), mean) in binary
        .pixels_mut()
        .zip(gray.pixels())
        .zip(local_mean.pixels())
    {
        if (pixel[0] as f32) < mean[0] as f32 - offset {
            *out = Luma([255]);
        }
    }
    binary
}
