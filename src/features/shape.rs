//! # Shape Descriptor
//!
//! Traces 8-connected contours through the Sobel edge mask and describes
//! the largest ones by area, perimeter, circularity and aspect ratio.

use std::f32::consts::{PI, SQRT_2};

use super::prepared::PreparedImage;
use super::types::{FeatureError, FeatureFamily, FeatureVector, CONTOUR_FEATURE_LEN, MAX_CONTOURS};

pub const METHOD: &str = "edge_contours";

/// Contours with fewer points are treated as noise.
const MIN_CONTOUR_POINTS: usize = 10;

const NEIGHBORS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// One traced contour, in pixels.
#[derive(Debug, Clone)]
struct Contour {
    points: usize,
    perimeter: f32,
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
}

impl Contour {
    fn describe(&self, image_width: u32, image_height: u32) -> [f32; CONTOUR_FEATURE_LEN] {
        let area = self.points as f32;
        let circularity = if self.perimeter > 0.0 {
            (4.0 * PI * area / (self.perimeter * self.perimeter)).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let box_width = (self.max_x - self.min_x + 1) as f32;
        let box_height = (self.max_y - self.min_y + 1) as f32;

        [
            area / (image_width as f32 * image_height as f32),
            self.perimeter / (2.0 * (image_width + image_height) as f32),
            circularity,
            box_width / box_height,
        ]
    }
}

/// Compute `[count, MAX_CONTOURS x (area, perimeter, circularity, aspect)]`.
///
/// Area is the contour's point count over the image area and perimeter is
/// the traced length over the image's own perimeter. Contours are ordered
/// largest first with ties kept in discovery order.
pub fn extract_shape(
    prepared: &PreparedImage,
    min_dimension: u32,
    edge_threshold: f32,
) -> Result<FeatureVector, FeatureError> {
    prepared.ensure_min_dimension(FeatureFamily::Shape, min_dimension)?;
    let gradients = prepared.gradients(FeatureFamily::Shape)?;
    let mask = gradients.edge_mask(edge_threshold);

    let mut contours = trace_contours(&mask, prepared.width, prepared.height);
    let total_points: usize = contours.iter().map(|c| c.points).sum();
    contours.sort_by(|a, b| b.points.cmp(&a.points));
    contours.truncate(MAX_CONTOURS);

    let mut values = vec![0f32; FeatureFamily::Shape.expected_len()];
    values[0] = contours.len() as f32;
    for (slot, contour) in contours.iter().enumerate() {
        let start = 1 + slot * CONTOUR_FEATURE_LEN;
        values[start..start + CONTOUR_FEATURE_LEN]
            .copy_from_slice(&contour.describe(prepared.width, prepared.height));
    }

    let confidence = total_points as f32 / prepared.pixel_count() as f32;

    tracing::trace!(
        target: "feature_extraction",
        contours = contours.len(),
        total_points,
        "Contours traced"
    );

    FeatureVector::new(FeatureFamily::Shape, values, confidence, METHOD).ensure_finite()
}

/// Number of contours encoded in a shape vector's header
pub fn contour_count(values: &[f32]) -> usize {
    values
        .first()
        .map(|&count| (count.max(0.0) as usize).min(MAX_CONTOURS))
        .unwrap_or(0)
}

/// Depth-first walk over every 8-connected run of edge pixels.
///
/// The perimeter is the length of the forward moves of the walk (1 for
/// axis steps, sqrt 2 for diagonals); backtracking adds nothing.
fn trace_contours(mask: &[bool], width: u32, height: u32) -> Vec<Contour> {
    let mut visited = vec![false; mask.len()];
    let mut contours = Vec::new();
    let index = |x: u32, y: u32| (y * width + x) as usize;

    for y in 0..height {
        for x in 0..width {
            let start = index(x, y);
            if !mask[start] || visited[start] {
                continue;
            }

            visited[start] = true;
            let mut contour = Contour {
                points: 1,
                perimeter: 0.0,
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
            };
            let mut path = vec![(x, y)];

            while let Some(&(cx, cy)) = path.last() {
                let next = NEIGHBORS.iter().find_map(|&(dx, dy)| {
                    let nx = cx as i32 + dx;
                    let ny = cy as i32 + dy;
                    if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                        return None;
                    }
                    let (nx, ny) = (nx as u32, ny as u32);
                    let i = index(nx, ny);
                    (mask[i] && !visited[i]).then_some((nx, ny, dx != 0 && dy != 0))
                });

                match next {
                    Some((nx, ny, diagonal)) => {
                        visited[index(nx, ny)] = true;
                        contour.points += 1;
                        contour.perimeter += if diagonal { SQRT_2 } else { 1.0 };
                        contour.min_x = contour.min_x.min(nx);
                        contour.min_y = contour.min_y.min(ny);
                        contour.max_x = contour.max_x.max(nx);
                        contour.max_y = contour.max_y.max(ny);
                        path.push((nx, ny));
                    }
                    None => {
                        path.pop();
                    }
                }
            }

            if contour.points >= MIN_CONTOUR_POINTS {
                contours.push(contour);
            }
        }
    }

    contours
}
