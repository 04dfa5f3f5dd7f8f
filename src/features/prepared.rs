//! # Prepared Image Planes
//!
//! Every descriptor family reads the same derived planes: the RGB buffer, a
//! grayscale conversion using the 0.299/0.587/0.114 luma weights, and Sobel
//! gradients over that grayscale. They are computed once per extraction.

use image::{DynamicImage, GrayImage, Luma, RgbImage};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

use super::types::{FeatureError, FeatureFamily};

/// Largest Sobel magnitude a 3x3 kernel can produce on 8-bit input.
pub const MAX_SOBEL_MAGNITUDE: f32 = 4.0 * 255.0 * std::f32::consts::SQRT_2;

/// Luma of one RGB sample.
pub fn luma(r: u8, g: u8, b: u8) -> f32 {
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

/// Sobel gradient field over a grayscale image, stored row-major.
#[derive(Debug, Clone)]
pub struct GradientField {
    pub width: u32,
    pub height: u32,
    pub gx: Vec<f32>,
    pub gy: Vec<f32>,
    pub magnitude: Vec<f32>,
}

impl GradientField {
    /// Compute Sobel gradients over `gray`.
    pub fn from_gray(gray: &GrayImage) -> Self {
        let horizontal = horizontal_sobel(gray);
        let vertical = vertical_sobel(gray);

        let gx: Vec<f32> = horizontal.as_raw().iter().map(|&v| v as f32).collect();
        let gy: Vec<f32> = vertical.as_raw().iter().map(|&v| v as f32).collect();
        let magnitude = gx
            .iter()
            .zip(gy.iter())
            .map(|(x, y)| (x * x + y * y).sqrt())
            .collect();

        Self {
            width: gray.width(),
            height: gray.height(),
            gx,
            gy,
            magnitude,
        }
    }

    /// Magnitude at (x, y)
    pub fn magnitude_at(&self, x: u32, y: u32) -> f32 {
        self.magnitude[(y * self.width + x) as usize]
    }

    /// Boolean mask of pixels whose magnitude exceeds `threshold`
    pub fn edge_mask(&self, threshold: f32) -> Vec<bool> {
        self.magnitude.iter().map(|&m| m > threshold).collect()
    }
}

/// Planes derived once from the raster input.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    pub rgb: RgbImage,
    /// Luma values in 0.0-255.0, row-major
    pub luma: Vec<f32>,
    /// Luma rounded to 8 bits for the imageproc filters
    pub gray: GrayImage,
    gradients: Option<GradientField>,
}

impl PreparedImage {
    /// Build the shared planes. Gradients are only computed when the image
    /// has a full 3x3 neighborhood.
    pub fn new(image: &DynamicImage) -> Self {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let luma: Vec<f32> = rgb.pixels().map(|p| luma(p[0], p[1], p[2])).collect();
        let mut gray = GrayImage::new(width, height);
        for (pixel, value) in gray.pixels_mut().zip(luma.iter()) {
            *pixel = Luma([value.round().clamp(0.0, 255.0) as u8]);
        }

        let gradients = if width >= 3 && height >= 3 {
            Some(GradientField::from_gray(&gray))
        } else {
            None
        };

        Self {
            width,
            height,
            rgb,
            luma,
            gray,
            gradients,
        }
    }

    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Fail with `ImageTooSmall` unless both sides are at least `min_dimension`.
    pub fn ensure_min_dimension(
        &self,
        family: FeatureFamily,
        min_dimension: u32,
    ) -> Result<(), FeatureError> {
        if self.width < min_dimension || self.height < min_dimension {
            return Err(FeatureError::ImageTooSmall {
                family,
                width: self.width,
                height: self.height,
                min_dimension,
            });
        }
        Ok(())
    }

    /// Sobel gradients, or a `Degenerate` error for images without a 3x3 interior.
    pub fn gradients(&self, family: FeatureFamily) -> Result<&GradientField, FeatureError> {
        self.gradients.as_ref().ok_or_else(|| FeatureError::Degenerate {
            family,
            reason: "image too small for a 3x3 gradient operator".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_luma_weights() {
        assert!((luma(255, 255, 255) - 255.0).abs() < 0.01);
        assert!((luma(255, 0, 0) - 76.245).abs() < 0.01);
        assert_eq!(luma(0, 0, 0), 0.0);
    }

    #[test]
    fn test_uniform_image_has_no_gradient() {
        let img = RgbImage::from_pixel(10, 10, Rgb([120, 30, 200]));
        let prepared = PreparedImage::new(&DynamicImage::ImageRgb8(img));
        let gradients = prepared
            .gradients(FeatureFamily::Edge)
            .expect("10x10 image has gradients");
        assert!(gradients.magnitude.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_tiny_image_has_no_gradients() {
        let img = RgbImage::new(2, 2);
        let prepared = PreparedImage::new(&DynamicImage::ImageRgb8(img));
        assert!(prepared.gradients(FeatureFamily::Edge).is_err());
        assert!(prepared.ensure_min_dimension(FeatureFamily::Color, 3).is_err());
    }

    #[test]
    fn test_vertical_step_produces_horizontal_gradient() {
        let mut img = RgbImage::new(10, 10);
        for (x, _, pixel) in img.enumerate_pixels_mut() {
            *pixel = if x < 5 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) };
        }
        let prepared = PreparedImage::new(&DynamicImage::ImageRgb8(img));
        let gradients = prepared.gradients(FeatureFamily::Edge).unwrap();
        assert!(gradients.magnitude_at(5, 5) > 500.0);
        assert_eq!(gradients.magnitude_at(1, 5), 0.0);
    }
}
