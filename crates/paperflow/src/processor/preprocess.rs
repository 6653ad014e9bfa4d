//! Page image cleanup ahead of character recognition.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::median_filter;

use crate::config::PreprocessConfig;

/// Turns a rendered page into a black/white image tuned for recognition.
///
/// Every step is total: grayscale, autocontrast, median denoise, fixed
/// threshold. The result only contains the pixel values 0 and 255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImagePreprocessor {
    threshold: u8,
    median_radius: u32,
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new(128, 1)
    }
}

impl ImagePreprocessor {
    pub fn new(threshold: u8, median_radius: u32) -> Self {
        Self {
            threshold,
            median_radius,
        }
    }

    pub fn from_config(config: &PreprocessConfig) -> Self {
        Self::new(config.threshold, config.median_radius)
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn preprocess(&self, image: &DynamicImage) -> GrayImage {
        let _span = tracing::debug_span!(
            "preprocess",
            width = image.width(),
            height = image.height()
        )
        .entered();

        let gray = image.to_luma8();
        let stretched = autocontrast(&gray);
        let denoised = if self.median_radius > 0 {
            median_filter(&stretched, self.median_radius, self.median_radius)
        } else {
            stretched
        };
        binarize(&denoised, self.threshold)
    }
}

/// Linearly maps the darkest pixel to 0 and the brightest to 255.
/// A flat image has no range to stretch and is returned unchanged.
pub fn autocontrast(image: &GrayImage) -> GrayImage {
    let (lo, hi) = image
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));

    if hi <= lo {
        return image.clone();
    }

    let range = f32::from(hi - lo);
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        let v = value as f32;
        *slot = if v <= f32::from(lo) {
            0
        } else if v >= f32::from(hi) {
            255
        } else {
            ((v - f32::from(lo)) * 255.0 / range).round() as u8
        };
    }

    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        pixel[0] = lut[pixel[0] as usize];
    }
    out
}

/// Pixels strictly brighter than `threshold` become white, the rest black.
pub fn binarize(image: &GrayImage, threshold: u8) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        if image.get_pixel(x, y)[0] > threshold {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}
