use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::{grayscale_close, grayscale_dilate, Mask};
use tracing::debug;

use super::raster::Raster;
use crate::error::{RectifyError, Result};

/// Number of recursive-filter passes in the domain transform
const DOMAIN_TRANSFORM_ITERATIONS: i32 = 3;

/// Gain applied to the detail layer when it is added back
const DETAIL_GAIN: f32 = 3.0;

/// Scale down once by `factor` when either side exceeds `max_dimension`.
///
/// Only a single step is taken: a 2000x1000 frame becomes 1600x800 and stays
/// above the limit. The result is always an 8-bit buffer with the input's
/// channel layout.
pub fn normalize(image: DynamicImage, max_dimension: u32, factor: f64) -> Result<DynamicImage> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(RectifyError::InvalidImage(format!(
            "image has zero dimension ({}x{})",
            width, height
        )));
    }

    let image = Raster::from_image(&image).into_image();
    if width <= max_dimension && height <= max_dimension {
        return Ok(image);
    }

    let new_width = ((width as f64 * factor).round() as u32).max(1);
    let new_height = ((height as f64 * factor).round() as u32).max(1);
    debug!(width, height, new_width, new_height, "Downscaling oversized image");

    Ok(image.resize_exact(new_width, new_height, FilterType::Triangle))
}

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

fn recursive_filter_rows(data: &mut [f32], dist: &[f32], width: usize, height: usize, a: f32) {
    for y in 0..height {
        let row = y * width;
        for x in 1..width {
            let v = a.powf(dist[row + x]);
            data[row + x] += v * (data[row + x - 1] - data[row + x]);
        }
        for x in (0..width.saturating_sub(1)).rev() {
            let v = a.powf(dist[row + x + 1]);
            data[row + x] += v * (data[row + x + 1] - data[row + x]);
        }
    }
}

fn recursive_filter_cols(data: &mut [f32], dist: &[f32], width: usize, height: usize, a: f32) {
    for x in 0..width {
        for y in 1..height {
            let i = y * width + x;
            let v = a.powf(dist[i]);
            data[i] += v * (data[i - width] - data[i]);
        }
        for y in (0..height.saturating_sub(1)).rev() {
            let i = y * width + x;
            let v = a.powf(dist[i + width]);
            data[i] += v * (data[i + width] - data[i]);
        }
    }
}

/// Edge-preserving detail enhancement.
///
/// Smooths the image with a domain-transform recursive filter (spatial
/// `sigma_s` in pixels, range `sigma_r` on intensities scaled to `[0, 1]`),
/// then adds the detail layer back with a gain of 3. Flat texture gets
/// smoothed while strong edges keep their contrast.
pub fn detail_enhance(img: &GrayImage, sigma_s: f32, sigma_r: f32) -> GrayImage {
    let (w, h) = img.dimensions();
    let (width, height) = (w as usize, h as usize);
    if width == 0 || height == 0 {
        return img.clone();
    }

    let src: Vec<f32> = img.as_raw().iter().map(|&v| v as f32 / 255.0).collect();
    let ratio = sigma_s / sigma_r;

    // Distances in the transformed domain between neighbouring samples
    let mut dist_x = vec![1.0f32; width * height];
    let mut dist_y = vec![1.0f32; width * height];
    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            if x > 0 {
                dist_x[i] = 1.0 + ratio * (src[i] - src[i - 1]).abs();
            }
            if y > 0 {
                dist_y[i] = 1.0 + ratio * (src[i] - src[i - width]).abs();
            }
        }
    }

    let mut smoothed = src.clone();
    let n = DOMAIN_TRANSFORM_ITERATIONS;
    for i in 0..n {
        let sigma_h = sigma_s * 3f32.sqrt() * 2f32.powi(n - (i + 1)) / (4f32.powi(n) - 1.0).sqrt();
        let a = (-(2f32.sqrt()) / sigma_h).exp();
        recursive_filter_rows(&mut smoothed, &dist_x, width, height, a);
        recursive_filter_cols(&mut smoothed, &dist_y, width, height, a);
    }

    GrayImage::from_fn(w, h, |x, y| {
        let i = y as usize * width + x as usize;
        let base = smoothed[i];
        let value = base + DETAIL_GAIN * (src[i] - base);
        Luma([(value * 255.0).round().clamp(0.0, 255.0) as u8])
    })
}

/// Apply Gaussian blur to reduce noise
pub fn apply_blur(img: &GrayImage, sigma: f32) -> GrayImage {
    gaussian_blur_f32(img, sigma)
}

/// Detect edges using Canny edge detector
pub fn detect_edges(img: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    canny(img, low_threshold, high_threshold)
}

/// All-ones square structuring element, anchored at `(size / 2, size / 2)`
pub fn structuring_element(size: u8) -> Mask {
    let size = size.max(1);
    let square = GrayImage::from_pixel(size as u32, size as u32, Luma([255u8]));
    Mask::from_image(&square, size / 2, size / 2)
}

/// Grow edge pixels to bridge broken segments
pub fn dilate(edges: &GrayImage, element: &Mask) -> GrayImage {
    grayscale_dilate(edges, element)
}

/// Dilate then erode to fill small holes along the outline
pub fn close(mask: &GrayImage, element: &Mask) -> GrayImage {
    grayscale_close(mask, element)
}
