#![allow(dead_code)]

use cardscan::BoundingRect;
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::filter::gaussian_blur_f32;

/// Card stock colour used by every fixture
pub const CARD_COLOR: Rgb<u8> = Rgb([238, 236, 230]);

/// Dark print colour for the fake text lines
pub const INK_COLOR: Rgb<u8> = Rgb([30, 30, 40]);

/// Plain frame without any card
pub fn uniform_image(width: u32, height: u32, value: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([value, value, value])))
}

/// Upright card on a flat dark background
pub fn upright_card(width: u32, height: u32, card: BoundingRect) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let inside = x >= card.x && x < card.x + card.width && y >= card.y && y < card.y + card.height;
        if inside { CARD_COLOR } else { Rgb([45, 48, 52]) }
    });
    DynamicImage::ImageRgb8(img)
}

/// Low-contrast, slowly varying brown stripes standing in for a wooden table
pub fn wood_grain(x: u32, y: u32) -> Rgb<u8> {
    let (xf, yf) = (x as f32, y as f32);
    let grain = 8.0 * (yf / 10.0 + (xf / 70.0).sin()).sin();
    Rgb([
        (125.0 + grain) as u8,
        (88.0 + grain * 0.8) as u8,
        (55.0 + grain * 0.6) as u8,
    ])
}

/// Card of `card_w` x `card_h` centred in the frame, its long edge turned by
/// `angle_deg` (positive is clockwise on screen), on a wood-grain background.
///
/// A few dark text lines are printed well inside the card.
pub fn rotated_card_on_wood(width: u32, height: u32, card_w: f32, card_h: f32, angle_deg: f32) -> DynamicImage {
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let (sin, cos) = angle_deg.to_radians().sin_cos();

    let img = RgbImage::from_fn(width, height, |x, y| {
        let (dx, dy) = (x as f32 - cx, y as f32 - cy);
        // Position in the card's own frame, origin at the card centre
        let u = dx * cos + dy * sin;
        let v = -dx * sin + dy * cos;

        if u.abs() > card_w / 2.0 || v.abs() > card_h / 2.0 {
            return wood_grain(x, y);
        }

        let (cu, cv) = (u + card_w / 2.0, v + card_h / 2.0);
        let text_row = [0.3, 0.5, 0.7]
            .iter()
            .any(|row| (cv - card_h * row).abs() < 4.0);
        if text_row && cu > card_w * 0.2 && cu < card_w * 0.8 {
            INK_COLOR
        } else {
            CARD_COLOR
        }
    });
    DynamicImage::ImageRgb8(img)
}

/// High-contrast upright card smeared with a wide Gaussian blur
pub fn blurred_card(width: u32, height: u32, card: BoundingRect, sigma: f32) -> DynamicImage {
    let sharp = GrayImage::from_fn(width, height, |x, y| {
        let inside = x >= card.x && x < card.x + card.width && y >= card.y && y < card.y + card.height;
        Luma([if inside { 255 } else { 0 }])
    });
    DynamicImage::ImageLuma8(gaussian_blur_f32(&sharp, sigma))
}

pub fn rect(x: u32, y: u32, width: u32, height: u32) -> BoundingRect {
    BoundingRect { x, y, width, height }
}

/// Share of `truth` covered by `found`
pub fn coverage(found: &BoundingRect, truth: &BoundingRect) -> f64 {
    found.intersection_area(truth) as f64 / truth.area() as f64
}
