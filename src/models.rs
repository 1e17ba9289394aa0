use image::DynamicImage;
use imageproc::point::Point;

/// Axis-aligned box in image coordinates (inclusive of both edge pixels)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingRect {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f32 / self.height as f32
    }

    /// Overlapping area with another box
    pub fn intersection_area(&self, other: &BoundingRect) -> u64 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);
        if right <= left || bottom <= top {
            return 0;
        }
        (right - left) as u64 * (bottom - top) as u64
    }
}

/// Minimum-area rectangle enclosing a contour.
///
/// `angle` is the direction in degrees of the edge `width` is measured
/// along, in image coordinates (x right, y down: positive turns clockwise on
/// screen), reduced into `(0, 90]`. An axis-aligned rectangle reports `90`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedRect {
    pub center: (f32, f32),
    pub width: f32,
    pub height: f32,
    pub angle: f32,
}

impl RotatedRect {
    /// Rotation that brings this rectangle back to upright, in degrees,
    /// positive meaning counter-clockwise on screen.
    ///
    /// Angles above 45 describe the short edge, so they are folded back to
    /// a small negative turn of the long edge.
    pub fn correction_angle(&self) -> f32 {
        if self.angle > 45.0 {
            -(90.0 - self.angle)
        } else {
            self.angle
        }
    }
}

/// Closed outer boundary of a blob in a binary image, every border pixel kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    /// Enclosed polygon area (shoelace formula, orientation ignored)
    pub fn area(&self) -> f64 {
        crate::detection::geometry::polygon_area(&self.points)
    }

    pub fn bounding_rect(&self) -> Option<BoundingRect> {
        let first = self.points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        Some(BoundingRect {
            x: min_x.max(0) as u32,
            y: min_y.max(0) as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }

    pub fn min_area_rect(&self) -> Option<RotatedRect> {
        crate::detection::geometry::min_area_rect(&self.points)
    }
}

/// Result of rotating the frame so the card's long edge is horizontal
#[derive(Debug, Clone)]
pub struct AlignedImage {
    pub image: DynamicImage,
    /// Rotation that was applied, degrees counter-clockwise on screen
    pub angle: f32,
    /// Rectangle the angle was measured from
    pub card_rect: RotatedRect,
}

/// Cropped card region from the second detection pass
#[derive(Debug, Clone)]
pub struct CardCrop {
    pub image: DynamicImage,
    /// Crop box within the rotated frame
    pub bbox: BoundingRect,
    /// Laplacian variance of the rotated frame
    pub sharpness: f64,
    pub sharpened: bool,
}

/// Full rectifier output
#[derive(Debug, Clone)]
pub struct RectifiedCard {
    pub image: DynamicImage,
    pub angle: f32,
    pub bbox: BoundingRect,
    pub sharpness: f64,
    pub sharpened: bool,
}
