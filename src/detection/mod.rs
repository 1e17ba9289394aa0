pub mod preprocessing;
pub mod contours;
pub mod geometry;
pub mod raster;
pub mod transform;
pub mod sharpness;
pub mod ocr;
pub mod steps;

use image::{DynamicImage, GrayImage};
use tracing::{debug, info, warn};

use crate::error::{DetectionPass, RectifyError, Result};
use crate::models::{AlignedImage, CardCrop, Contour, RectifiedCard};
use raster::Raster;

/// Tunables for card localization and rectification
#[derive(Debug, Clone)]
pub struct RectifierParams {
    /// Frames with a side above this are scaled down once
    pub max_dimension: u32,
    pub downscale_factor: f64,
    /// Spatial sigma of the detail-enhancing filter, in pixels
    pub sigma_s: f32,
    /// Range sigma of the detail-enhancing filter, on `[0, 1]` intensities
    pub sigma_r: f32,
    /// Pre-Canny blur (0.8 matches a 3x3 Gaussian kernel)
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Side of the square structuring element for dilation and closing
    pub kernel_size: u8,
    /// Frames with a Laplacian variance below this get their crop sharpened
    pub blur_threshold: f64,
}

impl Default for RectifierParams {
    fn default() -> Self {
        Self {
            max_dimension: 600,
            downscale_factor: 0.8,
            sigma_s: 20.0,
            sigma_r: 0.15,
            blur_sigma: 0.8,
            canny_low: 75.0,
            canny_high: 200.0,
            kernel_size: 10,
            blur_threshold: 100.0,
        }
    }
}

/// Progress of one rectification, reported in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    BoundaryDetected,
    Rotated,
    CardCropped,
    Sharpened,
    Unsharpened,
    Done,
    Failed,
}

/// Locates a card in a frame, turns it upright and crops it.
///
/// Holds parameters only, so one instance can serve any number of threads.
#[derive(Debug, Clone, Default)]
pub struct CardRectifier {
    pub params: RectifierParams,
}

impl CardRectifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: RectifierParams) -> Self {
        Self { params }
    }

    pub fn with_blur_threshold(mut self, threshold: f64) -> Self {
        self.params.blur_threshold = threshold;
        self
    }

    /// One-shot downscale of oversized frames
    pub fn normalize(&self, image: DynamicImage) -> Result<DynamicImage> {
        preprocessing::normalize(image, self.params.max_dimension, self.params.downscale_factor)
    }

    /// Binary outline map used for contour extraction (exposed for debugging)
    pub fn edge_map(&self, image: &DynamicImage) -> GrayImage {
        let p = &self.params;

        let gray = preprocessing::to_grayscale(image);
        let detailed = preprocessing::detail_enhance(&gray, p.sigma_s, p.sigma_r);
        let blurred = preprocessing::apply_blur(&detailed, p.blur_sigma);
        let edges = preprocessing::detect_edges(&blurred, p.canny_low, p.canny_high);

        let element = preprocessing::structuring_element(p.kernel_size);
        let dilated = preprocessing::dilate(&edges, &element);
        preprocessing::close(&dilated, &element)
    }

    fn detect(&self, image: &DynamicImage, pass: DetectionPass) -> Result<Vec<Contour>> {
        let outline = self.edge_map(image);
        let found = contours::find_external_contours(&outline);
        debug!(%pass, contours = found.len(), "Boundary detection finished");

        if found.is_empty() {
            warn!(%pass, stage = ?Stage::Failed, "No card outline found");
            return Err(RectifyError::NoCardDetected { pass });
        }
        Ok(found)
    }

    /// External outlines of everything that stands out from the background
    pub fn find_card_contours(&self, image: &DynamicImage) -> Result<Vec<Contour>> {
        self.detect(image, DetectionPass::Alignment)
    }

    /// Rotate the whole frame so the largest outline's long edge is horizontal
    pub fn correct_alignment(&self, image: DynamicImage, contours: &[Contour]) -> Result<AlignedImage> {
        let card = contours::largest_contour(contours).ok_or(RectifyError::NoCardDetected {
            pass: DetectionPass::Alignment,
        })?;
        let card_rect = card.min_area_rect().ok_or(RectifyError::NoCardDetected {
            pass: DetectionPass::Alignment,
        })?;

        let angle = card_rect.correction_angle();
        debug!(raw_angle = card_rect.angle, angle, area = card.area(), "Card rectangle measured");

        let rotated = transform::rotate_about_center(&Raster::from_image(&image), angle).into_image();
        info!(stage = ?Stage::Rotated, angle, "Frame rotated");

        Ok(AlignedImage { image: rotated, angle, card_rect })
    }

    /// Re-detect the card on the rotated frame, crop it and sharpen the crop
    /// when the frame is blurry
    pub fn extract_card(&self, rotated: DynamicImage) -> Result<CardCrop> {
        let found = self.detect(&rotated, DetectionPass::Crop)?;
        let bbox = contours::largest_contour(&found)
            .and_then(Contour::bounding_rect)
            .ok_or(RectifyError::NoCardDetected { pass: DetectionPass::Crop })?;

        let roi = rotated.crop_imm(bbox.x, bbox.y, bbox.width, bbox.height);
        info!(stage = ?Stage::CardCropped, x = bbox.x, y = bbox.y, width = bbox.width, height = bbox.height, "Card cropped");

        // Blur is judged on the whole rotated frame, not just the crop
        let score = sharpness::laplacian_variance(&Raster::from_image(&rotated));
        let sharpened = score < self.params.blur_threshold;

        let image = if sharpened {
            info!(stage = ?Stage::Sharpened, sharpness = score, "Blurry frame, sharpening crop");
            sharpness::sharpen(&Raster::from_image(&roi)).into_image()
        } else {
            debug!(stage = ?Stage::Unsharpened, sharpness = score, "Frame sharp enough");
            Raster::from_image(&roi).into_image()
        };

        Ok(CardCrop { image, bbox, sharpness: score, sharpened })
    }

    /// Full pass: normalize, detect, align, re-detect, crop
    pub fn rectify(&self, image: DynamicImage) -> Result<RectifiedCard> {
        debug!(stage = ?Stage::Start, width = image.width(), height = image.height(), "Rectifying card");
        let normalized = self.normalize(image)?;

        let contours = self.find_card_contours(&normalized)?;
        info!(stage = ?Stage::BoundaryDetected, contours = contours.len(), "Card boundary detected");

        let aligned = self.correct_alignment(normalized, &contours)?;
        let crop = self.extract_card(aligned.image)?;
        info!(stage = ?Stage::Done, angle = aligned.angle, sharpened = crop.sharpened, "Card rectified");

        Ok(RectifiedCard {
            image: crop.image,
            angle: aligned.angle,
            bbox: crop.bbox,
            sharpness: crop.sharpness,
            sharpened: crop.sharpened,
        })
    }
}

/// Build the standard rectification pipeline: normalize, align, crop and,
/// when a recogniser is given, OCR
pub fn build_standard_pipeline(
    rectifier: CardRectifier,
    fallback: bool,
    ocr: Option<std::sync::Arc<dyn ocr::OcrService>>,
) -> crate::pipeline::Pipeline {
    use crate::pipeline::Pipeline;
    use crate::detection::steps::*;
    use std::sync::Arc;

    let rectifier = Arc::new(rectifier);
    let pipeline = Pipeline::new()
        .add_step(Arc::new(NormalizeStep { rectifier: rectifier.clone() }))
        .add_step(Arc::new(AlignmentStep { rectifier: rectifier.clone(), fallback }))
        .add_step(Arc::new(CardCropStep { rectifier, fallback }));

    match ocr {
        Some(service) => pipeline.add_step(Arc::new(OcrStep { service })),
        None => pipeline,
    }
}
