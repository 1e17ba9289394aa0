use crate::pipeline::{PipelineData, PipelineStep, PipelineContext};
use crate::detection::{CardRectifier, ocr::OcrService};
use crate::error::RectifyError;
use anyhow::Result;
use std::sync::Arc;
use tracing::warn;

/// Scale oversized frames down once
pub struct NormalizeStep {
    pub rectifier: Arc<CardRectifier>,
}

impl PipelineStep for NormalizeStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        data.into_iter()
            .map(|mut item| -> Result<PipelineData> {
                item.image = self.rectifier.normalize(item.image)?;
                Ok(item)
            })
            .collect()
    }

    fn name(&self) -> &str {
        "Normalize"
    }
}

/// Put the loaded frame back and mark the item as un-rectified, or fail when
/// fallback is off
fn fall_back(mut item: PipelineData, err: RectifyError, fallback: bool) -> Result<PipelineData> {
    if !fallback || !err.is_recoverable() {
        return Err(err.into());
    }
    warn!(error = %err, "Keeping un-rectified image");

    item.image = (*item.original).clone();
    item.bbox = None;
    for key in ["rotation_angle", "sharpness", "sharpened"] {
        item.metadata.remove(key);
    }
    Ok(item
        .with_metadata("card_detected", false)
        .with_metadata("failure", err.to_string()))
}

/// Detect the card outline and rotate the frame upright
pub struct AlignmentStep {
    pub rectifier: Arc<CardRectifier>,
    /// Pass the frame through unchanged when no card is found
    pub fallback: bool,
}

impl PipelineStep for AlignmentStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::with_capacity(data.len());

        for item in data {
            let aligned = self.rectifier
                .find_card_contours(&item.image)
                .and_then(|contours| self.rectifier.correct_alignment(item.image.clone(), &contours));

            result.push(match aligned {
                Ok(aligned) => {
                    let mut item = item
                        .with_metadata("card_detected", true)
                        .with_metadata("rotation_angle", aligned.angle);
                    item.image = aligned.image;
                    item
                }
                Err(err) => fall_back(item, err, self.fallback)?,
            });
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Alignment"
    }
}

/// Crop the card from the rotated frame, sharpening blurry crops
pub struct CardCropStep {
    pub rectifier: Arc<CardRectifier>,
    pub fallback: bool,
}

impl PipelineStep for CardCropStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::with_capacity(data.len());

        for item in data {
            if item.is_fallback() {
                result.push(item);
                continue;
            }

            result.push(match self.rectifier.extract_card(item.image.clone()) {
                Ok(crop) => {
                    let mut item = item
                        .with_metadata("sharpness", crop.sharpness as f32)
                        .with_metadata("sharpened", crop.sharpened);
                    item.image = crop.image;
                    item.bbox = Some(crop.bbox);
                    item
                }
                Err(err) => fall_back(item, err, self.fallback)?,
            });
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Card Crop"
    }
}

/// Recognise the words printed on the rectified card
pub struct OcrStep {
    pub service: Arc<dyn OcrService>,
}

impl PipelineStep for OcrStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        data.into_iter()
            .map(|mut item| -> Result<PipelineData> {
                item.tokens = self.service.recognize(&item.image)?;
                let words = item.tokens.len() as u32;
                Ok(item.with_metadata("word_count", words))
            })
            .collect()
    }

    fn name(&self) -> &str {
        "OCR Recognition"
    }
}
