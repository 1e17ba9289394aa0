use image::{DynamicImage, GrayImage, Luma};
pub use ocrs::OcrEngine;
use ocrs::{ImageSource, OcrEngineParams, TextItem};
use rten::Model;
use std::path::Path;
use tracing::debug;

use crate::models::BoundingRect;

/// Gray level separating ink from card stock before recognition
pub const OCR_BINARY_THRESHOLD: u8 = 150;

/// One recognised word
#[derive(Debug, Clone, PartialEq)]
pub struct TextToken {
    pub text: String,
    /// Position within the image handed to the recogniser
    pub bbox: BoundingRect,
    /// Engine confidence in `[0, 1]`, if the engine reports one
    pub confidence: Option<f32>,
}

/// Black-box text recogniser run on the rectified card
pub trait OcrService: Send + Sync {
    fn recognize(&self, image: &DynamicImage) -> anyhow::Result<Vec<TextToken>>;
}

/// Initialize OCR engine with models from standard cache location
pub fn init_ocr_engine() -> anyhow::Result<OcrEngine> {
    let home_dir = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))?;

    let cache_dir = Path::new(&home_dir).join(".cache/ocrs");
    let detection_model_path = cache_dir.join("text-detection.rten");
    let recognition_model_path = cache_dir.join("text-recognition.rten");

    if !detection_model_path.exists() || !recognition_model_path.exists() {
        anyhow::bail!(
            "OCR models not found. Please run: ocrs-cli --help (or download models manually)\n\
             Expected locations:\n  - {}\n  - {}",
            detection_model_path.display(),
            recognition_model_path.display()
        );
    }

    let detection_model = Model::load_file(&detection_model_path)?;
    let recognition_model = Model::load_file(&recognition_model_path)?;

    let engine = OcrEngine::new(OcrEngineParams {
        detection_model: Some(detection_model),
        recognition_model: Some(recognition_model),
        ..Default::default()
    })?;

    Ok(engine)
}

/// Grayscale and hard-threshold the card so dark print stands out
pub fn prepare_for_ocr(image: &DynamicImage) -> GrayImage {
    let gray = image.to_luma8();
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] > OCR_BINARY_THRESHOLD {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Join tokens into text, starting a new line whenever a token begins below
/// the previous one's vertical middle
pub fn tokens_to_text(tokens: &[TextToken]) -> String {
    let mut text = String::new();
    let mut previous: Option<&BoundingRect> = None;

    for token in tokens {
        if let Some(prev) = previous {
            if token.bbox.y > prev.y + prev.height / 2 {
                text.push('\n');
            } else {
                text.push(' ');
            }
        }
        text.push_str(&token.text);
        previous = Some(&token.bbox);
    }

    text
}

/// [`OcrService`] backed by the `ocrs` engine
pub struct OcrsService {
    engine: OcrEngine,
}

impl OcrsService {
    /// Load the models from `~/.cache/ocrs`
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self { engine: init_ocr_engine()? })
    }

    pub fn with_engine(engine: OcrEngine) -> Self {
        Self { engine }
    }
}

impl OcrService for OcrsService {
    fn recognize(&self, image: &DynamicImage) -> anyhow::Result<Vec<TextToken>> {
        let prepared = DynamicImage::ImageLuma8(prepare_for_ocr(image)).to_rgb8();

        let img_source = ImageSource::from_bytes(prepared.as_raw(), prepared.dimensions())
            .map_err(|e| anyhow::anyhow!("Failed to wrap image for OCR: {:?}", e))?;
        let ocr_input = self.engine.prepare_input(img_source)?;

        let word_rects = self.engine.detect_words(&ocr_input)?;
        let line_rects = self.engine.find_text_lines(&ocr_input, &word_rects);
        let lines = self.engine.recognize_text(&ocr_input, &line_rects)?;

        let mut tokens = Vec::new();
        for line in lines.iter().flatten() {
            for word in line.words() {
                let text = word.to_string();
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                let rect = word.bounding_rect();
                tokens.push(TextToken {
                    text: text.to_string(),
                    bbox: BoundingRect {
                        x: rect.left().max(0) as u32,
                        y: rect.top().max(0) as u32,
                        width: rect.width().max(0) as u32,
                        height: rect.height().max(0) as u32,
                    },
                    confidence: None,
                });
            }
        }

        debug!(words = tokens.len(), "OCR finished");
        Ok(tokens)
    }
}
