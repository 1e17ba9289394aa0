use image::{DynamicImage, ImageReader};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

use crate::error::{RectifyError, Result};

fn check_dimensions(image: DynamicImage) -> Result<DynamicImage> {
    if image.width() == 0 || image.height() == 0 {
        return Err(RectifyError::InvalidImage(format!(
            "decoded image is empty ({}x{})",
            image.width(),
            image.height()
        )));
    }
    Ok(image)
}

/// Decode an image file, guessing the format from its contents
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    let image = ImageReader::open(path)
        .map_err(|e| RectifyError::InvalidImage(format!("{}: {}", path.display(), e)))?
        .with_guessed_format()
        .map_err(|e| RectifyError::InvalidImage(format!("{}: {}", path.display(), e)))?
        .decode()
        .map_err(|e| RectifyError::InvalidImage(format!("Failed to decode {}: {}", path.display(), e)))?;

    debug!(path = %path.display(), width = image.width(), height = image.height(), "Image loaded");
    check_dimensions(image)
}

/// Decode an in-memory encoded image (PNG, JPEG, ...)
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    let image = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| RectifyError::InvalidImage(e.to_string()))?
        .decode()
        .map_err(|e| RectifyError::InvalidImage(format!("Failed to decode image: {}", e)))?;

    check_dimensions(image)
}
