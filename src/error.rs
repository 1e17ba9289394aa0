use std::fmt;
use thiserror::Error;

/// Which of the two boundary-detection passes came up empty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionPass {
    /// Detection on the normalized frame, before rotation
    Alignment,
    /// Re-detection on the rotated frame, before cropping
    Crop,
}

impl fmt::Display for DetectionPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionPass::Alignment => write!(f, "alignment"),
            DetectionPass::Crop => write!(f, "crop"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RectifyError {
    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("no card detected during {pass} pass")]
    NoCardDetected { pass: DetectionPass },
}

impl RectifyError {
    /// Whether the caller can reasonably continue with the un-rectified image
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RectifyError::NoCardDetected { .. })
    }
}

pub type Result<T> = std::result::Result<T, RectifyError>;
