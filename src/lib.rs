pub mod detection;
pub mod error;
pub mod loader;
pub mod models;
pub mod pipeline;

pub use models::{AlignedImage, BoundingRect, CardCrop, Contour, RectifiedCard, RotatedRect};
pub use detection::{CardRectifier, RectifierParams, build_standard_pipeline};
pub use error::{DetectionPass, RectifyError};
pub use pipeline::{
    Pipeline, PipelineData, PipelineStep, PipelineContext, MetadataValue
};
