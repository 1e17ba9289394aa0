mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from cardscan for tests
#[allow(unused_imports)]
pub use cardscan::{
    BoundingRect, CardRectifier, DetectionPass, PipelineData, RectifierParams, RectifyError,
};
