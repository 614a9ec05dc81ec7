use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("embedding inference failed: {0}")]
    Inference(String),
    #[error("unexpected embedding dimension {got}, expected {expected}")]
    Dimension { got: usize, expected: usize },
    #[error("extractor panicked while processing a crop")]
    Panicked,
}

/// External feature-extraction model, treated as a black box.
///
/// Takes a square color face crop and returns a fixed-dimension float
/// vector. The pipeline relies on nothing beyond determinism of the
/// vector dimensionality; a failed crop yields an error, never a partial
/// vector.
pub trait FeatureExtractor: Send {
    fn extract(&mut self, crop: &Frame) -> Result<Vec<f32>, ExtractionError>;
}
