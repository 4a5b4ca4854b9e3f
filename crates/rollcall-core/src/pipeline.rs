//! External detection pipeline boundary: frame in, zero or more descriptors out.

use crate::descriptor::{Descriptor, DescriptorError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("detection pipeline unavailable: {0}")]
    Unavailable(String),
    #[error("pipeline returned an invalid descriptor: {0}")]
    InvalidDescriptor(#[from] DescriptorError),
}

/// Turns a captured frame into face descriptors.
///
/// Implementations may block; the orchestrator never calls one while
/// another detection is outstanding.
pub trait DetectionPipeline: Send + Sync {
    fn detect(&self, frame: &[u8]) -> Result<Vec<Descriptor>, PipelineError>;
}

/// Validate raw component vectors as returned by an embedder.
pub fn descriptors_from_raw(raw: Vec<Vec<f32>>) -> Result<Vec<Descriptor>, PipelineError> {
    raw.into_iter()
        .map(|values| Descriptor::new(values).map_err(PipelineError::from))
        .collect()
}
