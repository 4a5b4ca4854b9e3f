//! Fixed-length face descriptor produced by the external embedding pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of components in every descriptor (fixed by the embedding pipeline).
pub const DESCRIPTOR_DIM: usize = 128;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DescriptorError {
    #[error("invalid descriptor: expected {DESCRIPTOR_DIM} components, got {0}")]
    WrongLength(usize),
    #[error("invalid descriptor: component {index} is not finite ({value})")]
    NonFinite { index: usize, value: f32 },
}

/// Face descriptor: exactly [`DESCRIPTOR_DIM`] finite components.
///
/// Immutable once constructed. Deserialization goes through the same
/// validation as [`Descriptor::new`], so a persisted descriptor with the
/// wrong length never makes it back into the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct Descriptor {
    values: Box<[f32]>,
}

impl Descriptor {
    /// Validate an externally supplied component sequence.
    pub fn new(values: Vec<f32>) -> Result<Self, DescriptorError> {
        if values.len() != DESCRIPTOR_DIM {
            return Err(DescriptorError::WrongLength(values.len()));
        }
        if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(DescriptorError::NonFinite { index, value });
        }
        Ok(Self {
            values: values.into_boxed_slice(),
        })
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Euclidean distance to another descriptor.
    ///
    /// Both sides are validated at construction, so the lengths always agree.
    pub fn distance(&self, other: &Descriptor) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }
}

impl TryFrom<Vec<f32>> for Descriptor {
    type Error = DescriptorError;

    fn try_from(values: Vec<f32>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<Descriptor> for Vec<f32> {
    fn from(descriptor: Descriptor) -> Self {
        descriptor.values.into_vec()
    }
}
