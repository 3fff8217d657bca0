//! Errors surfaced by a pipeline run

use thiserror::Error;

use crate::content::{LoadCause, LoadError, SchemaError};
use crate::generator::SerializationError;

/// Any failure that ends a build; there is no partial output
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error("failed to write build output: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// The schema failure behind this error, if any
    pub fn schema_error(&self) -> Option<&SchemaError> {
        match self {
            PipelineError::Load(LoadError {
                cause: LoadCause::Schema(e),
                ..
            }) => Some(e),
            _ => None,
        }
    }
}
