//! Error types for the spam/ham pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpamHamError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Dataset validation failed at record {record}: {reason}")]
    DatasetValidation { record: usize, reason: String },

    #[error("Not fitted: {0}")]
    NotFitted(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Incompatible artifact: {0}")]
    IncompatibleArtifactVersion(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, SpamHamError>;
