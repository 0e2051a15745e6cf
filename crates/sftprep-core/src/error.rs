//! Error types for sftprep.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for sftprep operations.
pub type Result<T> = std::result::Result<T, SftPrepError>;

/// Main error type for sftprep operations.
#[derive(Error, Debug)]
pub enum SftPrepError {
    /// Invalid construction parameters (tokenizer, lengths, ratios, columns).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The expected dataset file does not exist.
    #[error("Dataset not found: {}", .0.display())]
    DataNotFound(PathBuf),

    /// The dataset exists but cannot be used as-is.
    #[error("Data format error: {0}")]
    DataFormat(String),

    /// A prompt could not be tokenized.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// HuggingFace Hub errors.
    #[error("Hub error: {0}")]
    Hub(String),

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SftPrepError {
    /// Build a configuration error from anything printable.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a data format error from anything printable.
    pub fn data_format(msg: impl Into<String>) -> Self {
        Self::DataFormat(msg.into())
    }
}
