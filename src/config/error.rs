//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Embedding dimension string could not be parsed as a number.
    #[error("failed to parse embedding dimension '{value}': {source}")]
    DimParseError {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Embedding dimension must be at least 1.
    #[error("invalid embedding dimension: {dim} (must be >= 1)")]
    InvalidDimension { dim: usize },

    /// A setting that must be non-empty was empty.
    #[error("configuration value '{name}' must not be empty")]
    EmptyValue { name: &'static str },

    /// Path exists but is not a directory (when a directory was expected).
    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Configured CSV column list names an unknown column.
    #[error("invalid CSV field list: {message}")]
    InvalidCsvFields { message: String },
}
