use std::path::PathBuf;

use thiserror::Error;

/// Errors while reading or staging source documents. Fatal to the affected
/// document only; ingestion of other documents continues.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("unsupported document format '{extension}' for '{path}'")]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("failed to read '{path}': {message}")]
    ReadFailed { path: PathBuf, message: String },

    #[error("failed to stage '{path}': {message}")]
    StageFailed { path: PathBuf, message: String },

    #[error("failed to scan documents folder '{path}': {message}")]
    ScanFailed { path: PathBuf, message: String },
}
