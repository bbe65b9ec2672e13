use std::path::PathBuf;

use thiserror::Error;

/// Errors while loading the criteria sheet. All are fatal to the run: bad
/// input schema must fail before any retrieval work starts.
#[derive(Debug, Error)]
pub enum CriteriaError {
    #[error("failed to read criteria file '{path}': {message}")]
    Unreadable { path: PathBuf, message: String },

    #[error("criteria file is missing required column '{column}'")]
    MissingColumn { column: &'static str },

    #[error("malformed criteria row {row}: {message}")]
    MalformedRow { row: usize, message: String },

    #[error("criteria row {row} has an empty guidance_prompt")]
    EmptyGuidance { row: usize },
}
