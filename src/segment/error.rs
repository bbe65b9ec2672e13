use thiserror::Error;

use crate::llm::LlmError;

#[derive(Debug, Error)]
pub enum SegmentError {
    /// The continuity oracle could not be reached or persistently failed.
    #[error("continuity oracle unavailable: {0}")]
    Oracle(#[from] LlmError),

    /// The chunking configuration is internally inconsistent.
    #[error("invalid chunking config: {reason}")]
    InvalidConfig { reason: String },
}
