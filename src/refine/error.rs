use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::index::IndexError;
use crate::rerank::RerankError;

/// Errors from the per-criterion retrieval refinement flow.
///
/// Each is fatal to the current criterion only; callers skip the criterion
/// and continue the run.
#[derive(Error, Debug)]
pub enum RefineError {
    #[error("embedding capability failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("hybrid search failed: {0}")]
    Index(#[from] IndexError),

    #[error("cross-encoder scoring failed: {0}")]
    Rerank(#[from] RerankError),

    #[error("invalid retrieval configuration: {reason}")]
    InvalidConfig { reason: String },
}
