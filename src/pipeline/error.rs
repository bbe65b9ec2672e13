use thiserror::Error;

use crate::criteria::CriteriaError;
use crate::embedding::EmbeddingError;
use crate::export::ExportError;
use crate::index::IndexError;
use crate::ingest::DocumentError;
use crate::llm::LlmError;
use crate::refine::RefineError;
use crate::rerank::RerankError;
use crate::segment::SegmentError;

/// Errors escaping the pipeline entry points.
///
/// Per-document and per-criterion failures are logged and skipped inside the
/// run loops; anything surfacing here aborts the enclosing command.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("criteria load failed: {0}")]
    Criteria(#[from] CriteriaError),

    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    #[error("segmentation failed: {0}")]
    Segment(#[from] SegmentError),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("retrieval refinement failed: {0}")]
    Refine(#[from] RefineError),

    #[error("LLM client error: {0}")]
    Llm(#[from] LlmError),

    #[error("cross-encoder error: {0}")]
    Rerank(#[from] RerankError),

    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}
