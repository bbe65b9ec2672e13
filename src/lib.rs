//! Dossier library crate (used by the CLI binary and integration tests).
//!
//! # Public API Surface
//!
//! The exports are organized by pipeline stage:
//!
//! ## Configuration
//! - [`Config`], [`ConfigError`] - Environment-backed settings
//!
//! ## Ingest & Segmentation
//! - [`Document`], [`Page`], [`Chunk`] - Document data model
//! - [`Segmenter`], [`ChunkingConfig`] - Token-budget semantic segmentation
//! - [`ContinuityJudge`], [`LlmContinuityJudge`], [`HeadingHeuristic`] - Topic
//!   boundary decisions
//!
//! ## Index & Retrieval
//! - [`SearchIndex`], [`QdrantIndex`], [`SearchHit`] - Hybrid chunk store
//! - [`Embedder`], [`HttpEmbedder`] - Embedding capability
//! - [`CrossEncoder`], [`HttpCrossEncoder`] - Rescoring capability
//! - [`refine_criterion`], [`RetrievalConfig`], [`Candidate`] - Per-criterion
//!   refinement (rescoring, MMR, dedup)
//!
//! ## Criteria & Output
//! - [`Criterion`], [`load_criteria`] - Criteria sheet loading
//! - [`SupportVerifier`], [`Verification`] - Optional excerpt verification
//! - [`EvidenceRow`], [`RunMeta`], [`write_rows`] - CSV export
//!
//! ## Orchestration
//! - [`Pipeline`] - Ingest and extract commands over wired capabilities
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod criteria;
pub mod embedding;
pub mod export;
pub mod hashing;
pub mod index;
pub mod ingest;
pub mod llm;
pub mod pipeline;
pub mod refine;
pub mod rerank;
pub mod segment;
mod upstream;
pub mod verify;

pub use config::{Config, ConfigError, DEFAULT_COLLECTION, DEFAULT_QDRANT_URL};
pub use constants::{
    DEFAULT_EMBED_BATCH, DEFAULT_EMBEDDING_DIM, PIPELINE_VERSION, RETRIEVAL_METHOD,
};
pub use criteria::{Criterion, CriteriaError, REQUIRED_COLUMNS, load_criteria};
pub use embedding::{Embedder, EmbeddingError, HttpEmbedder};
pub use export::{
    DEFAULT_CSV_FIELDS, EvidenceRow, ExportError, RunMeta, default_fields, validate_fields,
    write_rows,
};
pub use hashing::{chunk_id, doc_id_for_bytes, hash_to_u64, point_id_for_chunk};
#[cfg(any(test, feature = "mock"))]
pub use index::MockSearchIndex;
pub use index::{IndexError, IndexResult, QdrantIndex, SearchHit, SearchIndex};
pub use ingest::{
    Document, DocumentError, SUPPORTED_EXTENSIONS, StagedRecord, clean_page, list_documents,
    read_document, stage_pages,
};
pub use llm::{ChatClient, LlmError};
pub use pipeline::{ExtractSummary, IngestSummary, Pipeline, PipelineError};
pub use refine::{
    Candidate, DEFAULT_ALPHA, DEFAULT_DEDUP_SIMILARITY, DEFAULT_MMR_LAMBDA, DEFAULT_TOP_K_FINAL,
    DEFAULT_TOP_K_PRE_RERANK, RefineError, RetrievalConfig, cosine, dedup_by_threshold,
    l2_normalize, mmr_select, refine_criterion,
};
pub use rerank::{
    CrossEncoder, DEFAULT_RERANK_BATCH, DEFAULT_RERANK_MODEL, HttpCrossEncoder, RerankConfig,
    RerankError,
};
#[cfg(any(test, feature = "mock"))]
pub use segment::ScriptedJudge;
pub use segment::{
    Chunk, ChunkingConfig, ContinuityJudge, DEFAULT_MAX_TOKENS, DEFAULT_MIN_TOKENS,
    DEFAULT_TARGET_TOKENS, HeadingHeuristic, LlmContinuityJudge, Page, SegmentError, Segmenter,
    estimate_tokens,
};
pub use verify::{SupportVerifier, VERIFY_NOTE_MAX_CHARS, Verification};
