//! Cross-cutting, shared constants.
//!
//! Component-specific defaults (token budgets, retrieval knobs) live next to
//! their config structs; only values shared across modules belong here.

use std::time::Duration;

/// Version tag stamped into exported run metadata.
pub const PIPELINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Retrieval method tag recorded on every output row.
pub const RETRIEVAL_METHOD: &str = "hybrid+ce";

/// Default embedding dimension (nomic-embed-text).
pub const DEFAULT_EMBEDDING_DIM: usize = 768;

/// Default number of chunk texts per embedding request.
pub const DEFAULT_EMBED_BATCH: usize = 64;

/// Per-request timeout for upstream services (LLM, embedder, cross-encoder).
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(60);

/// Bounded retry count for upstream requests.
pub const UPSTREAM_RETRIES: u32 = 3;

/// Base backoff between upstream retries (doubled per attempt).
pub const UPSTREAM_RETRY_BACKOFF: Duration = Duration::from_millis(750);

/// Epsilon added to vector norms before division.
pub const NORM_EPSILON: f32 = 1e-9;
