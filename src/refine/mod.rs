//! Per-criterion retrieval refinement.
//!
//! Takes a candidate pool from hybrid search and narrows it to a ranked,
//! diverse, non-redundant excerpt set: cross-encoder rescoring, then
//! maximal-marginal-relevance selection, then threshold dedup. Candidates
//! live only for the duration of one criterion query.

use std::cmp::Ordering;

use tracing::{debug, info, instrument};

use crate::embedding::{Embedder, EmbeddingError};
use crate::index::{SearchHit, SearchIndex};
use crate::rerank::CrossEncoder;

pub mod dedup;
pub mod error;
pub mod mmr;
pub mod vector;


pub use dedup::dedup_by_threshold;
pub use error::RefineError;
pub use mmr::mmr_select;
pub use vector::{cosine, dot, l2_normalize};

pub const DEFAULT_ALPHA: f32 = 0.5;
pub const DEFAULT_TOP_K_PRE_RERANK: usize = 50;
pub const DEFAULT_TOP_K_FINAL: usize = 5;
pub const DEFAULT_MMR_LAMBDA: f32 = 0.5;
pub const DEFAULT_DEDUP_SIMILARITY: f32 = 0.92;

/// Knobs for the per-criterion refinement flow.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalConfig {
    /// Lexical/vector blend factor for hybrid search, in `[0, 1]`.
    pub alpha: f32,
    /// Candidate pool size requested from hybrid search.
    pub top_k_pre_rerank: usize,
    /// Final excerpt count per criterion before dedup.
    pub top_k_final: usize,
    /// Relevance/diversity trade-off for MMR, in `[0, 1]`.
    pub mmr_lambda: f32,
    /// When false, the top of the reranked pool is taken without MMR.
    pub use_mmr: bool,
    /// Cosine similarity at or above which a candidate is dropped.
    pub dedup_similarity: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            top_k_pre_rerank: DEFAULT_TOP_K_PRE_RERANK,
            top_k_final: DEFAULT_TOP_K_FINAL,
            mmr_lambda: DEFAULT_MMR_LAMBDA,
            use_mmr: true,
            dedup_similarity: DEFAULT_DEDUP_SIMILARITY,
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<(), RefineError> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(RefineError::InvalidConfig {
                reason: format!("alpha must be in [0, 1], got {}", self.alpha),
            });
        }
        if !(0.0..=1.0).contains(&self.mmr_lambda) {
            return Err(RefineError::InvalidConfig {
                reason: format!("mmr_lambda must be in [0, 1], got {}", self.mmr_lambda),
            });
        }
        if !(0.0..=1.0).contains(&self.dedup_similarity) {
            return Err(RefineError::InvalidConfig {
                reason: format!(
                    "dedup_similarity must be in [0, 1], got {}",
                    self.dedup_similarity
                ),
            });
        }
        if self.top_k_final == 0 {
            return Err(RefineError::InvalidConfig {
                reason: "top_k_final must be at least 1".to_string(),
            });
        }
        if self.top_k_final > self.top_k_pre_rerank {
            return Err(RefineError::InvalidConfig {
                reason: format!(
                    "top_k_final ({}) must not exceed top_k_pre_rerank ({})",
                    self.top_k_final, self.top_k_pre_rerank
                ),
            });
        }
        Ok(())
    }
}

/// A chunk scored for one criterion query.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub chunk_id: String,
    pub doc_id: String,
    pub source_path: String,
    pub page: u32,
    pub char_start: usize,
    pub char_end: usize,
    pub text: String,
    /// Hybrid retrieval score; 0.0 when the backend omits one.
    pub score: f32,
    /// Cross-encoder score, set during rescoring.
    pub ce_score: f32,
}

impl From<SearchHit> for Candidate {
    fn from(hit: SearchHit) -> Self {
        Self {
            chunk_id: hit.chunk_id,
            doc_id: hit.doc_id,
            source_path: hit.source_path,
            page: hit.page,
            char_start: hit.char_start,
            char_end: hit.char_end,
            text: hit.text,
            score: hit.score,
            ce_score: 0.0,
        }
    }
}

/// Runs the full refinement flow for one criterion query and returns the
/// surviving candidates in final rank order.
#[instrument(skip_all, fields(query_len = query.len()))]
pub async fn refine_criterion(
    query: &str,
    config: &RetrievalConfig,
    index: &dyn SearchIndex,
    embedder: &dyn Embedder,
    reranker: &dyn CrossEncoder,
) -> Result<Vec<Candidate>, RefineError> {
    config.validate()?;

    let mut query_batch = embed_normalized(embedder, &[query]).await?;
    let query_vec = query_batch.pop().ok_or_else(|| {
        RefineError::Embedding(EmbeddingError::MalformedResponse {
            message: "embedding batch returned no vector for the query".to_string(),
        })
    })?;

    let hits = index
        .hybrid_search(query, &query_vec, config.alpha, config.top_k_pre_rerank)
        .await?;
    if hits.is_empty() {
        debug!("Hybrid search returned no candidates");
        return Ok(Vec::new());
    }

    let mut candidates: Vec<Candidate> = hits.into_iter().map(Candidate::from).collect();
    let pool_size = candidates.len();

    let texts: Vec<&str> = candidates.iter().map(|c| c.text.as_str()).collect();
    let scores = reranker.score(query, &texts).await?;
    for (candidate, score) in candidates.iter_mut().zip(scores) {
        candidate.ce_score = score;
    }
    candidates.sort_by(|a, b| b.ce_score.partial_cmp(&a.ce_score).unwrap_or(Ordering::Equal));

    // A pool of one needs no diversity pressure.
    let selected: Vec<Candidate> = if config.use_mmr && candidates.len() > 1 {
        let texts: Vec<&str> = candidates.iter().map(|c| c.text.as_str()).collect();
        let vectors = embed_normalized(embedder, &texts).await?;
        mmr_select(&vectors, config.top_k_final, config.mmr_lambda)
            .into_iter()
            .map(|i| candidates[i].clone())
            .collect()
    } else {
        candidates
            .into_iter()
            .take(config.top_k_final)
            .collect()
    };

    let texts: Vec<&str> = selected.iter().map(|c| c.text.as_str()).collect();
    let vectors = embed_normalized(embedder, &texts).await?;
    let survivors: Vec<Candidate> = dedup_by_threshold(&vectors, config.dedup_similarity)
        .into_iter()
        .map(|i| selected[i].clone())
        .collect();

    info!(
        pool = pool_size,
        selected = texts.len(),
        kept = survivors.len(),
        "Refined criterion candidates"
    );
    Ok(survivors)
}

/// Embeds a batch and L2-normalizes every vector.
async fn embed_normalized(
    embedder: &dyn Embedder,
    texts: &[&str],
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let raw = embedder.embed_batch(texts).await?;
    Ok(raw.iter().map(|v| l2_normalize(v)).collect())
}
