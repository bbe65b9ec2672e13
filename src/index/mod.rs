//! Chunk index with hybrid (lexical + vector) retrieval.
//!
//! Dense similarity comes from the vector store; the lexical signal is
//! computed client-side over returned payload text. Both score lists are
//! min-max normalized and blended with a configurable factor, so backends
//! that expose only one signal still produce usable rankings.

use async_trait::async_trait;

use crate::segment::Chunk;

pub mod error;
pub mod lexical;
pub mod qdrant;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(test)]
mod tests;

pub use error::{IndexError, IndexResult};
pub use qdrant::QdrantIndex;

#[cfg(any(test, feature = "mock"))]
pub use mock::MockSearchIndex;

/// Dense pool over-fetch factor, so the lexical signal can promote hits
/// that sit just beyond the dense cut.
pub(crate) const HYBRID_OVERFETCH: usize = 2;

/// One retrieved chunk with provenance and a blended relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub chunk_id: String,
    pub doc_id: String,
    pub source_path: String,
    pub page: u32,
    pub char_start: usize,
    pub char_end: usize,
    pub text: String,
    /// Blended hybrid score; 0.0 when the backend reports none.
    pub score: f32,
}

/// Chunk store with hybrid retrieval.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Creates the backing collection when missing.
    async fn ensure_collection(&self) -> IndexResult<()>;

    /// Upserts chunks with their (normalized) vectors, one vector per chunk.
    async fn upsert_chunks(&self, chunks: &[Chunk], vectors: &[Vec<f32>]) -> IndexResult<()>;

    /// Returns up to `limit` hits for the query, ranked by the blended
    /// `alpha * dense + (1 - alpha) * lexical` score.
    async fn hybrid_search(
        &self,
        query_text: &str,
        query_vector: &[f32],
        alpha: f32,
        limit: usize,
    ) -> IndexResult<Vec<SearchHit>>;
}

/// Min-max normalizes to `[0, 1]`. Degenerate ranges collapse to 0.5 so a
/// constant list stays neutral in the blend.
fn min_max_normalize(scores: &[f32]) -> Vec<f32> {
    let min = scores.iter().copied().fold(f32::INFINITY, f32::min);
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !min.is_finite() || !max.is_finite() || (max - min) <= f32::EPSILON {
        return vec![0.5; scores.len()];
    }
    scores.iter().map(|s| (s - min) / (max - min)).collect()
}

/// Blends per-hit dense and lexical scores after min-max normalization.
pub(crate) fn fuse_scores(dense: &[f32], lexical: &[f32], alpha: f32) -> Vec<f32> {
    let dense_norm = min_max_normalize(dense);
    let lexical_norm = min_max_normalize(lexical);
    dense_norm
        .iter()
        .zip(lexical_norm.iter())
        .map(|(d, l)| alpha * d + (1.0 - alpha) * l)
        .collect()
}

/// Attaches fused scores to hits, sorts descending, truncates to `limit`.
pub(crate) fn rank_hits(mut hits: Vec<SearchHit>, fused: Vec<f32>, limit: usize) -> Vec<SearchHit> {
    for (hit, score) in hits.iter_mut().zip(fused) {
        hit.score = score;
    }
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    hits.truncate(limit);
    hits
}
