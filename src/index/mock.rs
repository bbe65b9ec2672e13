//! In-memory index for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::error::{IndexError, IndexResult};
use super::lexical::lexical_score;
use super::{SearchHit, SearchIndex, fuse_scores, rank_hits};
use crate::refine::vector::cosine;
use crate::segment::Chunk;

/// In-memory stand-in for the Qdrant index. Scores every stored chunk and
/// ranks with the same fusion as the real backend.
pub struct MockSearchIndex {
    dim: usize,
    ready: RwLock<bool>,
    points: RwLock<HashMap<String, (Chunk, Vec<f32>)>>,
}

impl MockSearchIndex {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            ready: RwLock::new(false),
            points: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored chunks.
    pub fn point_count(&self) -> usize {
        self.points.read().len()
    }
}

#[async_trait]
impl SearchIndex for MockSearchIndex {
    async fn ensure_collection(&self) -> IndexResult<()> {
        *self.ready.write() = true;
        Ok(())
    }

    async fn upsert_chunks(&self, chunks: &[Chunk], vectors: &[Vec<f32>]) -> IndexResult<()> {
        if !*self.ready.read() {
            return Err(IndexError::CollectionNotFound {
                collection: "mock".to_string(),
            });
        }
        if chunks.len() != vectors.len() {
            return Err(IndexError::UpsertFailed {
                collection: "mock".to_string(),
                message: format!("{} chunks but {} vectors", chunks.len(), vectors.len()),
            });
        }

        let mut points = self.points.write();
        for (chunk, vector) in chunks.iter().zip(vectors) {
            if vector.len() != self.dim {
                return Err(IndexError::InvalidDimension {
                    expected: self.dim,
                    actual: vector.len(),
                });
            }
            points.insert(chunk.id.clone(), (chunk.clone(), vector.clone()));
        }
        Ok(())
    }

    async fn hybrid_search(
        &self,
        query_text: &str,
        query_vector: &[f32],
        alpha: f32,
        limit: usize,
    ) -> IndexResult<Vec<SearchHit>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        if !*self.ready.read() {
            return Err(IndexError::CollectionNotFound {
                collection: "mock".to_string(),
            });
        }

        let points = self.points.read();
        let mut hits = Vec::with_capacity(points.len());
        let mut dense = Vec::with_capacity(points.len());
        let mut lexical = Vec::with_capacity(points.len());
        for (chunk, vector) in points.values() {
            dense.push(cosine(query_vector, vector));
            lexical.push(lexical_score(query_text, &chunk.text));
            hits.push(SearchHit {
                chunk_id: chunk.id.clone(),
                doc_id: chunk.doc_id.clone(),
                source_path: chunk.source_path.clone(),
                page: chunk.page_start,
                char_start: chunk.char_start,
                char_end: chunk.char_end,
                text: chunk.text.clone(),
                score: 0.0,
            });
        }
        drop(points);

        let fused = fuse_scores(&dense, &lexical, alpha);
        Ok(rank_hits(hits, fused, limit))
    }
}
