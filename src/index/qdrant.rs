//! Qdrant-backed chunk index.

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, ScoredPoint, SearchPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder,
};
use tracing::{debug, info};

use super::error::{IndexError, IndexResult};
use super::lexical::lexical_score;
use super::{HYBRID_OVERFETCH, SearchHit, SearchIndex, fuse_scores, rank_hits};
use crate::hashing;
use crate::segment::Chunk;

/// Chunk index backed by a Qdrant collection with cosine distance.
pub struct QdrantIndex {
    client: Qdrant,
    url: String,
    collection: String,
    dim: usize,
}

impl QdrantIndex {
    /// Creates an index client for `url`.
    pub fn new(url: &str, collection: &str, dim: usize) -> IndexResult<Self> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| IndexError::ConnectionFailed {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            url: url.to_string(),
            collection: collection.to_string(),
            dim,
        })
    }

    /// Returns the configured URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Performs a basic health check request.
    pub async fn health_check(&self) -> IndexResult<()> {
        self.client
            .health_check()
            .await
            .map_err(|e| IndexError::ConnectionFailed {
                url: self.url.clone(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn dense_search(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> IndexResult<Vec<SearchHit>> {
        let search =
            SearchPointsBuilder::new(&self.collection, query_vector.to_vec(), limit as u64)
                .with_payload(true);

        let response =
            self.client
                .search_points(search)
                .await
                .map_err(|e| IndexError::SearchFailed {
                    collection: self.collection.clone(),
                    message: e.to_string(),
                })?;

        Ok(response
            .result
            .into_iter()
            .filter_map(hit_from_scored_point)
            .collect())
    }
}

#[async_trait]
impl SearchIndex for QdrantIndex {
    async fn ensure_collection(&self) -> IndexResult<()> {
        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| IndexError::CreateCollectionFailed {
                collection: self.collection.clone(),
                message: e.to_string(),
            })?;

        if !exists {
            let vectors_config = VectorParamsBuilder::new(self.dim as u64, Distance::Cosine);

            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection)
                        .vectors_config(vectors_config)
                        .on_disk_payload(true),
                )
                .await
                .map_err(|e| IndexError::CreateCollectionFailed {
                    collection: self.collection.clone(),
                    message: e.to_string(),
                })?;

            info!(collection = %self.collection, dim = self.dim, "Created collection");
        }

        Ok(())
    }

    async fn upsert_chunks(&self, chunks: &[Chunk], vectors: &[Vec<f32>]) -> IndexResult<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        if chunks.len() != vectors.len() {
            return Err(IndexError::UpsertFailed {
                collection: self.collection.clone(),
                message: format!("{} chunks but {} vectors", chunks.len(), vectors.len()),
            });
        }

        let mut points = Vec::with_capacity(chunks.len());
        for (chunk, vector) in chunks.iter().zip(vectors) {
            if vector.len() != self.dim {
                return Err(IndexError::InvalidDimension {
                    expected: self.dim,
                    actual: vector.len(),
                });
            }

            let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
            payload.insert("chunk_id".to_string(), chunk.id.clone().into());
            payload.insert("doc_id".to_string(), chunk.doc_id.clone().into());
            payload.insert("source_path".to_string(), chunk.source_path.clone().into());
            payload.insert("page".to_string(), (chunk.page_start as i64).into());
            payload.insert("char_start".to_string(), (chunk.char_start as i64).into());
            payload.insert("char_end".to_string(), (chunk.char_end as i64).into());
            payload.insert("text".to_string(), chunk.text.clone().into());

            points.push(PointStruct::new(
                hashing::point_id_for_chunk(&chunk.id),
                vector.clone(),
                payload,
            ));
        }

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(|e| IndexError::UpsertFailed {
                collection: self.collection.clone(),
                message: e.to_string(),
            })?;

        debug!(count = chunks.len(), "Upserted chunk batch");
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

        let hits = self
            .dense_search(query_vector, limit * HYBRID_OVERFETCH)
            .await?;
        if hits.is_empty() {
            return Ok(hits);
        }

        let dense: Vec<f32> = hits.iter().map(|h| h.score).collect();
        let lexical: Vec<f32> = hits
            .iter()
            .map(|h| lexical_score(query_text, &h.text))
            .collect();
        let fused = fuse_scores(&dense, &lexical, alpha);
        Ok(rank_hits(hits, fused, limit))
    }
}

/// Builds a hit from a scored point, tolerating missing payload fields.
fn hit_from_scored_point(point: ScoredPoint) -> Option<SearchHit> {
    // Only numeric point ids are ever written; anything else is foreign.
    match point.id.and_then(|pid| pid.point_id_options) {
        Some(PointIdOptions::Num(_)) => {}
        _ => return None,
    }

    let payload = point.payload;

    let chunk_id = payload
        .get("chunk_id")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_default();

    let doc_id = payload
        .get("doc_id")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_default();

    let source_path = payload
        .get("source_path")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_default();

    let page = payload
        .get("page")
        .and_then(|v| v.as_integer())
        .map(|i| i as u32)
        .unwrap_or(0);

    let char_start = payload
        .get("char_start")
        .and_then(|v| v.as_integer())
        .map(|i| i as usize)
        .unwrap_or(0);

    let char_end = payload
        .get("char_end")
        .and_then(|v| v.as_integer())
        .map(|i| i as usize)
        .unwrap_or(0);

    let text = payload
        .get("text")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_default();

    Some(SearchHit {
        chunk_id,
        doc_id,
        source_path,
        page,
        char_start,
        char_end,
        text,
        score: point.score,
    })
}
