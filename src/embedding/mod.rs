//! Embedding capability.
//!
//! Texts go out in batches, fixed-dimension vectors come back in input
//! order. Vectors are returned raw; callers apply L2 normalization
//! uniformly before any similarity math. When no embedding endpoint is
//! configured, a deterministic stub keeps the pipeline runnable offline.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::{UPSTREAM_RETRIES, UPSTREAM_RETRY_BACKOFF};
use crate::upstream::{build_client, retryable_status, retryable_transport};

mod error;


pub use error::EmbeddingError;

/// Batch text-to-vector capability.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds `texts`, returning one vector per text in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Dimension of every returned vector.
    fn dim(&self) -> usize;
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    index: usize,
    embedding: Vec<f32>,
}

enum EmbedderBackend {
    Remote {
        client: reqwest::Client,
        endpoint: String,
    },
    Stub,
}

/// Embedder against an OpenAI-compatible `/embeddings` endpoint, with a
/// deterministic hash-seeded stub when no endpoint is configured.
pub struct HttpEmbedder {
    backend: EmbedderBackend,
    model: String,
    dim: usize,
}

impl HttpEmbedder {
    /// Builds a remote embedder for `base_url`.
    pub fn remote(base_url: &str, model: &str, dim: usize) -> Result<Self, EmbeddingError> {
        let client = build_client().map_err(|e| EmbeddingError::ClientBuild {
            message: e.to_string(),
        })?;
        Ok(Self {
            backend: EmbedderBackend::Remote {
                client,
                endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            },
            model: model.to_string(),
            dim,
        })
    }

    /// Builds the offline stub. Vectors are deterministic per text but carry
    /// no semantic signal.
    pub fn stub(dim: usize) -> Self {
        warn!(
            dim,
            "No embedding endpoint configured; using deterministic stub vectors"
        );
        Self {
            backend: EmbedderBackend::Stub,
            model: "stub".to_string(),
            dim,
        }
    }

    /// Returns the configured model id.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn stub_vector(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut state = hasher.finish();

        let mut vector = Vec::with_capacity(self.dim);
        for _ in 0..self.dim {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            vector.push(((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0);
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }

    async fn embed_remote(
        &self,
        client: &reqwest::Client,
        endpoint: &str,
        texts: &[&str],
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let mut attempt = 0u32;
        loop {
            attempt += 1;

            match client.post(endpoint).json(&body).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let parsed: EmbeddingResponse =
                            resp.json()
                                .await
                                .map_err(|e| EmbeddingError::MalformedResponse {
                                    message: e.to_string(),
                                })?;

                        let vectors = self.vectors_from_response(parsed, texts.len())?;
                        debug!(batch = texts.len(), "Embedding batch received");
                        return Ok(vectors);
                    }

                    let body_text = resp
                        .text()
                        .await
                        .unwrap_or_else(|_| "<body unavailable>".to_string());

                    if !retryable_status(status) || attempt >= UPSTREAM_RETRIES {
                        return Err(EmbeddingError::Upstream {
                            endpoint: endpoint.to_string(),
                            message: format!("{}: {}", status, body_text),
                        });
                    }

                    warn!(%status, attempt, "Embedding endpoint returned retryable error");
                }
                Err(e) => {
                    if !retryable_transport(&e) || attempt >= UPSTREAM_RETRIES {
                        return Err(EmbeddingError::Upstream {
                            endpoint: endpoint.to_string(),
                            message: e.to_string(),
                        });
                    }

                    warn!(error = %e, attempt, "Embedding request failed, retrying");
                }
            }

            tokio::time::sleep(UPSTREAM_RETRY_BACKOFF * attempt).await;
        }
    }

    /// Reorders rows by index and enforces count and dimension.
    fn vectors_from_response(
        &self,
        response: EmbeddingResponse,
        expected: usize,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if response.data.len() != expected {
            return Err(EmbeddingError::MalformedResponse {
                message: format!(
                    "expected {} embeddings, got {}",
                    expected,
                    response.data.len()
                ),
            });
        }

        let mut rows = response.data;
        rows.sort_by_key(|row| row.index);

        let mut vectors = Vec::with_capacity(rows.len());
        for row in rows {
            if row.embedding.len() != self.dim {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.dim,
                    actual: row.embedding.len(),
                });
            }
            vectors.push(row.embedding);
        }
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        match &self.backend {
            EmbedderBackend::Remote { client, endpoint } => {
                self.embed_remote(client, endpoint, texts).await
            }
            EmbedderBackend::Stub => Ok(texts.iter().map(|t| self.stub_vector(t)).collect()),
        }
    }

    fn dim(&self) -> usize {
        self.dim
    }
}
