//! Cross-encoder rescoring capability.
//!
//! A cross-encoder attends to the query and candidate jointly, so its scores
//! refine the coarse hybrid ranking. Scoring goes through an HTTP rerank
//! endpoint in batches; without an endpoint a lexical-overlap stub stands in.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::{UPSTREAM_RETRIES, UPSTREAM_RETRY_BACKOFF};
use crate::upstream::{build_client, retryable_status, retryable_transport};

pub mod error;


pub use error::RerankError;

pub const DEFAULT_RERANK_MODEL: &str = "BAAI/bge-reranker-base";
pub const DEFAULT_RERANK_BATCH: usize = 128;

/// Cross-encoder settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RerankConfig {
    pub model: String,
    /// Pairs submitted per request.
    pub batch_size: usize,
    /// Half-precision hint forwarded to the service.
    pub fp16: bool,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_RERANK_MODEL.to_string(),
            batch_size: DEFAULT_RERANK_BATCH,
            fp16: true,
        }
    }
}

impl RerankConfig {
    pub fn validate(&self) -> Result<(), RerankError> {
        if self.model.trim().is_empty() {
            return Err(RerankError::InvalidConfig {
                reason: "model must not be empty".to_string(),
            });
        }
        if self.batch_size == 0 {
            return Err(RerankError::InvalidConfig {
                reason: "batch_size must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Joint (query, text) scoring capability. One score per text, input order.
#[async_trait]
pub trait CrossEncoder: Send + Sync {
    async fn score(&self, query: &str, texts: &[&str]) -> Result<Vec<f32>, RerankError>;
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    texts: &'a [&'a str],
    fp16: bool,
}

#[derive(Deserialize)]
struct RerankResponse {
    scores: Vec<f32>,
}

enum RerankBackend {
    Remote {
        client: reqwest::Client,
        endpoint: String,
    },
    Stub,
}

/// Cross-encoder backed by an HTTP rerank endpoint, with a lexical-overlap
/// stub when none is configured.
pub struct HttpCrossEncoder {
    backend: RerankBackend,
    config: RerankConfig,
}

impl HttpCrossEncoder {
    /// Builds a remote scorer for `base_url`.
    pub fn remote(base_url: &str, config: RerankConfig) -> Result<Self, RerankError> {
        config.validate()?;
        let client = build_client().map_err(|e| RerankError::ClientBuild {
            message: e.to_string(),
        })?;
        Ok(Self {
            backend: RerankBackend::Remote {
                client,
                endpoint: format!("{}/rerank", base_url.trim_end_matches('/')),
            },
            config,
        })
    }

    /// Builds the offline stub scorer.
    pub fn stub(config: RerankConfig) -> Result<Self, RerankError> {
        config.validate()?;
        warn!("No rerank endpoint configured; using lexical-overlap stub scores");
        Ok(Self {
            backend: RerankBackend::Stub,
            config,
        })
    }

    async fn score_remote(
        &self,
        client: &reqwest::Client,
        endpoint: &str,
        query: &str,
        texts: &[&str],
    ) -> Result<Vec<f32>, RerankError> {
        let mut scores = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.batch_size) {
            let batch_scores = self
                .score_batch(client, endpoint, query, batch)
                .await?;
            if batch_scores.len() != batch.len() {
                return Err(RerankError::MalformedResponse {
                    message: format!(
                        "expected {} scores, got {}",
                        batch.len(),
                        batch_scores.len()
                    ),
                });
            }
            scores.extend(batch_scores);
        }
        Ok(scores)
    }

    async fn score_batch(
        &self,
        client: &reqwest::Client,
        endpoint: &str,
        query: &str,
        texts: &[&str],
    ) -> Result<Vec<f32>, RerankError> {
        let body = RerankRequest {
            model: &self.config.model,
            query,
            texts,
            fp16: self.config.fp16,
        };

        let mut attempt = 0u32;
        loop {
            attempt += 1;

            match client.post(endpoint).json(&body).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let parsed: RerankResponse =
                            resp.json()
                                .await
                                .map_err(|e| RerankError::MalformedResponse {
                                    message: e.to_string(),
                                })?;

                        debug!(batch = texts.len(), "Rerank batch scored");
                        return Ok(parsed.scores);
                    }

                    let body_text = resp
                        .text()
                        .await
                        .unwrap_or_else(|_| "<body unavailable>".to_string());

                    if !retryable_status(status) || attempt >= UPSTREAM_RETRIES {
                        return Err(RerankError::Upstream {
                            endpoint: endpoint.to_string(),
                            message: format!("{}: {}", status, body_text),
                        });
                    }

                    warn!(%status, attempt, "Rerank endpoint returned retryable error");
                }
                Err(e) => {
                    if !retryable_transport(&e) || attempt >= UPSTREAM_RETRIES {
                        return Err(RerankError::Upstream {
                            endpoint: endpoint.to_string(),
                            message: e.to_string(),
                        });
                    }

                    warn!(error = %e, attempt, "Rerank request failed, retrying");
                }
            }

            tokio::time::sleep(UPSTREAM_RETRY_BACKOFF * attempt).await;
        }
    }
}

#[async_trait]
impl CrossEncoder for HttpCrossEncoder {
    async fn score(&self, query: &str, texts: &[&str]) -> Result<Vec<f32>, RerankError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        match &self.backend {
            RerankBackend::Remote { client, endpoint } => {
                self.score_remote(client, endpoint, query, texts).await
            }
            RerankBackend::Stub => Ok(texts
                .iter()
                .map(|text| lexical_overlap(query, text))
                .collect()),
        }
    }
}

/// Jaccard overlap of lowercased whitespace tokens. Stub-quality relevance,
/// deterministic and bounded to `[0, 1]`.
fn lexical_overlap(query: &str, text: &str) -> f32 {
    let q: HashSet<String> = query.split_whitespace().map(str::to_lowercase).collect();
    let t: HashSet<String> = text.split_whitespace().map(str::to_lowercase).collect();
    let union = q.union(&t).count();
    if union == 0 {
        return 0.0;
    }
    q.intersection(&t).count() as f32 / union as f32
}
