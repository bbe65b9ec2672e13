//! OpenAI-compatible chat client.
//!
//! One transport for both LLM touchpoints: the continuity oracle during
//! segmentation and the optional support verifier during export.

pub mod error;

pub use error::LlmError;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::{UPSTREAM_RETRIES, UPSTREAM_RETRY_BACKOFF};
use crate::upstream::{build_client, retryable_status, retryable_transport};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: usize,
    stream: bool,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

/// Chat-completions client for an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl ChatClient {
    /// Builds a client for `base_url` (e.g. `http://localhost:11434/v1`).
    pub fn new(base_url: &str, model: &str) -> Result<Self, LlmError> {
        let client = build_client().map_err(|e| LlmError::ClientBuild {
            message: e.to_string(),
        })?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.to_string(),
        })
    }

    /// Returns the configured model id.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends one system+user exchange and returns the first choice's content.
    ///
    /// Transient failures (connect/timeout errors, 429, 5xx) are retried a
    /// bounded number of times with growing backoff; everything else fails
    /// immediately as [`LlmError::Upstream`].
    pub async fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
        max_tokens: usize,
    ) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            temperature,
            max_tokens,
            stream: false,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let mut attempt = 0u32;
        loop {
            attempt += 1;

            match self.client.post(&self.endpoint).json(&body).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let parsed: ChatResponse =
                            resp.json()
                                .await
                                .map_err(|e| LlmError::MalformedResponse {
                                    message: e.to_string(),
                                })?;

                        let content = parsed
                            .choices
                            .into_iter()
                            .next()
                            .map(|choice| choice.message.content)
                            .unwrap_or_default();

                        debug!(chars = content.len(), "Chat completion received");
                        return Ok(content);
                    }

                    let body_text = resp
                        .text()
                        .await
                        .unwrap_or_else(|_| "<body unavailable>".to_string());

                    if !retryable_status(status) || attempt >= UPSTREAM_RETRIES {
                        return Err(LlmError::Upstream {
                            endpoint: self.endpoint.clone(),
                            message: format!("{}: {}", status, body_text),
                        });
                    }

                    warn!(%status, attempt, "Chat endpoint returned retryable error");
                }
                Err(e) => {
                    if !retryable_transport(&e) || attempt >= UPSTREAM_RETRIES {
                        return Err(LlmError::Upstream {
                            endpoint: self.endpoint.clone(),
                            message: e.to_string(),
                        });
                    }

                    warn!(error = %e, attempt, "Chat request failed, retrying");
                }
            }

            tokio::time::sleep(UPSTREAM_RETRY_BACKOFF * attempt).await;
        }
    }
}
