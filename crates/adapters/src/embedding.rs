use crate::retry::{with_retry, RetryPolicy};
use async_trait::async_trait;
use remind_core::traits::EmbeddingAdapter;
use remind_core::{RemindError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpEmbeddingConfig {
    pub endpoint: String,
    pub model_name: String,
    pub dimension: usize,
    pub api_key: Option<String>,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Calls an external embedding endpoint over HTTP. Never returns a zero
/// vector: an all-zero response is treated as an upstream invariant
/// violation rather than passed through silently.
pub struct HttpEmbeddingAdapter {
    client: reqwest::Client,
    config: HttpEmbeddingConfig,
    retry_policy: RetryPolicy,
}

impl HttpEmbeddingAdapter {
    pub fn new(client: reqwest::Client, config: HttpEmbeddingConfig) -> Self {
        Self {
            client,
            config,
            retry_policy: RetryPolicy::new(2, Duration::from_millis(200), Duration::from_secs(10)),
        }
    }
}

#[async_trait]
impl EmbeddingAdapter for HttpEmbeddingAdapter {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let text = text.to_string();
        with_retry(self.retry_policy, "embedding", || {
            let text = text.clone();
            async {
                let response = self
                    .client
                    .post(format!("{}/embed", self.config.endpoint))
                    .json(&EmbedRequest {
                        input: &text,
                        model: &self.config.model_name,
                    })
                    .send()
                    .await
                    .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;

                if !response.status().is_success() {
                    return Err(RemindError::ExternalUnavailable(format!(
                        "embedding service returned {}",
                        response.status()
                    )));
                }

                let parsed: EmbedResponse = response
                    .json()
                    .await
                    .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;

                if parsed.embedding.iter().all(|x| *x == 0.0) {
                    return Err(RemindError::InvariantViolation(
                        "embedding service returned a zero vector".into(),
                    ));
                }

                Ok(parsed.embedding)
            }
        })
        .await
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}

/// A dependency-free fallback embedder for local runs without a configured
/// embedding endpoint. Deterministic so repeated ingestion of the same text
/// yields the same vector; not suitable for production relevance quality,
/// only for keeping the server runnable end-to-end without live
/// credentials.
pub struct DeterministicEmbedder {
    pub dimension: usize,
}

#[async_trait]
impl EmbeddingAdapter for DeterministicEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0_f32; self.dimension];
        for (i, byte) in text.bytes().enumerate() {
            v[i % self.dimension] += byte as f32 / 255.0 + 1.0;
        }
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in v.iter_mut() {
                *x /= norm;
            }
        } else {
            v[0] = 1.0;
        }
        Ok(v)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
