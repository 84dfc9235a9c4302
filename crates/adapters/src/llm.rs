use crate::retry::{with_retry, RetryPolicy};
use async_trait::async_trait;
use base64::Engine;
use remind_core::traits::{GenerationParams, LlmAdapter};
use remind_core::{RemindError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpLlmConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub timeout: Duration,
}

impl Default for HttpLlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            max_retries: 2,
            initial_backoff: Duration::from_millis(300),
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    media_base64: Option<String>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    text: String,
    #[serde(default)]
    quota_exceeded: bool,
}

pub struct HttpLlmAdapter {
    client: reqwest::Client,
    config: HttpLlmConfig,
}

impl HttpLlmAdapter {
    pub fn new(client: reqwest::Client, config: HttpLlmConfig) -> Self {
        Self { client, config }
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.config.max_retries, self.config.initial_backoff, self.config.timeout)
    }
}

#[async_trait]
impl LlmAdapter for HttpLlmAdapter {
    async fn generate(&self, prompt: &str, media: Option<&[u8]>, params: GenerationParams) -> Result<String> {
        let prompt = prompt.to_string();
        let media_base64 = media.map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes));
        with_retry(self.retry_policy(), "llm", || {
            let prompt = prompt.clone();
            let media_base64 = media_base64.clone();
            async {
                let mut request = self.client.post(format!("{}/generate", self.config.endpoint)).json(
                    &GenerateRequest {
                        model: &self.config.model,
                        prompt: &prompt,
                        temperature: params.temperature,
                        max_tokens: params.max_tokens,
                        media_base64,
                    },
                );
                if let Some(ref key) = self.config.api_key {
                    request = request.bearer_auth(key);
                }

                let response = request
                    .send()
                    .await
                    .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;

                if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    return Err(RemindError::QuotaExceeded("llm quota exceeded".into()));
                }
                if !response.status().is_success() {
                    return Err(RemindError::ExternalUnavailable(format!(
                        "llm service returned {}",
                        response.status()
                    )));
                }

                let parsed: GenerateResponse = response
                    .json()
                    .await
                    .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;

                if parsed.quota_exceeded {
                    return Err(RemindError::QuotaExceeded("llm quota exceeded".into()));
                }

                Ok(parsed.text)
            }
        })
        .await
    }
}
