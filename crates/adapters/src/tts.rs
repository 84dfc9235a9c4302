use crate::retry::{with_retry, RetryPolicy};
use async_trait::async_trait;
use remind_core::traits::TtsAdapter;
use remind_core::{RemindError, Result};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpTtsConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
}

#[derive(Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    voice: &'a str,
}

pub struct HttpTtsAdapter {
    client: reqwest::Client,
    config: HttpTtsConfig,
}

impl HttpTtsAdapter {
    pub fn new(client: reqwest::Client, config: HttpTtsConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl TtsAdapter for HttpTtsAdapter {
    async fn synthesize(&self, text: &str, voice_name: &str) -> Result<Vec<u8>> {
        let policy = RetryPolicy::new(1, Duration::from_millis(300), Duration::from_secs(60));
        let text = text.to_string();
        let voice_name = voice_name.to_string();
        with_retry(policy, "tts", || {
            let text = text.clone();
            let voice_name = voice_name.clone();
            async move {
                let mut request = self
                    .client
                    .post(format!("{}/synthesize", self.config.endpoint))
                    .json(&SynthesizeRequest {
                        text: &text,
                        voice: &voice_name,
                    });
                if let Some(ref key) = self.config.api_key {
                    request = request.bearer_auth(key);
                }

                let response = request
                    .send()
                    .await
                    .map_err(|e| RemindError::TtsUnavailable(e.to_string()))?;
                if !response.status().is_success() {
                    return Err(RemindError::TtsUnavailable(format!(
                        "tts service returned {}",
                        response.status()
                    )));
                }
                response
                    .bytes()
                    .await
                    .map(|b| b.to_vec())
                    .map_err(|e| RemindError::TtsUnavailable(e.to_string()))
            }
        })
        .await
    }
}
