use async_trait::async_trait;
use remind_core::traits::{SfxParams, SoundEffectAdapter};
use remind_core::{RemindError, Result};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct HttpSfxConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    duration_seconds: f32,
    prompt_influence: f32,
}

pub struct HttpSoundEffectAdapter {
    client: reqwest::Client,
    config: HttpSfxConfig,
}

impl HttpSoundEffectAdapter {
    pub fn new(client: reqwest::Client, config: HttpSfxConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl SoundEffectAdapter for HttpSoundEffectAdapter {
    async fn generate(&self, prompt: &str, params: SfxParams) -> Result<Vec<u8>> {
        let mut request = self
            .client
            .post(format!("{}/sfx", self.config.endpoint))
            .json(&GenerateRequest {
                prompt,
                duration_seconds: params.duration_s,
                prompt_influence: params.prompt_influence,
            });
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(RemindError::ExternalUnavailable(format!(
                "sound-effects service returned {}",
                response.status()
            )));
        }
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))
    }
}
