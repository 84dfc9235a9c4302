use async_trait::async_trait;
use remind_core::traits::LipSyncAdapter;
use remind_core::{RemindError, Result};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpLipSyncConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for HttpLipSyncConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9100".to_string(),
            api_key: None,
            timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    video_url: String,
}

/// Lip-sync is long-running; this adapter owns no polling loop of its own
/// (the external service's response contract is assumed to resolve once
/// the video is ready) but enforces its configured timeout and never
/// retries on expiry, since lip-sync generation is cost-sensitive.
pub struct HttpLipSyncAdapter {
    client: reqwest::Client,
    config: HttpLipSyncConfig,
}

impl HttpLipSyncAdapter {
    pub fn new(client: reqwest::Client, config: HttpLipSyncConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl LipSyncAdapter for HttpLipSyncAdapter {
    async fn generate(&self, image_or_video_url: &str, audio: Vec<u8>) -> Result<String> {
        let audio_part = reqwest::multipart::Part::bytes(audio).file_name("audio.mp3");
        let form = reqwest::multipart::Form::new()
            .text("source_url", image_or_video_url.to_string())
            .part("audio", audio_part);

        let mut request = self
            .client
            .post(format!("{}/generate", self.config.endpoint))
            .multipart(form);
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }

        let call = request.send();
        let response = tokio::time::timeout(self.config.timeout, call)
            .await
            .map_err(|_| RemindError::Timeout("lip-sync generation timed out".into()))?
            .map_err(|e| RemindError::LipSyncUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RemindError::LipSyncUnavailable(format!(
                "lip-sync service returned {}",
                response.status()
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| RemindError::LipSyncUnavailable(e.to_string()))?;
        Ok(parsed.video_url)
    }
}
