use async_trait::async_trait;
use remind_core::traits::SpeechToTextAdapter;
use remind_core::{RemindError, Result};
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct HttpSttConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
}

#[derive(Deserialize)]
struct TranscribeResponse {
    text: String,
}

pub struct HttpSpeechToTextAdapter {
    client: reqwest::Client,
    config: HttpSttConfig,
}

impl HttpSpeechToTextAdapter {
    pub fn new(client: reqwest::Client, config: HttpSttConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl SpeechToTextAdapter for HttpSpeechToTextAdapter {
    async fn transcribe(&self, audio_bytes: &[u8]) -> Result<String> {
        let part = reqwest::multipart::Part::bytes(audio_bytes.to_vec()).file_name("audio.wav");
        let form = reqwest::multipart::Form::new().part("audio", part);
        let mut request = self
            .client
            .post(format!("{}/transcribe", self.config.endpoint))
            .multipart(form);
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        let parsed: TranscribeResponse = response
            .json()
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        Ok(parsed.text)
    }
}
