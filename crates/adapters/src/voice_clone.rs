use async_trait::async_trait;
use remind_core::traits::VoiceCloneRegistry;
use remind_core::{RemindError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct HttpVoiceCloneConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
}

#[derive(Deserialize)]
struct ListResponse {
    voices: HashMap<String, String>,
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    name: &'a str,
}

#[derive(Deserialize)]
struct CreateResponse {
    id: String,
}

pub struct HttpVoiceCloneRegistry {
    client: reqwest::Client,
    config: HttpVoiceCloneConfig,
}

impl HttpVoiceCloneRegistry {
    pub fn new(client: reqwest::Client, config: HttpVoiceCloneConfig) -> Self {
        Self { client, config }
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[async_trait]
impl VoiceCloneRegistry for HttpVoiceCloneRegistry {
    async fn list(&self) -> Result<HashMap<String, String>> {
        let request = self
            .authed(self.client.get(format!("{}/voices", self.config.endpoint)));
        let response = request
            .send()
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        let parsed: ListResponse = response
            .json()
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        Ok(parsed.voices)
    }

    async fn create(&self, name: &str, audio_bytes: Vec<u8>) -> Result<String> {
        let part = reqwest::multipart::Part::bytes(audio_bytes).file_name("voice.wav");
        let form = reqwest::multipart::Form::new()
            .text("name", name.to_string())
            .part("audio", part);
        let request = self
            .authed(self.client.post(format!("{}/voices", self.config.endpoint)))
            .multipart(form);
        let response = request
            .send()
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(RemindError::ExternalUnavailable(format!(
                "voice-clone registry returned {}",
                response.status()
            )));
        }
        let parsed: CreateResponse = response
            .json()
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        Ok(parsed.id)
    }
}
