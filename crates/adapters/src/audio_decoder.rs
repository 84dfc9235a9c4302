use async_trait::async_trait;
use remind_core::traits::AudioDecoderAdapter;
use remind_core::{RemindError, Result};
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct HttpAudioDecoderConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
}

pub struct HttpAudioDecoderAdapter {
    client: reqwest::Client,
    config: HttpAudioDecoderConfig,
}

impl HttpAudioDecoderAdapter {
    pub fn new(client: reqwest::Client, config: HttpAudioDecoderConfig) -> Self {
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
impl AudioDecoderAdapter for HttpAudioDecoderAdapter {
    async fn extract_audio(&self, video_bytes: &[u8]) -> Result<Vec<u8>> {
        let request = self
            .authed(self.client.post(format!("{}/extract-audio", self.config.endpoint)))
            .body(video_bytes.to_vec());
        let response = request
            .send()
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))
    }

    async fn concatenate(&self, audio_bytes: &[Vec<u8>]) -> Result<Vec<u8>> {
        let mut form = reqwest::multipart::Form::new();
        for (i, clip) in audio_bytes.iter().enumerate() {
            form = form.part(
                format!("clip{i}"),
                reqwest::multipart::Part::bytes(clip.clone()).file_name(format!("clip{i}.wav")),
            );
        }
        let request = self
            .authed(self.client.post(format!("{}/concatenate", self.config.endpoint)))
            .multipart(form);
        let response = request
            .send()
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))
    }

    async fn sample_frames(&self, video_bytes: &[u8], fps: f32) -> Result<Vec<Vec<u8>>> {
        let request = self
            .authed(
                self.client
                    .post(format!("{}/sample-frames", self.config.endpoint))
                    .query(&[("fps", fps.to_string())]),
            )
            .body(video_bytes.to_vec());
        let response = request
            .send()
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        let parsed: SampleFramesResponse = response
            .json()
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        parsed
            .frames_base64
            .into_iter()
            .map(|b64| {
                base64::Engine::decode(&base64::engine::general_purpose::STANDARD, b64)
                    .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))
            })
            .collect()
    }
}

#[derive(Deserialize)]
struct SampleFramesResponse {
    frames_base64: Vec<String>,
}
