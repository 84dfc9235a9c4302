use async_trait::async_trait;
use base64::Engine;
use remind_core::traits::face_recognition::BBox;
use remind_core::traits::FaceRecognitionAdapter;
use remind_core::{RemindError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct HttpFaceRecognitionConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
}

#[derive(Serialize)]
struct LocateRequest {
    image_base64: String,
}

#[derive(Deserialize)]
struct LocateResponseEntry {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    encoding: Vec<f32>,
}

#[derive(Serialize)]
struct ClusterRequest<'a> {
    encodings: &'a [Vec<f32>],
    tolerance: f32,
}

#[derive(Deserialize)]
struct ClusterResponse {
    labels: Vec<i32>,
}

pub struct HttpFaceRecognitionAdapter {
    client: reqwest::Client,
    config: HttpFaceRecognitionConfig,
}

impl HttpFaceRecognitionAdapter {
    pub fn new(client: reqwest::Client, config: HttpFaceRecognitionConfig) -> Self {
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
impl FaceRecognitionAdapter for HttpFaceRecognitionAdapter {
    async fn locate_and_encode(&self, image: &[u8]) -> Result<Vec<(BBox, Vec<f32>)>> {
        let image_base64 = base64::engine::general_purpose::STANDARD.encode(image);
        let request = self
            .authed(self.client.post(format!("{}/locate", self.config.endpoint)))
            .json(&LocateRequest { image_base64 });
        let response = request
            .send()
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        let entries: Vec<LocateResponseEntry> = response
            .json()
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        Ok(entries
            .into_iter()
            .map(|e| {
                (
                    BBox {
                        x: e.x,
                        y: e.y,
                        width: e.width,
                        height: e.height,
                    },
                    e.encoding,
                )
            })
            .collect())
    }

    async fn cluster(&self, encodings: &[Vec<f32>], tolerance: f32) -> Result<Vec<i32>> {
        let request = self
            .authed(self.client.post(format!("{}/cluster", self.config.endpoint)))
            .json(&ClusterRequest { encodings, tolerance });
        let response = request
            .send()
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        let parsed: ClusterResponse = response
            .json()
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        Ok(parsed.labels)
    }
}
