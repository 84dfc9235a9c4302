use crate::error::Result;
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct SfxParams {
    pub duration_s: f32,
    pub prompt_influence: f32,
}

/// Generative sound effects, used for mood-appropriate background audio.
#[async_trait]
pub trait SoundEffectAdapter: Send + Sync {
    async fn generate(&self, prompt: &str, params: SfxParams) -> Result<Vec<u8>>;
}
