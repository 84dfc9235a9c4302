use crate::error::Result;
use async_trait::async_trait;

/// Text-to-speech. Output is always `audio/mpeg`.
#[async_trait]
pub trait TtsAdapter: Send + Sync {
    async fn synthesize(&self, text: &str, voice_name: &str) -> Result<Vec<u8>>;
}
