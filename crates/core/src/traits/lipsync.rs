use crate::error::Result;
use async_trait::async_trait;

/// Lip-sync generation. May be long-running; the adapter implementation
/// owns any internal polling and simply resolves when the final video is
/// ready. Callers must not retry on timeout (cost-sensitive).
#[async_trait]
pub trait LipSyncAdapter: Send + Sync {
    async fn generate(&self, image_or_video_url: &str, audio: Vec<u8>) -> Result<String>;
}
