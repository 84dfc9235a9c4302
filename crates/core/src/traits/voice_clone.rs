use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// The external voice-clone registry. `name` is always
/// `<DisplayName>_voice_forgetmenot`; uniqueness is enforced by the
/// registry itself.
#[async_trait]
pub trait VoiceCloneRegistry: Send + Sync {
    async fn list(&self) -> Result<HashMap<String, String>>;
    async fn create(&self, name: &str, audio_bytes: Vec<u8>) -> Result<String>;
}
