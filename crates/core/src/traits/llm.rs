use crate::error::Result;
use async_trait::async_trait;

/// Sampling parameters for one generation call.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 512,
        }
    }
}

/// Text (and optionally vision-grounded) generation. `media` carries the
/// raw bytes of one image or video frame when the call should be grounded
/// in that media (ingestion's context-generation stage); text-only callers
/// (narration, the classifier's fallback) pass `None`. Quota errors are
/// surfaced distinctly from transport errors so callers can decide whether
/// a retry is worthwhile.
#[async_trait]
pub trait LlmAdapter: Send + Sync {
    async fn generate(&self, prompt: &str, media: Option<&[u8]>, params: GenerationParams) -> Result<String>;
}

#[cfg(any(test, feature = "test-util"))]
pub mod fixtures {
    use super::*;

    /// Returns the prompt's own last line as the "generation", so tests can
    /// assert on prompt construction without a real model.
    pub struct EchoLlm;

    #[async_trait]
    impl LlmAdapter for EchoLlm {
        async fn generate(&self, prompt: &str, _media: Option<&[u8]>, _params: GenerationParams) -> Result<String> {
            Ok(prompt.lines().last().unwrap_or_default().to_string())
        }
    }
}
