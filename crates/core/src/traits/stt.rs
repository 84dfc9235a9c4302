use crate::error::Result;
use async_trait::async_trait;

/// Speech-to-text, used by the Patient Query Runtime when a request arrives
/// as audio rather than a transcript.
#[async_trait]
pub trait SpeechToTextAdapter: Send + Sync {
    async fn transcribe(&self, audio_bytes: &[u8]) -> Result<String>;
}

#[cfg(any(test, feature = "test-util"))]
pub mod fixtures {
    use super::*;

    /// Returns a fixed transcript regardless of input, for runtime tests
    /// that only care about the orchestration around transcription.
    pub struct FixedTranscriptStt {
        pub transcript: String,
    }

    #[async_trait]
    impl SpeechToTextAdapter for FixedTranscriptStt {
        async fn transcribe(&self, _audio_bytes: &[u8]) -> Result<String> {
            Ok(self.transcript.clone())
        }
    }
}
