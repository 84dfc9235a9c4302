use crate::error::Result;
use async_trait::async_trait;

/// Audio extraction/concatenation, used by ingestion stage S4. The same
/// demux capability also samples video frames for S1's face extraction —
/// there's no separate frame-sampling service, and a decoder that can
/// demux an audio track can demux frames at a cadence — so that operation
/// lives here too rather than inventing an eleventh adapter.
#[async_trait]
pub trait AudioDecoderAdapter: Send + Sync {
    async fn extract_audio(&self, video_bytes: &[u8]) -> Result<Vec<u8>>;

    /// Concatenates clips in the given order; callers are responsible for
    /// deterministic ordering (sorted by `file_name`) before calling this.
    async fn concatenate(&self, audio_bytes: &[Vec<u8>]) -> Result<Vec<u8>>;

    /// Samples frames from `video_bytes` at `fps`, returned as encoded
    /// still-image bytes in presentation order.
    async fn sample_frames(&self, video_bytes: &[u8], fps: f32) -> Result<Vec<Vec<u8>>>;
}

#[cfg(any(test, feature = "test-util"))]
pub mod fixtures {
    use super::*;

    /// A fake decoder for tests: "extracts" by returning the input bytes
    /// unchanged, "concatenates" by joining with a separator, and "samples"
    /// by returning one fixed frame per configured count.
    pub struct FixedAudioDecoder {
        pub frame_count: usize,
    }

    #[async_trait]
    impl AudioDecoderAdapter for FixedAudioDecoder {
        async fn extract_audio(&self, video_bytes: &[u8]) -> Result<Vec<u8>> {
            Ok(video_bytes.to_vec())
        }

        async fn concatenate(&self, audio_bytes: &[Vec<u8>]) -> Result<Vec<u8>> {
            Ok(audio_bytes.concat())
        }

        async fn sample_frames(&self, video_bytes: &[u8], _fps: f32) -> Result<Vec<Vec<u8>>> {
            Ok(std::iter::repeat(video_bytes.to_vec()).take(self.frame_count).collect())
        }
    }
}
