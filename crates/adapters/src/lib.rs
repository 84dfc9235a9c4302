//! Concrete implementations of the adapter contracts declared in
//! `remind_core::traits` (C1): one HTTP-backed client per external
//! provider, plus a handful of dependency-free fallbacks
//! (`DeterministicEmbedder`, `LocalFsObjectStore`) for running the server
//! end-to-end without live credentials.

pub mod audio_decoder;
pub mod embedding;
pub mod face_recognition;
pub mod lipsync;
pub mod llm;
pub mod object_storage;
pub mod retry;
pub mod sfx;
pub mod stt;
pub mod tts;
pub mod vector_store;
pub mod voice_clone;

pub use audio_decoder::{HttpAudioDecoderAdapter, HttpAudioDecoderConfig};
pub use embedding::{DeterministicEmbedder, HttpEmbeddingAdapter, HttpEmbeddingConfig};
pub use face_recognition::{HttpFaceRecognitionAdapter, HttpFaceRecognitionConfig};
pub use lipsync::{HttpLipSyncAdapter, HttpLipSyncConfig};
pub use llm::{HttpLlmAdapter, HttpLlmConfig};
pub use object_storage::{HttpObjectStorageAdapter, HttpObjectStoreConfig, LocalFsObjectStore};
pub use retry::{with_retry, RetryPolicy};
pub use sfx::{HttpSfxConfig, HttpSoundEffectAdapter};
pub use stt::{HttpSpeechToTextAdapter, HttpSttConfig};
pub use tts::{HttpTtsAdapter, HttpTtsConfig};
pub use vector_store::{QdrantConfig, QdrantVectorStore};
pub use voice_clone::{HttpVoiceCloneConfig, HttpVoiceCloneRegistry};
