//! The external adapter contracts (C1). One trait per provider capability;
//! each is polymorphic over `{call, retry-policy, timeout}` in the sense
//! that concrete implementations (in `remind-adapters`) own those concerns
//! behind the narrow async method set declared here.

pub mod audio_decoder;
pub mod embedding;
pub mod face_recognition;
pub mod lipsync;
pub mod llm;
pub mod object_storage;
pub mod sfx;
pub mod stt;
pub mod tts;
pub mod vector_store;
pub mod voice_clone;

pub use audio_decoder::AudioDecoderAdapter;
pub use embedding::EmbeddingAdapter;
pub use face_recognition::FaceRecognitionAdapter;
pub use lipsync::LipSyncAdapter;
pub use llm::{GenerationParams, LlmAdapter};
pub use object_storage::ObjectStorageAdapter;
pub use sfx::{SfxParams, SoundEffectAdapter};
pub use stt::SpeechToTextAdapter;
pub use tts::TtsAdapter;
pub use vector_store::{VectorFilter, VectorStoreAdapter};
pub use voice_clone::VoiceCloneRegistry;
