//! Config & Lifecycle (C12): scoped acquisition of every adapter client and
//! business component at startup, bundled into one `AppState` handlers
//! share by `Clone` (every field is an `Arc`, so cloning is cheap and the
//! settings themselves are read-only for the life of the process — no
//! locks needed on `Settings` itself).
//!
//! Release is RAII: every adapter is a plain `reqwest::Client`-backed
//! struct behind an `Arc`, so dropping the last `AppState` clone (at
//! process exit) releases connection pools in reverse acquisition order
//! without any explicit teardown code.

use remind_adapters::{
    DeterministicEmbedder, HttpAudioDecoderAdapter, HttpAudioDecoderConfig, HttpEmbeddingAdapter,
    HttpEmbeddingConfig, HttpFaceRecognitionAdapter, HttpFaceRecognitionConfig, HttpLipSyncAdapter,
    HttpLipSyncConfig, HttpLlmAdapter, HttpLlmConfig, HttpObjectStorageAdapter, HttpObjectStoreConfig,
    HttpSfxConfig, HttpSoundEffectAdapter, HttpSpeechToTextAdapter, HttpSttConfig, HttpTtsAdapter,
    HttpTtsConfig, HttpVoiceCloneConfig, HttpVoiceCloneRegistry, LocalFsObjectStore, QdrantConfig,
    QdrantVectorStore,
};
use remind_classifier::Classifier;
use remind_config::Settings;
use remind_core::traits::{
    AudioDecoderAdapter, EmbeddingAdapter, FaceRecognitionAdapter, LipSyncAdapter, LlmAdapter,
    ObjectStorageAdapter, SoundEffectAdapter, SpeechToTextAdapter, TtsAdapter, VectorStoreAdapter,
    VoiceCloneRegistry,
};
use remind_experience::{ExperienceComposer, ExperienceStore};
use remind_history::ConversationHistoryStore;
use remind_ingestion::IngestionPipeline;
use remind_narration::NarrationBuilder;
use remind_people::PersonRegistry;
use remind_retrieval::RetrievalEngine;
use remind_runtime::PatientQueryRuntime;
use remind_vault::VaultStore;
use std::sync::Arc;

/// Everything a handler needs, acquired once in [`AppState::bootstrap`] and
/// shared by cheap `Clone`.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub object_store: Arc<dyn ObjectStorageAdapter>,
    pub face_recognition: Arc<dyn FaceRecognitionAdapter>,
    pub audio_decoder: Arc<dyn AudioDecoderAdapter>,
    pub voice_clone_registry: Arc<dyn VoiceCloneRegistry>,
    pub stt: Arc<dyn SpeechToTextAdapter>,
    pub tts: Arc<dyn TtsAdapter>,
    pub lipsync: Arc<dyn LipSyncAdapter>,
    pub sfx: Arc<dyn SoundEffectAdapter>,
    pub vault: Arc<VaultStore>,
    pub people: Arc<PersonRegistry>,
    pub ingestion: Arc<IngestionPipeline>,
    pub retrieval: Arc<RetrievalEngine>,
    pub classifier: Arc<Classifier>,
    pub narration: Arc<NarrationBuilder>,
    pub history: Arc<ConversationHistoryStore>,
    pub experience_store: Arc<ExperienceStore>,
    pub experience_composer: Arc<ExperienceComposer>,
    pub runtime: Arc<PatientQueryRuntime>,
}

impl AppState {
    /// Builds every adapter named in the configured endpoints, then wires
    /// them into the business-layer components (C2-C10). The embedding and
    /// object-storage adapters fall back to dependency-free local
    /// implementations outside a strict (`staging`/`production`)
    /// environment when no endpoint/bucket is configured, so the whole
    /// pipeline is runnable without live credentials in development.
    pub fn bootstrap(settings: Settings) -> Self {
        let http = reqwest::Client::new();
        let strict = settings.environment.is_strict();

        let embedder: Arc<dyn EmbeddingAdapter> = if !strict && settings.embedding.api_key.is_none() {
            tracing::warn!("no embedding credentials configured, using deterministic local embedder");
            Arc::new(DeterministicEmbedder {
                dimension: settings.embedding.dimension,
            })
        } else {
            Arc::new(HttpEmbeddingAdapter::new(
                http.clone(),
                HttpEmbeddingConfig {
                    endpoint: settings.embedding.endpoint.clone(),
                    model_name: settings.embedding.model_name.clone(),
                    dimension: settings.embedding.dimension,
                    api_key: settings.embedding.api_key.clone(),
                },
            ))
        };

        let vector_store: Arc<dyn VectorStoreAdapter> = match QdrantVectorStore::new(QdrantConfig {
            endpoint: settings.vector_store.endpoint.clone(),
            collection: settings.vector_store.collection.clone(),
            vector_dim: settings.embedding.dimension,
            api_key: settings.vector_store.api_key.clone(),
        }) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::warn!(error = %e, "failed to construct qdrant client, falling back to in-memory vector store");
                Arc::new(remind_core::traits::vector_store::fixtures::InMemoryVectorStore::new())
            }
        };

        let object_store: Arc<dyn ObjectStorageAdapter> = match &settings.object_store.endpoint {
            Some(endpoint) => Arc::new(HttpObjectStorageAdapter::new(
                http.clone(),
                HttpObjectStoreConfig {
                    endpoint: endpoint.clone(),
                    credentials: settings.object_store.credentials.clone(),
                    public_base_url: settings.object_store.public_base_url.clone(),
                },
            )),
            None => {
                if strict {
                    tracing::error!("no object store endpoint configured in a strict environment");
                }
                tracing::warn!(root = %settings.object_store.local_root, "no object store endpoint configured, using local filesystem store");
                Arc::new(LocalFsObjectStore::new(
                    settings.object_store.local_root.clone(),
                    settings.object_store.public_base_url.clone(),
                ))
            }
        };

        let llm: Arc<dyn LlmAdapter> = Arc::new(HttpLlmAdapter::new(
            http.clone(),
            HttpLlmConfig {
                endpoint: settings.llm.endpoint.clone(),
                model: settings.llm.model.clone(),
                api_key: settings.llm.api_key.clone(),
                ..HttpLlmConfig::default()
            },
        ));

        let tts: Arc<dyn TtsAdapter> = Arc::new(HttpTtsAdapter::new(
            http.clone(),
            HttpTtsConfig {
                endpoint: settings.external_apis.tts_endpoint.clone(),
                api_key: settings.external_apis.tts_api_key.clone(),
            },
        ));
        let lipsync: Arc<dyn LipSyncAdapter> = Arc::new(HttpLipSyncAdapter::new(
            http.clone(),
            HttpLipSyncConfig {
                endpoint: settings.external_apis.lipsync_endpoint.clone(),
                api_key: settings.external_apis.lipsync_api_key.clone(),
                ..HttpLipSyncConfig::default()
            },
        ));
        let sfx: Arc<dyn SoundEffectAdapter> = Arc::new(HttpSoundEffectAdapter::new(
            http.clone(),
            HttpSfxConfig {
                endpoint: settings.external_apis.sfx_endpoint.clone(),
                api_key: settings.external_apis.sfx_api_key.clone(),
            },
        ));
        let stt: Arc<dyn SpeechToTextAdapter> = Arc::new(HttpSpeechToTextAdapter::new(
            http.clone(),
            HttpSttConfig {
                endpoint: settings.external_apis.stt_endpoint.clone(),
                api_key: settings.external_apis.stt_api_key.clone(),
            },
        ));
        let voice_clone_registry: Arc<dyn VoiceCloneRegistry> = Arc::new(HttpVoiceCloneRegistry::new(
            http.clone(),
            HttpVoiceCloneConfig {
                endpoint: settings.external_apis.voice_clone_endpoint.clone(),
                api_key: settings.external_apis.voice_clone_api_key.clone(),
            },
        ));
        let face_recognition: Arc<dyn FaceRecognitionAdapter> = Arc::new(HttpFaceRecognitionAdapter::new(
            http.clone(),
            HttpFaceRecognitionConfig {
                endpoint: settings.external_apis.face_recognition_endpoint.clone(),
                api_key: settings.external_apis.face_recognition_api_key.clone(),
            },
        ));
        let audio_decoder: Arc<dyn AudioDecoderAdapter> = Arc::new(HttpAudioDecoderAdapter::new(
            http.clone(),
            HttpAudioDecoderConfig {
                endpoint: settings.external_apis.audio_decoder_endpoint.clone(),
                api_key: settings.external_apis.audio_decoder_api_key.clone(),
            },
        ));

        let vault = Arc::new(VaultStore::new(Arc::clone(&embedder), vector_store));
        let people = Arc::new(PersonRegistry::new());
        let bucket = settings.object_store.bucket.clone().unwrap_or_else(|| "remind".to_string());
        let ingestion = Arc::new(IngestionPipeline::new(
            Arc::clone(&object_store),
            Arc::clone(&face_recognition),
            Arc::clone(&audio_decoder),
            Arc::clone(&llm),
            Arc::clone(&voice_clone_registry),
            Arc::clone(&people),
            bucket,
        ));

        let narration = Arc::new(NarrationBuilder::new(Arc::clone(&llm)));
        let retrieval = Arc::new(RetrievalEngine::new(
            Arc::clone(&vault),
            Arc::clone(&narration),
            settings.cache.ttl_minutes,
            settings.embedding.model_name.clone(),
        ));
        let classifier = Arc::new(Classifier::new(Arc::clone(&llm), settings.cache.ttl_minutes));
        let history = Arc::new(ConversationHistoryStore::new(
            settings.history.window_turns,
            settings.history.ttl_hours,
        ));
        let experience_store = Arc::new(ExperienceStore::new());
        let experience_composer = Arc::new(ExperienceComposer::new(
            Arc::clone(&retrieval),
            Arc::clone(&narration),
            Arc::clone(&experience_store),
        ));
        let runtime = Arc::new(PatientQueryRuntime::new(
            Arc::clone(&retrieval),
            Arc::clone(&classifier),
            Arc::clone(&narration),
            Arc::clone(&history),
            Arc::clone(&people),
            Arc::clone(&stt),
            Arc::clone(&tts),
            Arc::clone(&lipsync),
        ));

        Self {
            settings: Arc::new(settings),
            object_store,
            face_recognition,
            audio_decoder,
            voice_clone_registry,
            stt,
            tts,
            lipsync,
            sfx,
            vault,
            people,
            ingestion,
            retrieval,
            classifier,
            narration,
            history,
            experience_store,
            experience_composer,
            runtime,
        }
    }
}
