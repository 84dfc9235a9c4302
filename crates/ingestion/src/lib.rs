//! The Ingestion Pipeline (C3): six resumable stages from raw event-folder
//! media to upserted [`remind_core::MemoryRecord`]s. Each stage is its own
//! module and can be driven independently (the CLI's headless two-step) or
//! chained by [`IngestionPipeline`] (the HTTP facade's two ingestion
//! endpoints plus the vault CLI commands).

pub mod context;
pub mod faces;
pub mod mapping;
pub mod media;
pub mod metadata;
pub mod voice;

pub use context::generate_context;
pub use faces::extract_and_cluster;
pub use mapping::{apply_mapping, NameMapping};
pub use media::{classify, list_event_names, load_event_media, MediaFile, MediaKind};
pub use metadata::{build_metadata_rows, read_metadata_csv, write_metadata_csv, MetadataRow};
pub use voice::{extract_solo_voices, provision_voice_clones};

use remind_core::traits::{AudioDecoderAdapter, FaceRecognitionAdapter, LlmAdapter, ObjectStorageAdapter, VoiceCloneRegistry};
use remind_core::{ContextFile, FaceCluster, Result};
use remind_people::PersonRegistry;
use remind_vault::VaultStore;
use serde_json::Value;
use std::sync::Arc;

/// Wires the adapters and stores S1-S5 need, so the HTTP facade and CLI
/// each get one object to call instead of threading five adapters through
/// every handler.
pub struct IngestionPipeline {
    object_store: Arc<dyn ObjectStorageAdapter>,
    face_recognition: Arc<dyn FaceRecognitionAdapter>,
    audio_decoder: Arc<dyn AudioDecoderAdapter>,
    llm: Arc<dyn LlmAdapter>,
    voice_clone_registry: Arc<dyn VoiceCloneRegistry>,
    person_registry: Arc<PersonRegistry>,
    bucket: String,
}

impl IngestionPipeline {
    pub fn new(
        object_store: Arc<dyn ObjectStorageAdapter>,
        face_recognition: Arc<dyn FaceRecognitionAdapter>,
        audio_decoder: Arc<dyn AudioDecoderAdapter>,
        llm: Arc<dyn LlmAdapter>,
        voice_clone_registry: Arc<dyn VoiceCloneRegistry>,
        person_registry: Arc<PersonRegistry>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            object_store,
            face_recognition,
            audio_decoder,
            llm,
            voice_clone_registry,
            person_registry,
            bucket: bucket.into(),
        }
    }

    /// S1: the "extract faces" endpoint/command. Loads every media file
    /// directly under the event folder and returns the sampled-face
    /// review bundle; nothing is persisted, the caregiver reviews this
    /// client-side before calling [`Self::apply_names`].
    pub async fn extract_faces(&self, event_name: &str) -> Result<Vec<FaceCluster>> {
        let files = media::load_event_media(&self.object_store, &self.bucket, event_name).await?;
        faces::extract_and_cluster(&self.face_recognition, &self.audio_decoder, event_name, &files).await
    }

    /// S2 through S5: the "apply names" endpoint/command. Normalizes the
    /// caregiver's mapping into Persons, generates per-file context via
    /// the LLM, extracts solo voice audio, provisions voice clones, then
    /// persists `context.json` and upserts every Person into the
    /// registry. Returns the finalized [`ContextFile`] (the "annotated
    /// archive").
    ///
    /// `event_summary` defaults to `event_name` when absent: the CLI's
    /// `ingest-apply-names <archive> <names.json>` signature carries no
    /// separate channel for a caregiver-authored summary, so nothing
    /// invents one via an extra LLM call.
    pub async fn apply_names(
        &self,
        event_name: &str,
        clusters: &[FaceCluster],
        names_json: &Value,
        event_summary: Option<String>,
    ) -> Result<ContextFile> {
        let mapping = NameMapping::parse(names_json)?;
        let mut people = mapping::apply_mapping(&mapping, clusters)?;

        let files = media::load_event_media(&self.object_store, &self.bucket, event_name).await?;
        let memory_context = event_summary.unwrap_or_else(|| event_name.to_string());

        let context = context::generate_context(&self.llm, event_name, memory_context, &files, &people).await;

        let context_bytes = serde_json::to_vec(&context)
            .map_err(|e| remind_core::RemindError::InvariantViolation(e.to_string()))?;
        self.object_store
            .put(&self.bucket, &format!("{event_name}/context.json"), context_bytes, "application/json")
            .await?;

        let solo_voices = voice::extract_solo_voices(&self.audio_decoder, &context, &files).await?;
        voice::provision_voice_clones(&self.voice_clone_registry, &mut people, &solo_voices).await?;

        for person in people {
            self.person_registry.upsert(person);
        }

        Ok(context)
    }

    /// S6 read side: `vault-build-metadata`.
    pub async fn build_metadata(&self) -> Result<Vec<MetadataRow>> {
        metadata::build_metadata_rows(&self.object_store, &self.bucket).await
    }

    /// S6 write side: `vault-upload`.
    pub async fn upload_metadata(&self, vault: &Arc<VaultStore>, rows: Vec<MetadataRow>) -> Result<usize> {
        metadata::upsert_metadata_rows(vault, rows).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use remind_core::traits::audio_decoder::fixtures::FixedAudioDecoder;
    use remind_core::traits::embedding::fixtures::FakeEmbedder;
    use remind_core::traits::face_recognition::BBox;
    use remind_core::traits::object_storage::fixtures::InMemoryObjectStore;
    use remind_core::traits::vector_store::fixtures::InMemoryVectorStore;
    use remind_core::Result as CoreResult;
    use serde_json::json;
    use std::collections::HashMap;

    struct OneFacePerImage;

    #[async_trait]
    impl FaceRecognitionAdapter for OneFacePerImage {
        async fn locate_and_encode(&self, image: &[u8]) -> CoreResult<Vec<(BBox, Vec<f32>)>> {
            Ok(vec![(BBox { x: 0, y: 0, width: 4, height: 4 }, vec![image.len() as f32])])
        }
        async fn cluster(&self, encodings: &[Vec<f32>], _tolerance: f32) -> CoreResult<Vec<i32>> {
            Ok((0..encodings.len() as i32).collect())
        }
    }

    struct ScriptedLlm;

    #[async_trait]
    impl LlmAdapter for ScriptedLlm {
        async fn generate(
            &self,
            _prompt: &str,
            _media: Option<&[u8]>,
            _params: remind_core::traits::GenerationParams,
        ) -> CoreResult<String> {
            Ok(r#"{"description": "a day at the park", "people": ["steve"], "orientation": null}"#.to_string())
        }
    }

    struct NoVoiceClonesYet;

    #[async_trait]
    impl VoiceCloneRegistry for NoVoiceClonesYet {
        async fn list(&self) -> CoreResult<HashMap<String, String>> {
            Ok(HashMap::new())
        }
        async fn create(&self, name: &str, _audio_bytes: Vec<u8>) -> CoreResult<String> {
            Ok(format!("{name}-id"))
        }
    }

    fn pipeline(object_store: Arc<dyn ObjectStorageAdapter>) -> IngestionPipeline {
        IngestionPipeline::new(
            object_store,
            Arc::new(OneFacePerImage),
            Arc::new(FixedAudioDecoder { frame_count: 1 }),
            Arc::new(ScriptedLlm),
            Arc::new(NoVoiceClonesYet),
            Arc::new(PersonRegistry::new()),
            "bucket",
        )
    }

    #[tokio::test]
    async fn full_pipeline_up_to_vault_upsert() {
        let object_store: Arc<dyn ObjectStorageAdapter> = Arc::new(InMemoryObjectStore::new("https://example"));
        object_store
            .put("bucket", "disney trip/a.png", b"abc".to_vec(), "image/png")
            .await
            .unwrap();
        let pipeline = pipeline(Arc::clone(&object_store));

        let clusters = pipeline.extract_faces("disney trip").await.unwrap();
        assert_eq!(clusters.len(), 1);

        let names = json!({ "steve": clusters[0].cluster_id.to_string() });
        let context = pipeline
            .apply_names("disney trip", &clusters, &names, None)
            .await
            .unwrap();
        assert_eq!(context.get("a.png").unwrap().people, vec!["steve".to_string()]);

        let rows = pipeline.build_metadata().await.unwrap();
        assert_eq!(rows.len(), 1);

        let vault = Arc::new(VaultStore::new(
            Arc::new(FakeEmbedder { dim: 8 }),
            Arc::new(InMemoryVectorStore::new()),
        ));
        let count = pipeline.upload_metadata(&vault, rows).await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(vault.count().await.unwrap(), 1);
    }

    /// An empty `names.json` deletes every cluster (no Persons), so no
    /// file's context entry carries any people — but the file itself still
    /// gets a record (stable id, empty `people`), so re-running the
    /// pipeline with an empty mapping never changes which ids exist in
    /// the Vault, only whether they're attributed to anyone.
    #[tokio::test]
    async fn empty_mapping_produces_unattributed_but_stable_records() {
        let object_store: Arc<dyn ObjectStorageAdapter> = Arc::new(InMemoryObjectStore::new("https://example"));
        object_store
            .put("bucket", "trip/a.png", b"abc".to_vec(), "image/png")
            .await
            .unwrap();
        let pipeline = pipeline(Arc::clone(&object_store));

        let clusters = pipeline.extract_faces("trip").await.unwrap();
        let context = pipeline.apply_names("trip", &clusters, &json!({}), None).await.unwrap();
        assert!(context.get("a.png").unwrap().people.is_empty());

        let rows = pipeline.build_metadata().await.unwrap();
        let vault = Arc::new(VaultStore::new(
            Arc::new(FakeEmbedder { dim: 8 }),
            Arc::new(InMemoryVectorStore::new()),
        ));
        pipeline.upload_metadata(&vault, rows.clone()).await.unwrap();
        pipeline.upload_metadata(&vault, rows).await.unwrap();
        assert_eq!(vault.count().await.unwrap(), 1);
    }
}
