//! The Experience Composer (C8): therapist-authored scenes retrieved and
//! narrated in sequence, persisted as a read-only bundle a patient can be
//! pointed at by URL. Orchestrates C4 (Retrieval) and C6 (Narration) as a
//! sequential chain of stages over a collection, tolerating a failing item
//! instead of emitting an error frame for it.

use chrono::Utc;
use parking_lot::RwLock;
use remind_config::constants::retrieval as retrieval_defaults;
use remind_core::{new_opaque_id, Experience, RemindError, Result, SceneResult};
use remind_narration::{NarrationBuilder, Style};
use remind_retrieval::RetrievalEngine;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize)]
pub struct ComposeRequest {
    pub title: String,
    pub general_context: String,
    pub scenes: Vec<String>,
    pub top_k: Option<usize>,
}

/// In-process, append-only store of composed experiences. Read-only once an
/// entry exists; there is no update or delete API because Experiences are
/// immutable by contract.
#[derive(Default)]
pub struct ExperienceStore {
    experiences: RwLock<Vec<Experience>>,
}

impl ExperienceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, experience: Experience) -> Experience {
        self.experiences.write().push(experience.clone());
        experience
    }

    pub fn get(&self, experience_id: &str) -> Option<Experience> {
        self.experiences
            .read()
            .iter()
            .find(|e| e.experience_id == experience_id)
            .cloned()
    }

    pub fn get_by_topic(&self, title: &str) -> Option<Experience> {
        let title_lower = title.to_lowercase();
        self.experiences
            .read()
            .iter()
            .find(|e| e.title.to_lowercase() == title_lower)
            .cloned()
    }

    pub fn list(&self) -> Vec<Experience> {
        self.experiences.read().clone()
    }
}

pub struct ExperienceComposer {
    retrieval: Arc<RetrievalEngine>,
    narration: Arc<NarrationBuilder>,
    store: Arc<ExperienceStore>,
}

impl ExperienceComposer {
    pub fn new(retrieval: Arc<RetrievalEngine>, narration: Arc<NarrationBuilder>, store: Arc<ExperienceStore>) -> Self {
        Self {
            retrieval,
            narration,
            store,
        }
    }

    pub async fn compose(&self, request: ComposeRequest) -> Result<Experience> {
        let top_k = request.top_k.unwrap_or(retrieval_defaults::DEFAULT_TOP_K);

        let overall_memories = match self.retrieval.retrieve_memories(&request.general_context, top_k, None).await {
            Ok(memories) => memories,
            Err(e) => {
                tracing::warn!(error = %e, "experience overall retrieval failed, proceeding with no memories");
                Vec::new()
            }
        };
        let overall_narrative = self
            .narration
            .narrate(&request.general_context, &overall_memories, &[], &[], Style::Scene)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "experience overall narration failed, using template fallback");
                overall_memories
                    .first()
                    .map(|m| NarrationBuilder::template_fallback(&m.record.event_name, &m.record.description))
                    .unwrap_or_else(|| NarrationBuilder::template_fallback(&request.title, ""))
            });

        let total_scenes = request.scenes.len();
        let mut failed_scenes = 0usize;
        let mut scenes = Vec::with_capacity(total_scenes);

        for scene in &request.scenes {
            let (memories, retrieval_failed) = match self.retrieval.retrieve_memories(scene, top_k, None).await {
                Ok(memories) => (memories, false),
                Err(e) => {
                    tracing::warn!(scene = %scene, error = %e, "scene retrieval failed, continuing with no memories");
                    (Vec::new(), true)
                }
            };

            let ai_narrative = self
                .narration
                .narrate(scene, &memories, &[], &[], Style::Scene)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(scene = %scene, error = %e, "scene narration failed, using template fallback");
                    memories
                        .first()
                        .map(|m| NarrationBuilder::template_fallback(&m.record.event_name, &m.record.description))
                        .unwrap_or_else(|| NarrationBuilder::template_fallback(scene, ""))
                });

            if retrieval_failed {
                failed_scenes += 1;
            }
            scenes.push(SceneResult {
                scene: scene.clone(),
                memories,
                ai_narrative,
            });
        }

        if total_scenes > 0 && failed_scenes == total_scenes {
            return Err(RemindError::ComposeFailed(format!(
                "all {total_scenes} scenes failed retrieval for experience \"{}\"",
                request.title
            )));
        }

        let mut unique_ids: HashSet<&str> = overall_memories.iter().map(|m| m.record.id.as_str()).collect();
        for scene in &scenes {
            unique_ids.extend(scene.memories.iter().map(|m| m.record.id.as_str()));
        }

        let experience = Experience {
            experience_id: new_opaque_id(),
            title: request.title,
            general_context: request.general_context,
            scenes,
            overall_narrative,
            total_memories: unique_ids.len(),
            created_at: Utc::now(),
        };

        Ok(self.store.insert(experience))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remind_core::traits::embedding::fixtures::FakeEmbedder;
    use remind_core::traits::llm::fixtures::EchoLlm;
    use remind_core::traits::vector_store::fixtures::InMemoryVectorStore;
    use remind_core::{FileType, MemoryRecord};
    use remind_vault::VaultStore;
    use std::collections::BTreeSet;

    fn record(event: &str, file: &str, description: &str) -> MemoryRecord {
        MemoryRecord {
            id: MemoryRecord::derive_id(event, file),
            event_name: event.to_string(),
            file_name: file.to_string(),
            file_type: FileType::Image,
            description: description.to_string(),
            people: BTreeSet::new(),
            event_summary: format!("{event} summary"),
            file_url: format!("https://example/{event}/{file}"),
            orientation: None,
            embedding: None,
        }
    }

    async fn composer_with(records: Vec<MemoryRecord>) -> ExperienceComposer {
        let vault = Arc::new(VaultStore::new(
            Arc::new(FakeEmbedder { dim: 16 }),
            Arc::new(InMemoryVectorStore::new()),
        ));
        for r in records {
            vault.upsert(r).await.unwrap();
        }
        let narration = Arc::new(NarrationBuilder::new(Arc::new(EchoLlm)));
        let retrieval = Arc::new(RetrievalEngine::new(vault, Arc::clone(&narration), 30, "fake-embedder"));
        ExperienceComposer::new(retrieval, narration, Arc::new(ExperienceStore::new()))
    }

    #[tokio::test]
    async fn compose_persists_and_is_retrievable_by_id_and_topic() {
        let composer = composer_with(vec![record("disney trip", "a.png", "a day at the park")]).await;
        let experience = composer
            .compose(ComposeRequest {
                title: "Disney Day".to_string(),
                general_context: "a day at the park".to_string(),
                scenes: vec!["a day at the park".to_string()],
                top_k: None,
            })
            .await
            .unwrap();

        assert_eq!(experience.scenes.len(), 1);
        assert!(experience.total_memories >= 1);
        assert_eq!(experience.patient_url(), format!("/patient/experience/{}", experience.experience_id));

        let store = composer.store.clone();
        assert!(store.get(&experience.experience_id).is_some());
        assert!(store.get_by_topic("disney day").is_some());
    }

    #[tokio::test]
    async fn compose_with_no_scenes_still_succeeds() {
        let composer = composer_with(vec![record("trip", "a.png", "a day at the park")]).await;
        let experience = composer
            .compose(ComposeRequest {
                title: "Empty Scenes".to_string(),
                general_context: "a day at the park".to_string(),
                scenes: vec![],
                top_k: None,
            })
            .await
            .unwrap();
        assert!(experience.scenes.is_empty());
    }

    #[tokio::test]
    async fn total_memories_counts_unique_ids_across_overall_and_scenes() {
        let composer = composer_with(vec![
            record("trip", "a.png", "a day at the park"),
            record("trip", "b.png", "ice cream at the park"),
        ])
        .await;
        let experience = composer
            .compose(ComposeRequest {
                title: "Trip".to_string(),
                general_context: "a day at the park".to_string(),
                scenes: vec!["a day at the park".to_string(), "ice cream at the park".to_string()],
                top_k: Some(5),
            })
            .await
            .unwrap();
        assert!(experience.total_memories <= 2);
    }
}
