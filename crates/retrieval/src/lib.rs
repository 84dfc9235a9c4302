//! The Retrieval Engine (C4): query embedding, top-K search, a relevance
//! floor, and a grounded synthesis over the result — a Retrieval-level
//! narration distinct from the Patient Runtime's history-aware narration.

use remind_cache::{memory_search_key, TtlCache};
use remind_core::traits::VectorFilter;
use remind_core::{normalize_topic, Result, ScoredMemory};
use remind_narration::{NarrationBuilder, Style};
use remind_vault::VaultStore;
use std::sync::Arc;

const SIMILARITY_FLOOR: f32 = remind_config::constants::retrieval::SIMILARITY_FLOOR;
const MIN_RESULTS: usize = remind_config::constants::retrieval::MIN_RESULTS;

#[derive(Debug, Clone)]
pub struct RetrievalResult {
    pub query: String,
    pub answer: String,
    pub memories: Vec<ScoredMemory>,
    pub model_used: String,
}

fn canonical_filter(filter: &Option<VectorFilter>) -> String {
    match filter {
        None => "none".to_string(),
        Some(f) => {
            let mut people = f.people.clone();
            people.sort();
            format!(
                "event={}&people={}",
                f.event_name.clone().unwrap_or_default(),
                people.join(",")
            )
        }
    }
}

pub struct RetrievalEngine {
    vault: Arc<VaultStore>,
    narration: Arc<NarrationBuilder>,
    cache: TtlCache<Vec<ScoredMemory>>,
    model_used: String,
}

impl RetrievalEngine {
    pub fn new(
        vault: Arc<VaultStore>,
        narration: Arc<NarrationBuilder>,
        cache_ttl_minutes: i64,
        model_used: impl Into<String>,
    ) -> Self {
        Self {
            vault,
            narration,
            cache: TtlCache::new(cache_ttl_minutes),
            model_used: model_used.into(),
        }
    }

    pub async fn retrieve(
        &self,
        query: &str,
        k: usize,
        filter: Option<VectorFilter>,
    ) -> Result<RetrievalResult> {
        let memories = self.retrieve_memories(query, k, filter).await?;

        let answer = self
            .narration
            .narrate(query, &memories, &[], &[], Style::PatientQuery)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "retrieval-level narration failed, falling back to template");
                memories
                    .first()
                    .map(|m| NarrationBuilder::template_fallback(&m.record.event_name, &m.record.description))
                    .unwrap_or_default()
            });

        Ok(RetrievalResult {
            query: query.to_string(),
            answer,
            memories,
            model_used: self.model_used.clone(),
        })
    }

    /// Entry count of the memory-search cache, exposed for the Cache
    /// Layer's `/cache/stats` facade route.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Drops every cached memory-search result, for the Cache Layer's
    /// `/cache/clear` facade route.
    pub fn clear_cache(&self) {
        self.cache.clear()
    }

    /// The memory-search half of retrieval, used standalone by the Patient
    /// Query Runtime and the Experience Composer (both of which layer
    /// their own narration call on top with history/anti-repeat inputs
    /// this engine doesn't see).
    pub async fn retrieve_memories(
        &self,
        query: &str,
        k: usize,
        filter: Option<VectorFilter>,
    ) -> Result<Vec<ScoredMemory>> {
        let normalized = normalize_topic(query);
        let cache_key = memory_search_key(&normalized, k, &canonical_filter(&filter));

        if let Some(cached) = self.cache.get(&cache_key) {
            return Ok(cached);
        }

        let raw = self.vault.search(query, k, filter).await?;

        let mut scored: Vec<ScoredMemory> = raw
            .into_iter()
            .map(|(record, similarity)| ScoredMemory { record, similarity })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.record.event_name.cmp(&b.record.event_name))
                .then_with(|| a.record.file_name.cmp(&b.record.file_name))
        });

        let above_floor = scored.iter().filter(|m| m.similarity >= SIMILARITY_FLOOR).count();
        if above_floor >= MIN_RESULTS {
            scored.retain(|m| m.similarity >= SIMILARITY_FLOOR);
        } else {
            scored.truncate(scored.len().min(MIN_RESULTS.max(above_floor)));
        }

        self.cache.put(cache_key, scored.clone());
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remind_core::traits::embedding::fixtures::FakeEmbedder;
    use remind_core::traits::llm::fixtures::EchoLlm;
    use remind_core::traits::vector_store::fixtures::InMemoryVectorStore;
    use remind_core::{FileType, MemoryRecord};
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

    async fn engine_with(records: Vec<MemoryRecord>) -> RetrievalEngine {
        let vault = Arc::new(VaultStore::new(
            Arc::new(FakeEmbedder { dim: 16 }),
            Arc::new(InMemoryVectorStore::new()),
        ));
        for r in records {
            vault.upsert(r).await.unwrap();
        }
        let narration = Arc::new(NarrationBuilder::new(Arc::new(EchoLlm)));
        RetrievalEngine::new(vault, narration, 30, "fake-embedder")
    }

    #[tokio::test]
    async fn similarities_are_monotonically_non_increasing() {
        let engine = engine_with(vec![
            record("disney trip", "a.png", "mickey mouse cinnamon roll"),
            record("disney trip", "b.png", "fireworks castle"),
            record("disney trip", "c.png", "teacups ride"),
        ])
        .await;

        let memories = engine
            .retrieve_memories("mickey mouse cinnamon roll", 5, None)
            .await
            .unwrap();
        for pair in memories.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[tokio::test]
    async fn keeps_min_results_even_below_floor() {
        // Three records whose text shares nothing with the query, so raw
        // cosine similarity against a deterministic hash-embedder should
        // stay low; we still expect at least MIN_RESULTS back.
        let engine = engine_with(vec![
            record("trip", "a.png", "alpha"),
            record("trip", "b.png", "beta"),
            record("trip", "c.png", "gamma"),
        ])
        .await;

        let memories = engine.retrieve_memories("zzz completely unrelated", 5, None).await.unwrap();
        assert!(memories.len() >= 1);
    }

    #[tokio::test]
    async fn retrieve_includes_answer_and_model_used() {
        let engine = engine_with(vec![record("trip", "a.png", "a day at the park")]).await;
        let result = engine.retrieve("a day at the park", 5, None).await.unwrap();
        assert_eq!(result.model_used, "fake-embedder");
        assert_eq!(result.query, "a day at the park");
    }
}
