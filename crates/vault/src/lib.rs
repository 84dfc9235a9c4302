//! The Memory Vault Store (C2): upsert/search of per-file memory records,
//! embedding at write time so the vector store and embedding model are
//! co-selected by the store rather than by each caller.

use remind_core::traits::{EmbeddingAdapter, VectorFilter, VectorStoreAdapter};
use remind_core::{MemoryRecord, RemindError, Result};
use std::sync::Arc;

/// Generic over the two adapters it composes; any `EmbeddingAdapter` +
/// `VectorStoreAdapter` pair works, which keeps the store agnostic to
/// which embedding model or vector database backs it.
pub struct VaultStore {
    embedder: Arc<dyn EmbeddingAdapter>,
    vector_store: Arc<dyn VectorStoreAdapter>,
}

impl VaultStore {
    pub fn new(embedder: Arc<dyn EmbeddingAdapter>, vector_store: Arc<dyn VectorStoreAdapter>) -> Self {
        Self {
            embedder,
            vector_store,
        }
    }

    /// Embeds `event_summary + description + people` and upserts. Idempotent
    /// on `record.id`: re-upserting the same id overwrites rather than
    /// duplicates. An embedding failure rejects the write outright — no
    /// record is ever stored with a null vector.
    pub async fn upsert(&self, mut record: MemoryRecord) -> Result<()> {
        let text = record.embedding_text();
        let vector = self.embedder.embed(&text).await.map_err(|e| {
            tracing::warn!(record_id = %record.id, error = %e, "embedding failed during upsert, rejecting record");
            e
        })?;

        if vector.len() != self.embedder.dimension() {
            return Err(RemindError::InvariantViolation(format!(
                "embedder returned {} dims but declares {}",
                vector.len(),
                self.embedder.dimension()
            )));
        }

        record.embedding = Some(vector);
        self.vector_store.upsert(&record).await
    }

    /// Embeds `query` and delegates to the vector store, returning results
    /// sorted descending by similarity (the vector store's own contract
    /// guarantees the ordering; this method does not re-sort).
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        filter: Option<VectorFilter>,
    ) -> Result<Vec<(MemoryRecord, f32)>> {
        let query_vector = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| RemindError::RetrievalUnavailable(e.to_string()))?;
        self.vector_store.top_k(&query_vector, k, filter).await
    }

    pub async fn count(&self) -> Result<usize> {
        self.vector_store.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remind_core::traits::embedding::fixtures::FakeEmbedder;
    use remind_core::traits::vector_store::fixtures::InMemoryVectorStore;
    use remind_core::FileType;
    use std::collections::BTreeSet;

    fn sample_record(event: &str, file: &str, description: &str) -> MemoryRecord {
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

    fn vault() -> VaultStore {
        VaultStore::new(
            Arc::new(FakeEmbedder { dim: 16 }),
            Arc::new(InMemoryVectorStore::new()),
        )
    }

    #[tokio::test]
    async fn upsert_is_idempotent_on_id() {
        let vault = vault();
        let record = sample_record("disney trip", "a.png", "a day at the park");
        vault.upsert(record.clone()).await.unwrap();
        vault.upsert(record.clone()).await.unwrap();
        assert_eq!(vault.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn upsert_rejects_when_embedder_violates_its_declared_dimension() {
        struct BadEmbedder;
        #[async_trait::async_trait]
        impl remind_core::traits::EmbeddingAdapter for BadEmbedder {
            async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
                Ok(vec![1.0, 2.0])
            }
            fn dimension(&self) -> usize {
                16
            }
        }
        let vault = VaultStore::new(Arc::new(BadEmbedder), Arc::new(InMemoryVectorStore::new()));
        let record = sample_record("trip", "a.png", "desc");
        let result = vault.upsert(record).await;
        assert!(matches!(result, Err(RemindError::InvariantViolation(_))));
    }

    #[tokio::test]
    async fn search_returns_sorted_results() {
        let vault = vault();
        vault
            .upsert(sample_record("disney trip", "a.png", "mickey mouse cinnamon roll"))
            .await
            .unwrap();
        vault
            .upsert(sample_record("disney trip", "b.png", "fireworks at the castle"))
            .await
            .unwrap();
        let results = vault
            .search("mickey mouse cinnamon roll", 5, None)
            .await
            .unwrap();
        assert!(!results.is_empty());
        for pair in results.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[tokio::test]
    async fn empty_description_still_embeds_via_fallback_text() {
        let vault = vault();
        let record = sample_record("trip", "a.png", "");
        vault.upsert(record).await.unwrap();
        assert_eq!(vault.count().await.unwrap(), 1);
    }
}
