use crate::error::Result;
use crate::memory::MemoryRecord;
use async_trait::async_trait;

/// Optional narrowing applied to a vector search.
#[derive(Debug, Clone, Default)]
pub struct VectorFilter {
    pub event_name: Option<String>,
    pub people: Vec<String>,
}

/// Raw vector-store access. `remind-vault` is the only caller; it owns
/// embedding-at-write-time and presents the richer `MemoryRecord` contract
/// on top of this.
#[async_trait]
pub trait VectorStoreAdapter: Send + Sync {
    async fn upsert(&self, record: &MemoryRecord) -> Result<()>;

    /// Returns up to `k` nearest records to `query_vector`, sorted
    /// descending by cosine similarity (`similarity ∈ [-1, 1]`).
    async fn top_k(
        &self,
        query_vector: &[f32],
        k: usize,
        filter: Option<VectorFilter>,
    ) -> Result<Vec<(MemoryRecord, f32)>>;

    async fn count(&self) -> Result<usize>;
}

#[cfg(any(test, feature = "test-util"))]
pub mod fixtures {
    use super::*;
    use parking_lot::RwLock;

    /// An in-memory vector store: brute-force cosine search over whatever
    /// has been upserted. Used by `remind-vault`'s own tests and by any
    /// crate exercising retrieval without a live Qdrant.
    #[derive(Default)]
    pub struct InMemoryVectorStore {
        rows: RwLock<Vec<(MemoryRecord, Vec<f32>)>>,
    }

    impl InMemoryVectorStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if na == 0.0 || nb == 0.0 {
            0.0
        } else {
            dot / (na * nb)
        }
    }

    #[async_trait]
    impl VectorStoreAdapter for InMemoryVectorStore {
        async fn upsert(&self, record: &MemoryRecord) -> Result<()> {
            let vector = record
                .embedding
                .clone()
                .ok_or_else(|| crate::error::RemindError::InvariantViolation(
                    "upsert without embedding".into(),
                ))?;
            let mut rows = self.rows.write();
            if let Some(existing) = rows.iter_mut().find(|(r, _)| r.id == record.id) {
                *existing = (record.clone(), vector);
            } else {
                rows.push((record.clone(), vector));
            }
            Ok(())
        }

        async fn top_k(
            &self,
            query_vector: &[f32],
            k: usize,
            filter: Option<VectorFilter>,
        ) -> Result<Vec<(MemoryRecord, f32)>> {
            let rows = self.rows.read();
            let mut scored: Vec<(MemoryRecord, f32)> = rows
                .iter()
                .filter(|(r, _)| match &filter {
                    Some(f) => {
                        let event_ok = f
                            .event_name
                            .as_ref()
                            .map(|e| e == &r.event_name)
                            .unwrap_or(true);
                        let people_ok = f.people.is_empty()
                            || f.people.iter().any(|p| r.people.contains(p));
                        event_ok && people_ok
                    }
                    None => true,
                })
                .map(|(r, v)| (r.clone(), cosine(query_vector, v)))
                .collect();
            scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
            scored.truncate(k);
            Ok(scored)
        }

        async fn count(&self) -> Result<usize> {
            Ok(self.rows.read().len())
        }
    }
}
