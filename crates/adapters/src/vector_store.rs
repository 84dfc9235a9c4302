//! Qdrant-backed `VectorStoreAdapter`.

use async_trait::async_trait;
use qdrant_client::{
    qdrant::{
        value::Kind, Condition, CreateCollectionBuilder, Distance, FieldCondition, Filter, Match,
        PointStruct, SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
    },
    Qdrant,
};
use remind_core::traits::{VectorFilter, VectorStoreAdapter};
use remind_core::{FileType, MemoryRecord, Orientation, RemindError, Result};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

/// Qdrant point ids must be a `u64` or a UUID; `MemoryRecord::id` is a
/// 64-char sha256 hex digest, which is neither. Derive a stable UUID from
/// the digest's first 16 bytes for the point id, and carry the original
/// content-addressed id in the payload so reads reconstruct it exactly —
/// the point id itself is never interpreted as the record id.
fn point_id_for(record_id: &str) -> Uuid {
    let mut bytes = [0u8; 16];
    for (i, chunk) in record_id.as_bytes().chunks(2).take(16).enumerate() {
        let hex = std::str::from_utf8(chunk).unwrap_or("00");
        bytes[i] = u8::from_str_radix(hex, 16).unwrap_or(0);
    }
    Uuid::from_bytes(bytes)
}

#[derive(Debug, Clone)]
pub struct QdrantConfig {
    pub endpoint: String,
    pub collection: String,
    pub vector_dim: usize,
    pub api_key: Option<String>,
}

pub struct QdrantVectorStore {
    client: Qdrant,
    config: QdrantConfig,
}

impl QdrantVectorStore {
    pub fn new(config: QdrantConfig) -> Result<Self> {
        let mut builder = Qdrant::from_url(&config.endpoint);
        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub async fn ensure_collection(&self) -> Result<()> {
        let exists = self
            .client
            .collection_exists(&self.config.collection)
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;

        if !exists {
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.config.collection).vectors_config(
                        VectorParamsBuilder::new(self.config.vector_dim as u64, Distance::Cosine),
                    ),
                )
                .await
                .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        }
        Ok(())
    }
}

fn payload_string(payload: &HashMap<String, qdrant_client::qdrant::Value>, key: &str) -> String {
    payload
        .get(key)
        .and_then(|v| match &v.kind {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        })
        .unwrap_or_default()
}

#[async_trait]
impl VectorStoreAdapter for QdrantVectorStore {
    async fn upsert(&self, record: &MemoryRecord) -> Result<()> {
        let vector = record.embedding.clone().ok_or_else(|| {
            RemindError::InvariantViolation("upsert called without an embedding".into())
        })?;
        if vector.len() != self.config.vector_dim {
            return Err(RemindError::InvariantViolation(format!(
                "embedding dimension {} does not match vault dimension {}",
                vector.len(),
                self.config.vector_dim
            )));
        }

        let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
        payload.insert("id".into(), record.id.clone().into());
        payload.insert("event_name".into(), record.event_name.clone().into());
        payload.insert("file_name".into(), record.file_name.clone().into());
        payload.insert(
            "file_type".into(),
            match record.file_type {
                FileType::Image => "image",
                FileType::Video => "video",
            }
            .into(),
        );
        payload.insert("description".into(), record.description.clone().into());
        payload.insert("event_summary".into(), record.event_summary.clone().into());
        payload.insert("file_url".into(), record.file_url.clone().into());
        payload.insert(
            "people".into(),
            record
                .people
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(",")
                .into(),
        );
        if let Some(orientation) = record.orientation {
            payload.insert(
                "orientation".into(),
                match orientation {
                    Orientation::Horizontal => "horizontal",
                    Orientation::Vertical => "vertical",
                }
                .into(),
            );
        }

        let point = PointStruct::new(point_id_for(&record.id).to_string(), vector, payload);

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.config.collection, vec![point]))
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;

        Ok(())
    }

    async fn top_k(
        &self,
        query_vector: &[f32],
        k: usize,
        filter: Option<VectorFilter>,
    ) -> Result<Vec<(MemoryRecord, f32)>> {
        let mut search = SearchPointsBuilder::new(
            &self.config.collection,
            query_vector.to_vec(),
            k as u64,
        )
        .with_payload(true);

        if let Some(filter) = filter {
            let mut conditions = Vec::new();
            if let Some(event_name) = filter.event_name {
                conditions.push(field_match("event_name", event_name));
            }
            for person in filter.people {
                conditions.push(Condition {
                    condition_one_of: Some(
                        qdrant_client::qdrant::condition::ConditionOneOf::Field(FieldCondition {
                            key: "people".to_string(),
                            r#match: Some(Match {
                                match_value: Some(
                                    qdrant_client::qdrant::r#match::MatchValue::Text(person),
                                ),
                            }),
                            ..Default::default()
                        }),
                    ),
                });
            }
            if !conditions.is_empty() {
                search = search.filter(Filter {
                    must: conditions,
                    ..Default::default()
                });
            }
        }

        let response = self
            .client
            .search_points(search)
            .await
            .map_err(|e| RemindError::RetrievalUnavailable(e.to_string()))?;

        let results = response
            .result
            .into_iter()
            .map(|point| {
                let people: BTreeSet<String> = payload_string(&point.payload, "people")
                    .split(',')
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string())
                    .collect();
                let orientation = match payload_string(&point.payload, "orientation").as_str() {
                    "horizontal" => Some(Orientation::Horizontal),
                    "vertical" => Some(Orientation::Vertical),
                    _ => None,
                };
                let file_type = match payload_string(&point.payload, "file_type").as_str() {
                    "video" => FileType::Video,
                    _ => FileType::Image,
                };
                let id = payload_string(&point.payload, "id");

                let record = MemoryRecord {
                    id,
                    event_name: payload_string(&point.payload, "event_name"),
                    file_name: payload_string(&point.payload, "file_name"),
                    file_type,
                    description: payload_string(&point.payload, "description"),
                    people,
                    event_summary: payload_string(&point.payload, "event_summary"),
                    file_url: payload_string(&point.payload, "file_url"),
                    orientation,
                    embedding: None,
                };
                (record, point.score)
            })
            .collect();

        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        let info = self
            .client
            .collection_info(&self.config.collection)
            .await
            .map_err(|e| RemindError::ExternalUnavailable(e.to_string()))?;
        Ok(info
            .result
            .and_then(|r| r.points_count)
            .unwrap_or(0) as usize)
    }
}

fn field_match(key: &str, value: String) -> Condition {
    Condition {
        condition_one_of: Some(qdrant_client::qdrant::condition::ConditionOneOf::Field(
            FieldCondition {
                key: key.to_string(),
                r#match: Some(Match {
                    match_value: Some(qdrant_client::qdrant::r#match::MatchValue::Keyword(value)),
                }),
                ..Default::default()
            },
        )),
    }
}
