//! The Memory Vault's unit of storage: one record per ingested media file.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Media kind of a [`MemoryRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Image,
    Video,
}

/// Orientation hint for video files, used to resolve the `video` vs
/// `vertical_video` display-mode boundary. Populated by ingestion's context
/// generation stage when the LLM's description pass can determine it;
/// `None` when undeterminable, in which case callers fall back to `video`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// One per-file semantic record in the Memory Vault.
///
/// `id` is derived deterministically from `event_name` and `file_name` so
/// re-ingesting the same file yields the same record identity (see
/// [`MemoryRecord::derive_id`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub event_name: String,
    pub file_name: String,
    pub file_type: FileType,
    pub description: String,
    pub people: BTreeSet<String>,
    pub event_summary: String,
    pub file_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    /// Dense embedding of `event_summary + description + people`. Omitted
    /// from API responses (callers receive `similarity`, not the vector),
    /// but present on the stored record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl MemoryRecord {
    /// Stable content-addressed id: `sha256(event_name + "::" + file_name)`,
    /// hex-encoded. Two records for the same event+file always collide to
    /// the same id, which is what makes `Vault.upsert` idempotent.
    pub fn derive_id(event_name: &str, file_name: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(event_name.as_bytes());
        hasher.update(b"::");
        hasher.update(file_name.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// The text embedded at write time. Falls back to `event_name +
    /// file_name` when `description` is empty so that no record is dark
    /// (see Vault invariants).
    pub fn embedding_text(&self) -> String {
        let people = self
            .people
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        if self.description.trim().is_empty() {
            format!("{} {}", self.event_name, self.file_name)
        } else {
            format!("{} {} {}", self.event_summary, self.description, people)
        }
    }
}

/// A [`MemoryRecord`] paired with its similarity to some query, as returned
/// from retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredMemory {
    #[serde(flatten)]
    pub record: MemoryRecord,
    pub similarity: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_id_is_stable_and_distinct() {
        let a = MemoryRecord::derive_id("disney trip", "clip.mp4");
        let b = MemoryRecord::derive_id("disney trip", "clip.mp4");
        let c = MemoryRecord::derive_id("disney trip", "other.mp4");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn embedding_text_falls_back_when_description_empty() {
        let record = MemoryRecord {
            id: MemoryRecord::derive_id("trip", "a.png"),
            event_name: "trip".into(),
            file_name: "a.png".into(),
            file_type: FileType::Image,
            description: "".into(),
            people: BTreeSet::new(),
            event_summary: "a summary".into(),
            file_url: "https://example/a.png".into(),
            orientation: None,
            embedding: None,
        };
        assert_eq!(record.embedding_text(), "trip a.png");
    }
}
