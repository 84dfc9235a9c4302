//! Named identities produced by ingestion and read by retrieval/narration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A caregiver-confirmed identity. Immutable once created except for
/// `voice_clone_id`, which is assigned later by voice-clone provisioning
/// (S5 of the ingestion pipeline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Lowercase-normalized canonical name, used for lookup.
    pub name: String,
    /// Display-cased form used in narration (e.g. "Steve").
    pub display_name: String,
    /// Identification anchors; at least one, at most a small bound.
    pub face_exemplars: Vec<String>,
    pub voice_clone_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Person {
    pub fn new(display_name: impl Into<String>, face_exemplars: Vec<String>) -> Self {
        let display_name = display_name.into();
        Self {
            name: display_name.to_lowercase(),
            display_name,
            face_exemplars,
            voice_clone_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn has_voice_clone(&self) -> bool {
        self.voice_clone_id.is_some()
    }

    /// The registry name convention: `<DisplayName>_voice_forgetmenot`.
    pub fn voice_clone_registry_name(&self) -> String {
        format!("{}_voice_forgetmenot", self.display_name)
    }
}

/// Ingestion-internal face grouping, never persisted past the name-mapping
/// stage — but it does cross the HTTP boundary once, as the sampled-face
/// review bundle the caregiver annotates between the extract-faces and
/// apply-names calls, hence `Serialize`/`Deserialize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceCluster {
    pub cluster_id: u32,
    pub encodings: Vec<Vec<f32>>,
    pub sampled_faces: Vec<String>,
    pub source_refs: Vec<FaceSourceRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceSourceRef {
    pub event_name: String,
    pub file_name: String,
    pub source_type: FaceSourceType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceSourceType {
    Image,
    VideoFrame,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_clone_registry_name_follows_convention() {
        let person = Person::new("Steve", vec!["https://example/steve1.jpg".into()]);
        assert_eq!(person.voice_clone_registry_name(), "Steve_voice_forgetmenot");
        assert_eq!(person.name, "steve");
    }
}
