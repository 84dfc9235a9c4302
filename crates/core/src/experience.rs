//! Therapist-composed, read-only bundles of scenes and narratives.

use crate::memory::ScoredMemory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One scene's retrieval + narration result within an [`Experience`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneResult {
    pub scene: String,
    pub memories: Vec<ScoredMemory>,
    pub ai_narrative: String,
}

/// A therapist-composed, persisted bundle: a title, a general context, an
/// ordered list of scene results, and one overall narrative seeded from
/// `general_context`. Read-only once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    pub experience_id: String,
    pub title: String,
    pub general_context: String,
    pub scenes: Vec<SceneResult>,
    pub overall_narrative: String,
    pub total_memories: usize,
    pub created_at: DateTime<Utc>,
}

impl Experience {
    pub fn patient_url(&self) -> String {
        format!("/patient/experience/{}", self.experience_id)
    }
}
