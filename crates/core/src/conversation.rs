//! The per-`(patient_id, topic)` turn log kept by Conversation History.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a [`ConversationTurn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Patient,
    Agent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Agent => "agent",
        }
    }
}

/// One entry in a conversation log, ordered within its `(patient_id, topic)`
/// key by append order (timestamps are non-decreasing by construction).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub timestamp: DateTime<Utc>,
    pub role: Role,
    pub message: String,
    pub topic: String,
}

impl ConversationTurn {
    pub fn new(role: Role, message: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            role,
            message: message.into(),
            topic: topic.into(),
        }
    }
}

/// Aggregate counters returned by `Conversation History::stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationStats {
    pub patient_turns: usize,
    pub agent_turns: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
}
