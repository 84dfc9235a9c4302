//! Conversation History (C7): a rolling, TTL-bounded turn log kept per
//! `(patient_id, topic)` key, with FIFO/total-order discipline per key and
//! no semantic search or summarization machinery, which ReMind has no use
//! for.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use remind_config::constants::history as history_defaults;
use remind_core::{normalize_topic, ConversationStats, ConversationTurn, Role};
use std::collections::{HashSet, VecDeque};

#[derive(Default)]
struct Session {
    turns: VecDeque<ConversationTurn>,
    shown_memory_ids: HashSet<String>,
    started_at: Option<DateTime<Utc>>,
    last_updated: Option<DateTime<Utc>>,
}

/// Which parts of a session `reset` clears; both default to `false` so a
/// caller must opt in to each explicitly.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResetOptions {
    pub conversation: bool,
    pub shown_memories: bool,
}

pub struct ConversationHistoryStore {
    sessions: DashMap<(String, String), RwLock<Session>>,
    window: usize,
    ttl: Duration,
}

impl ConversationHistoryStore {
    pub fn new(window: usize, ttl_hours: i64) -> Self {
        Self {
            sessions: DashMap::new(),
            window,
            ttl: Duration::hours(ttl_hours),
        }
    }

    fn key(patient_id: &str, topic: &str) -> (String, String) {
        (patient_id.to_string(), normalize_topic(topic))
    }

    /// Serialized per key: `DashMap::entry` takes the shard lock for the
    /// insert, and the inner `RwLock` then serializes concurrent writers
    /// on the same key. Across distinct keys there's no shared lock at all.
    pub fn append(&self, patient_id: &str, topic: &str, role: Role, message: impl Into<String>) {
        let key = Self::key(patient_id, topic);
        let entry = self.sessions.entry(key.clone()).or_default();
        let mut session = entry.write();
        self.purge_if_expired(&mut session);

        let now = Utc::now();
        if session.started_at.is_none() {
            session.started_at = Some(now);
        }
        session.last_updated = Some(now);

        session.turns.push_back(ConversationTurn::new(role, message, key.1));
        while session.turns.len() > self.window {
            session.turns.pop_front();
        }
    }

    /// Newest-last, up to `max_turns`.
    pub fn slice(&self, patient_id: &str, topic: &str, max_turns: usize) -> Vec<ConversationTurn> {
        let key = Self::key(patient_id, topic);
        let Some(entry) = self.sessions.get(&key) else {
            return Vec::new();
        };
        let mut session = entry.write();
        self.purge_if_expired(&mut session);
        let start = session.turns.len().saturating_sub(max_turns);
        session.turns.iter().skip(start).cloned().collect()
    }

    /// Last `n` agent messages, oldest-first, for the narration
    /// anti-repetition block.
    pub fn recent_agent(&self, patient_id: &str, topic: &str, n: usize) -> Vec<String> {
        let key = Self::key(patient_id, topic);
        let Some(entry) = self.sessions.get(&key) else {
            return Vec::new();
        };
        let mut session = entry.write();
        self.purge_if_expired(&mut session);
        let mut agent_messages: Vec<String> = session
            .turns
            .iter()
            .rev()
            .filter(|t| t.role == Role::Agent)
            .take(n)
            .map(|t| t.message.clone())
            .collect();
        agent_messages.reverse();
        agent_messages
    }

    pub fn mark_shown(&self, patient_id: &str, topic: &str, memory_ids: impl IntoIterator<Item = String>) {
        let key = Self::key(patient_id, topic);
        let entry = self.sessions.entry(key).or_default();
        let mut session = entry.write();
        session.shown_memory_ids.extend(memory_ids);
    }

    pub fn shown_memory_ids(&self, patient_id: &str, topic: &str) -> HashSet<String> {
        let key = Self::key(patient_id, topic);
        self.sessions
            .get(&key)
            .map(|entry| entry.read().shown_memory_ids.clone())
            .unwrap_or_default()
    }

    pub fn reset(&self, patient_id: &str, topic: &str, options: ResetOptions) {
        let key = Self::key(patient_id, topic);
        let Some(entry) = self.sessions.get(&key) else {
            return;
        };
        let mut session = entry.write();
        if options.conversation {
            session.turns.clear();
            session.started_at = None;
            session.last_updated = None;
        }
        if options.shown_memories {
            session.shown_memory_ids.clear();
        }
    }

    pub fn stats(&self, patient_id: &str, topic: &str) -> ConversationStats {
        let key = Self::key(patient_id, topic);
        let Some(entry) = self.sessions.get(&key) else {
            return ConversationStats {
                patient_turns: 0,
                agent_turns: 0,
                started_at: None,
                last_updated: None,
            };
        };
        let mut session = entry.write();
        self.purge_if_expired(&mut session);
        ConversationStats {
            patient_turns: session.turns.iter().filter(|t| t.role == Role::Patient).count(),
            agent_turns: session.turns.iter().filter(|t| t.role == Role::Agent).count(),
            started_at: session.started_at,
            last_updated: session.last_updated,
        }
    }

    fn purge_if_expired(&self, session: &mut Session) {
        if let Some(last_updated) = session.last_updated {
            if Utc::now() - last_updated > self.ttl {
                tracing::debug!("conversation session expired, purging on read");
                session.turns.clear();
                session.shown_memory_ids.clear();
                session.started_at = None;
                session.last_updated = None;
            }
        }
    }
}

impl Default for ConversationHistoryStore {
    fn default() -> Self {
        Self::new(history_defaults::DEFAULT_WINDOW_TURNS, history_defaults::DEFAULT_TTL_HOURS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_truncates_to_window() {
        let store = ConversationHistoryStore::new(3, 24);
        for i in 0..5 {
            store.append("p1", "disney", Role::Patient, format!("turn {i}"));
        }
        let slice = store.slice("p1", "disney", 10);
        assert_eq!(slice.len(), 3);
        assert_eq!(slice[0].message, "turn 2");
        assert_eq!(slice[2].message, "turn 4");
    }

    #[test]
    fn recent_agent_returns_oldest_first_within_window() {
        let store = ConversationHistoryStore::new(10, 24);
        store.append("p1", "disney", Role::Patient, "what did we eat");
        store.append("p1", "disney", Role::Agent, "first answer");
        store.append("p1", "disney", Role::Patient, "tell me more");
        store.append("p1", "disney", Role::Agent, "second answer");
        let recent = store.recent_agent("p1", "disney", 3);
        assert_eq!(recent, vec!["first answer".to_string(), "second answer".to_string()]);
    }

    #[test]
    fn topic_lookup_is_normalized() {
        let store = ConversationHistoryStore::new(10, 24);
        store.append("p1", "Disney\u{00a0}Trip", Role::Patient, "hello");
        let slice = store.slice("p1", "disney trip", 10);
        assert_eq!(slice.len(), 1);
    }

    #[test]
    fn reset_conversation_clears_turns_but_not_shown_memories_unless_asked() {
        let store = ConversationHistoryStore::new(10, 24);
        store.append("p1", "disney", Role::Patient, "hello");
        store.mark_shown("p1", "disney", vec!["mem-1".to_string()]);

        store.reset("p1", "disney", ResetOptions { conversation: true, shown_memories: false });
        assert!(store.slice("p1", "disney", 10).is_empty());
        assert_eq!(store.shown_memory_ids("p1", "disney").len(), 1);

        store.reset("p1", "disney", ResetOptions { conversation: false, shown_memories: true });
        assert!(store.shown_memory_ids("p1", "disney").is_empty());
    }

    #[test]
    fn stats_counts_roles_separately() {
        let store = ConversationHistoryStore::new(10, 24);
        store.append("p1", "disney", Role::Patient, "a");
        store.append("p1", "disney", Role::Agent, "b");
        store.append("p1", "disney", Role::Agent, "c");
        let stats = store.stats("p1", "disney");
        assert_eq!(stats.patient_turns, 1);
        assert_eq!(stats.agent_turns, 2);
        assert!(stats.started_at.is_some());
    }

    #[test]
    fn unknown_key_returns_empty_stats() {
        let store = ConversationHistoryStore::new(10, 24);
        let stats = store.stats("nobody", "nothing");
        assert_eq!(stats.patient_turns, 0);
        assert!(stats.started_at.is_none());
    }
}
