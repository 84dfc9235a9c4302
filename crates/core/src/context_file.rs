//! `context.json`: the per-event-folder description/people map produced by
//! ingestion stage S3 and consumed by S4/S6.

use crate::memory::Orientation;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One file's entry in a [`ContextFile`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextEntry {
    pub description: String,
    #[serde(default)]
    pub people: Vec<String>,
    /// Populated by ingestion's context-generation stage (S3) when the
    /// file is a video and the LLM's description pass could determine it;
    /// `None` otherwise (resolves the `video`/`vertical_video` Open
    /// Question — see `MemoryRecord::orientation`).
    #[serde(default)]
    pub orientation: Option<Orientation>,
}

/// A normalized-key -> entry map for one event folder, plus the event-level
/// summary shared by every file in the folder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextFile {
    pub memory_context: String,
    #[serde(flatten)]
    pub entries: HashMap<String, ContextEntry>,
}

impl ContextFile {
    /// Look up a file's context entry by its on-disk name, applying the
    /// same normalization used when the entry was written.
    pub fn get(&self, file_name: &str) -> Option<&ContextEntry> {
        let key = normalize_key(file_name);
        self.entries
            .iter()
            .find(|(k, _)| normalize_key(k) == key)
            .map(|(_, v)| v)
    }

    pub fn insert(&mut self, file_name: &str, entry: ContextEntry) {
        self.entries.insert(normalize_key(file_name), entry);
    }
}

/// Normalizes a context-file key or filename for comparison: narrow and
/// ordinary no-break spaces become plain spaces, then the result is
/// lower-cased. This is the single normalization rule referenced throughout
/// the data model (`ContextFile`, the metadata builder, and the facade's
/// `topic` handling all share it).
pub fn normalize_key(raw: &str) -> String {
    raw.replace('\u{202f}', " ")
        .replace('\u{00a0}', " ")
        .to_lowercase()
}

/// Normalizes a patient-facing topic string to its canonical internal form.
/// The facade accepts both lowercase and capitalized topics; everything
/// downstream operates on the lowercase form.
pub fn normalize_topic(raw: &str) -> String {
    normalize_key(raw.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_key_collapses_narrow_no_break_space_and_case() {
        let key = "Screenshot 2025-10-04 at 3.37.37\u{202f}PM_context";
        let file = "Screenshot 2025-10-04 at 3.37.37 PM.png";
        assert_eq!(
            normalize_key(key),
            normalize_key(&format!("{}_context", file.trim_end_matches(".png")))
        );
    }

    #[test]
    fn context_file_lookup_matches_normalized_filename() {
        let mut ctx = ContextFile {
            memory_context: "a day at the park".into(),
            entries: HashMap::new(),
        };
        ctx.insert(
            "Screenshot 2025-10-04 at 3.37.37\u{202f}PM.png",
            ContextEntry {
                description: "family photo".into(),
                people: vec!["steve".into()],
                orientation: None,
            },
        );
        let found = ctx.get("Screenshot 2025-10-04 at 3.37.37 PM.png");
        assert!(found.is_some());
        assert_eq!(found.unwrap().description, "family photo");
    }

    #[test]
    fn normalize_topic_trims_and_lowercases() {
        assert_eq!(normalize_topic(" Disney Trip "), "disney trip");
    }
}
