//! Event-folder media listing, shared by every stage that walks an event's
//! files (S1 face extraction, S3 context generation, S6 vault upsert).

use remind_core::traits::ObjectStorageAdapter;
use remind_core::{FileType, Result};
use std::sync::Arc;

/// Files this pipeline treats as a single event folder's face/context
/// sidecar, never as ingestible media.
const CONTEXT_FILE_NAME: &str = "context.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl From<MediaKind> for FileType {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Image => FileType::Image,
            MediaKind::Video => FileType::Video,
        }
    }
}

/// Classifies a file by its extension. Files with an unrecognized
/// extension are not media and are skipped by every stage that calls this.
pub fn classify(file_name: &str) -> Option<MediaKind> {
    let lower = file_name.to_lowercase();
    let ext = lower.rsplit('.').next()?;
    match ext {
        "png" | "jpg" | "jpeg" | "heic" | "webp" | "gif" | "bmp" => Some(MediaKind::Image),
        "mp4" | "mov" | "avi" | "mkv" | "webm" => Some(MediaKind::Video),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub kind: MediaKind,
}

/// Loads every classifiable media file directly under `{event_name}/` in
/// `bucket`, skipping `context.json` and any key one level deeper (this
/// pipeline has no concept of nested sub-events).
pub async fn load_event_media(
    object_store: &Arc<dyn ObjectStorageAdapter>,
    bucket: &str,
    event_name: &str,
) -> Result<Vec<MediaFile>> {
    let prefix = format!("{event_name}/");
    let keys = object_store.list(bucket, &prefix).await?;

    let mut files = Vec::new();
    for key in keys {
        let file_name = match key.strip_prefix(&prefix) {
            Some(rest) if !rest.is_empty() && !rest.contains('/') => rest,
            _ => continue,
        };
        if file_name == CONTEXT_FILE_NAME {
            continue;
        }
        let Some(kind) = classify(file_name) else {
            continue;
        };
        let bytes = object_store.get_bytes(bucket, &key).await?;
        files.push(MediaFile {
            file_name: file_name.to_string(),
            bytes,
            kind,
        });
    }
    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(files)
}

/// Lists every event-folder name present in `bucket`, derived from the
/// first path segment of each stored key. Used by S6 to walk the whole
/// object store one event at a time.
pub async fn list_event_names(
    object_store: &Arc<dyn ObjectStorageAdapter>,
    bucket: &str,
) -> Result<Vec<String>> {
    let keys = object_store.list(bucket, "").await?;
    let mut names: Vec<String> = keys
        .iter()
        .filter_map(|k| k.split_once('/').map(|(event, _)| event.to_string()))
        .collect();
    names.sort();
    names.dedup();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use remind_core::traits::object_storage::fixtures::InMemoryObjectStore;

    #[test]
    fn classify_recognizes_common_extensions() {
        assert_eq!(classify("a.PNG"), Some(MediaKind::Image));
        assert_eq!(classify("clip.mp4"), Some(MediaKind::Video));
        assert_eq!(classify("notes.txt"), None);
    }

    #[tokio::test]
    async fn load_event_media_skips_context_json_and_nested_keys() {
        let store: Arc<dyn ObjectStorageAdapter> =
            Arc::new(InMemoryObjectStore::new("https://example"));
        store
            .put("bucket", "disney trip/a.png", b"a".to_vec(), "image/png")
            .await
            .unwrap();
        store
            .put("bucket", "disney trip/context.json", b"{}".to_vec(), "application/json")
            .await
            .unwrap();
        store
            .put("bucket", "disney trip/raw/ignored.png", b"x".to_vec(), "image/png")
            .await
            .unwrap();
        store
            .put("bucket", "other event/b.png", b"b".to_vec(), "image/png")
            .await
            .unwrap();

        let files = load_event_media(&store, "bucket", "disney trip").await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "a.png");
    }

    #[tokio::test]
    async fn list_event_names_derives_from_key_prefixes() {
        let store: Arc<dyn ObjectStorageAdapter> =
            Arc::new(InMemoryObjectStore::new("https://example"));
        store.put("bucket", "disney trip/a.png", b"a".to_vec(), "image/png").await.unwrap();
        store.put("bucket", "ski trip/b.png", b"b".to_vec(), "image/png").await.unwrap();

        let names = list_event_names(&store, "bucket").await.unwrap();
        assert_eq!(names, vec!["disney trip".to_string(), "ski trip".to_string()]);
    }
}
