//! S6: Vault upsert. Walks the object store event-by-event, turns each
//! `context.json` entry into a [`MemoryRecord`], and upserts it — plus the
//! metadata CSV the CLI's headless two-step (`vault-build-metadata` /
//! `vault-upload`) round-trips through.

use crate::media;
use remind_core::traits::ObjectStorageAdapter;
use remind_core::{ContextFile, FileType, MemoryRecord};
use remind_vault::VaultStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// One row of the intermediate metadata CSV. `orientation` is an extra
/// trailing column beyond the baseline column set, carrying the
/// supplemental field through the CSV round trip rather than losing it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetadataRow {
    pub id: String,
    pub event_name: String,
    pub file_name: String,
    pub file_type: String,
    pub description: String,
    /// JSON array of person names.
    pub people: String,
    pub event_summary: String,
    pub file_url: String,
    #[serde(default)]
    pub orientation: String,
}

impl MetadataRow {
    pub fn from_record(record: &MemoryRecord) -> remind_core::Result<Self> {
        let people = serde_json::to_string(&record.people)
            .map_err(|e| remind_core::RemindError::InvariantViolation(e.to_string()))?;
        let file_type = match record.file_type {
            FileType::Image => "image",
            FileType::Video => "video",
        };
        let orientation = match record.orientation {
            Some(remind_core::Orientation::Horizontal) => "horizontal",
            Some(remind_core::Orientation::Vertical) => "vertical",
            None => "",
        };
        Ok(Self {
            id: record.id.clone(),
            event_name: record.event_name.clone(),
            file_name: record.file_name.clone(),
            file_type: file_type.to_string(),
            description: record.description.clone(),
            people,
            event_summary: record.event_summary.clone(),
            file_url: record.file_url.clone(),
            orientation: orientation.to_string(),
        })
    }

    pub fn into_record(self) -> remind_core::Result<MemoryRecord> {
        let file_type = match self.file_type.as_str() {
            "image" => FileType::Image,
            "video" => FileType::Video,
            other => {
                return Err(remind_core::RemindError::InputError(format!(
                    "unknown file_type in metadata row: {other}"
                )))
            }
        };
        let people: BTreeSet<String> = serde_json::from_str(&self.people)
            .map_err(|e| remind_core::RemindError::InputError(format!("malformed people column: {e}")))?;
        let orientation = match self.orientation.as_str() {
            "horizontal" => Some(remind_core::Orientation::Horizontal),
            "vertical" => Some(remind_core::Orientation::Vertical),
            _ => None,
        };
        Ok(MemoryRecord {
            id: self.id,
            event_name: self.event_name,
            file_name: self.file_name,
            file_type,
            description: self.description,
            people,
            event_summary: self.event_summary,
            file_url: self.file_url,
            orientation,
            embedding: None,
        })
    }
}

/// Walks every event folder in `bucket`, reads its `context.json`, and
/// emits one [`MemoryRecord`] per listed media file. Per-event read
/// failures are logged and skipped rather than aborting the whole walk.
pub async fn build_metadata_rows(
    object_store: &Arc<dyn ObjectStorageAdapter>,
    bucket: &str,
) -> remind_core::Result<Vec<MetadataRow>> {
    let event_names = media::list_event_names(object_store, bucket).await?;
    let mut rows = Vec::new();

    for event_name in event_names {
        let context_key = format!("{event_name}/context.json");
        let context_json = match object_store.get_text(bucket, &context_key).await {
            Ok(text) => text,
            Err(error) => {
                tracing::warn!(event = %event_name, error = %error, "no context.json for event, skipping");
                continue;
            }
        };
        let context: ContextFile = match serde_json::from_str(&context_json) {
            Ok(c) => c,
            Err(error) => {
                tracing::warn!(event = %event_name, error = %error, "malformed context.json, skipping event");
                continue;
            }
        };

        let files = media::load_event_media(object_store, bucket, &event_name).await?;
        for file in files {
            let Some(entry) = context.get(&file.file_name) else {
                continue;
            };

            let key = format!("{event_name}/{}", file.file_name);
            let record = MemoryRecord {
                id: MemoryRecord::derive_id(&event_name, &file.file_name),
                event_name: event_name.clone(),
                file_name: file.file_name.clone(),
                file_type: file.kind.into(),
                description: entry.description.clone(),
                people: entry.people.iter().cloned().collect(),
                event_summary: context.memory_context.clone(),
                file_url: object_store.public_url(bucket, &key),
                orientation: entry.orientation,
                embedding: None,
            };
            rows.push(MetadataRow::from_record(&record)?);
        }
    }
    Ok(rows)
}

pub fn write_metadata_csv(rows: &[MetadataRow]) -> remind_core::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| remind_core::RemindError::InvariantViolation(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| remind_core::RemindError::InvariantViolation(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| remind_core::RemindError::InvariantViolation(e.to_string()))
}

pub fn read_metadata_csv(csv_text: &str) -> remind_core::Result<Vec<MetadataRow>> {
    let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
    reader
        .deserialize()
        .map(|result| {
            result.map_err(|e| remind_core::RemindError::InputError(format!("malformed metadata CSV row: {e}")))
        })
        .collect()
}

/// Upserts every row's record into the Vault. A single malformed row is an
/// `InputError` that aborts the whole upload (the CSV is a CLI-curated
/// artifact, not a best-effort stream like S3's per-file LLM calls).
pub async fn upsert_metadata_rows(vault: &Arc<VaultStore>, rows: Vec<MetadataRow>) -> remind_core::Result<usize> {
    let mut count = 0;
    for row in rows {
        let record = row.into_record()?;
        vault.upsert(record).await?;
        count += 1;
    }
    Ok(count)
}
