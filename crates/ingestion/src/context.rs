//! S3: context generation. For each file in an event folder, asks the LLM
//! for a description and the subset of known people it shows, restricted
//! to an explicit anchor set so the model can't invent new names.

use crate::media::MediaFile;
use remind_config::constants::ingestion::CONTEXT_GENERATION_CONCURRENCY;
use remind_core::traits::{GenerationParams, LlmAdapter};
use remind_core::{ContextEntry, ContextFile, Orientation, Person};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;

const UNKNOWN_PERSON_TOKEN: &str = "unknown";

/// Runs S3 over one event folder's files, producing a populated
/// [`ContextFile`]. Per-file failures are tolerated: a file that the LLM
/// can't describe gets an empty entry rather than aborting the event (S3's
/// resumability/fault-isolation contract).
pub async fn generate_context(
    llm: &Arc<dyn LlmAdapter>,
    event_name: &str,
    memory_context: String,
    files: &[MediaFile],
    anchors: &[Person],
) -> ContextFile {
    let allowed_names: HashSet<String> = anchors.iter().map(|p| p.name.clone()).collect();
    let semaphore = Arc::new(Semaphore::new(CONTEXT_GENERATION_CONCURRENCY));

    let tasks = files.iter().map(|file| {
        let llm = Arc::clone(llm);
        let semaphore = Arc::clone(&semaphore);
        let allowed_names = allowed_names.clone();
        let event_name = event_name.to_string();
        let file_name = file.file_name.clone();
        let file_bytes = file.bytes.clone();
        let anchor_names: Vec<String> = anchors.iter().map(|p| p.display_name.clone()).collect();

        async move {
            let _permit = semaphore.acquire().await.expect("semaphore never closed");
            let entry = match describe_file(&llm, &event_name, &file_name, &file_bytes, &anchor_names).await {
                Ok(entry) => filter_to_anchors(entry, &allowed_names),
                Err(error) => {
                    tracing::warn!(
                        event = %event_name,
                        file = %file_name,
                        error = %error,
                        "S3 context generation failed for one file, leaving it blank"
                    );
                    ContextEntry::default()
                }
            };
            (file_name, entry)
        }
    });

    let results = futures::future::join_all(tasks).await;

    let mut context_file = ContextFile {
        memory_context,
        entries: Default::default(),
    };
    for (file_name, entry) in results {
        context_file.insert(&file_name, entry);
    }
    context_file
}

#[derive(Deserialize)]
struct LlmDescription {
    description: String,
    #[serde(default)]
    people: Vec<String>,
    #[serde(default)]
    orientation: Option<String>,
}

async fn describe_file(
    llm: &Arc<dyn LlmAdapter>,
    event_name: &str,
    file_name: &str,
    file_bytes: &[u8],
    anchor_names: &[String],
) -> remind_core::Result<ContextEntry> {
    let prompt = build_prompt(event_name, file_name, anchor_names);
    let raw = llm
        .generate(
            &prompt,
            Some(file_bytes),
            GenerationParams {
                temperature: 0.2,
                max_tokens: 256,
            },
        )
        .await?;
    parse_llm_description(&raw)
}

fn build_prompt(event_name: &str, file_name: &str, anchor_names: &[String]) -> String {
    format!(
        "Event: {event_name}\n\
         File: {file_name}\n\
         Known people (choose only from this list, or \"{UNKNOWN_PERSON_TOKEN}\" if none apply): {}\n\
         Describe this file concretely and list which of the known people appear.\n\
         Do not invent names outside the known-people list.\n\
         Respond as JSON: {{\"description\": string, \"people\": [string], \"orientation\": \"horizontal\"|\"vertical\"|null}}",
        anchor_names.join(", ")
    )
}

/// Parses the LLM's JSON response. A response that isn't valid JSON or is
/// missing `description` is an error (caller substitutes a blank entry);
/// an `orientation` value other than the two recognized strings is treated
/// as absent rather than an error, since orientation is advisory.
fn parse_llm_description(raw: &str) -> remind_core::Result<ContextEntry> {
    let json_slice = extract_json_object(raw).unwrap_or(raw);
    let parsed: LlmDescription = serde_json::from_str(json_slice)
        .map_err(|e| remind_core::RemindError::NarrationUnavailable(format!("malformed LLM description: {e}")))?;

    let orientation = match parsed.orientation.as_deref() {
        Some("horizontal") => Some(Orientation::Horizontal),
        Some("vertical") => Some(Orientation::Vertical),
        _ => None,
    };

    Ok(ContextEntry {
        description: parsed.description,
        people: parsed.people,
        orientation,
    })
}

/// LLM responses sometimes wrap JSON in prose or code fences; this pulls
/// out the first balanced `{...}` span.
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end > start {
        Some(&raw[start..=end])
    } else {
        None
    }
}

fn filter_to_anchors(entry: ContextEntry, allowed_lowercase: &HashSet<String>) -> ContextEntry {
    let people = entry
        .people
        .into_iter()
        .map(|p| p.to_lowercase())
        .filter(|p| p != UNKNOWN_PERSON_TOKEN && allowed_lowercase.contains(p))
        .collect();
    ContextEntry {
        people,
        ..entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use remind_core::Result as CoreResult;
    use crate::media::MediaKind;

    struct ScriptedLlm {
        response: String,
    }

    #[async_trait]
    impl LlmAdapter for ScriptedLlm {
        async fn generate(&self, _prompt: &str, _media: Option<&[u8]>, _params: GenerationParams) -> CoreResult<String> {
            Ok(self.response.clone())
        }
    }

    fn anchor(name: &str) -> Person {
        Person::new(name, vec![format!("https://example/{name}.jpg")])
    }

    #[tokio::test]
    async fn generate_context_parses_description_people_and_orientation() {
        let llm: Arc<dyn LlmAdapter> = Arc::new(ScriptedLlm {
            response: r#"{"description": "a day at the park", "people": ["Steve"], "orientation": "vertical"}"#.to_string(),
        });
        let files = vec![MediaFile {
            file_name: "clip.mp4".into(),
            bytes: vec![],
            kind: MediaKind::Video,
        }];
        let anchors = vec![anchor("Steve")];

        let context = generate_context(&llm, "disney trip", "disney trip".into(), &files, &anchors).await;
        let entry = context.get("clip.mp4").unwrap();
        assert_eq!(entry.description, "a day at the park");
        assert_eq!(entry.people, vec!["steve".to_string()]);
        assert_eq!(entry.orientation, Some(Orientation::Vertical));
    }

    #[tokio::test]
    async fn generate_context_drops_names_outside_the_anchor_set() {
        let llm: Arc<dyn LlmAdapter> = Arc::new(ScriptedLlm {
            response: r#"{"description": "a photo", "people": ["Steve", "Intruder"]}"#.to_string(),
        });
        let files = vec![MediaFile { file_name: "a.png".into(), bytes: vec![], kind: MediaKind::Image }];
        let anchors = vec![anchor("Steve")];

        let context = generate_context(&llm, "trip", "trip".into(), &files, &anchors).await;
        let entry = context.get("a.png").unwrap();
        assert_eq!(entry.people, vec!["steve".to_string()]);
    }

    #[tokio::test]
    async fn one_file_failure_does_not_abort_the_event() {
        let llm: Arc<dyn LlmAdapter> = Arc::new(ScriptedLlm {
            response: "not json at all".to_string(),
        });
        let files = vec![MediaFile { file_name: "a.png".into(), bytes: vec![], kind: MediaKind::Image }];
        let context = generate_context(&llm, "trip", "trip".into(), &files, &[]).await;
        let entry = context.get("a.png").unwrap();
        assert_eq!(entry.description, "");
        assert!(entry.people.is_empty());
    }

    #[test]
    fn parse_llm_description_defaults_orientation_when_absent() {
        let entry = parse_llm_description(r#"{"description": "x", "people": []}"#).unwrap();
        assert_eq!(entry.orientation, None);
    }

    #[test]
    fn parse_llm_description_extracts_json_wrapped_in_prose() {
        let raw = "Sure, here you go:\n```json\n{\"description\": \"x\", \"people\": []}\n```";
        let entry = parse_llm_description(raw).unwrap();
        assert_eq!(entry.description, "x");
    }
}
