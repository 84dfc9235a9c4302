//! S4 (solo voice extraction) and S5 (voice-clone provisioning). Both
//! stages key off `context.json`'s per-file `people` list, so they share
//! this module rather than each inventing their own pass over the event.

use crate::media::MediaFile;
use remind_core::traits::{AudioDecoderAdapter, VoiceCloneRegistry};
use remind_core::{ContextFile, FileType, Person};
use std::sync::Arc;

/// Extracts and concatenates audio for every Person who appears alone
/// (`people.len() == 1`) in at least one video, in deterministic
/// `file_name` order. Returns `(display_name, concatenated_audio_bytes)`
/// pairs; a Person with no solo video is absent from the result, which is
/// how S5 knows to skip voice-clone provisioning for them.
pub async fn extract_solo_voices(
    audio_decoder: &Arc<dyn AudioDecoderAdapter>,
    context: &ContextFile,
    files: &[MediaFile],
) -> remind_core::Result<Vec<(String, Vec<u8>)>> {
    use std::collections::BTreeMap;

    let mut solo_videos_by_name: BTreeMap<String, Vec<&MediaFile>> = BTreeMap::new();
    let mut sorted_files: Vec<&MediaFile> = files.iter().collect();
    sorted_files.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    for file in sorted_files {
        if FileType::from(file.kind) != FileType::Video {
            continue;
        }
        let Some(entry) = context.get(&file.file_name) else {
            continue;
        };
        if entry.people.len() == 1 {
            let name = entry.people[0].clone();
            solo_videos_by_name.entry(name).or_default().push(file);
        }
    }

    let mut results = Vec::new();
    for (name, videos) in solo_videos_by_name {
        let mut clips = Vec::new();
        for video in videos {
            let audio = audio_decoder.extract_audio(&video.bytes).await?;
            clips.push(audio);
        }
        let concatenated = audio_decoder.concatenate(&clips).await?;
        results.push((name, concatenated));
    }
    Ok(results)
}

/// Provisions a voice clone for every `(name, audio)` pair whose registry
/// name (`<DisplayName>_voice_forgetmenot`) doesn't already exist, and
/// assigns the returned id onto the matching [`Person`] in `people`
/// in-place. Already-existing names are skipped without error.
pub async fn provision_voice_clones(
    voice_clone_registry: &Arc<dyn VoiceCloneRegistry>,
    people: &mut [Person],
    solo_voices: &[(String, Vec<u8>)],
) -> remind_core::Result<()> {
    let existing = voice_clone_registry.list().await?;

    for (name, audio_bytes) in solo_voices {
        let Some(person) = people.iter_mut().find(|p| &p.name == name) else {
            continue;
        };
        let registry_name = person.voice_clone_registry_name();
        if let Some(id) = existing.get(&registry_name) {
            person.voice_clone_id = Some(id.clone());
            continue;
        }
        let id = voice_clone_registry
            .create(&registry_name, audio_bytes.clone())
            .await?;
        person.voice_clone_id = Some(id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaKind;
    use async_trait::async_trait;
    use remind_core::traits::audio_decoder::fixtures::FixedAudioDecoder;
    use remind_core::{ContextEntry, Result as CoreResult};
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn context_with(entries: &[(&str, &[&str])]) -> ContextFile {
        let mut context = ContextFile {
            memory_context: "a day at the park".into(),
            entries: Default::default(),
        };
        for (file_name, people) in entries {
            context.insert(
                file_name,
                ContextEntry {
                    description: "desc".into(),
                    people: people.iter().map(|p| p.to_string()).collect(),
                    orientation: None,
                },
            );
        }
        context
    }

    #[tokio::test]
    async fn extract_solo_voices_only_considers_single_person_videos() {
        let decoder: Arc<dyn AudioDecoderAdapter> = Arc::new(FixedAudioDecoder { frame_count: 0 });
        let context = context_with(&[("a.mp4", &["steve"]), ("b.mp4", &["steve", "maria"])]);
        let files = vec![
            MediaFile { file_name: "a.mp4".into(), bytes: vec![1], kind: MediaKind::Video },
            MediaFile { file_name: "b.mp4".into(), bytes: vec![2], kind: MediaKind::Video },
        ];

        let voices = extract_solo_voices(&decoder, &context, &files).await.unwrap();
        assert_eq!(voices.len(), 1);
        assert_eq!(voices[0].0, "steve");
    }

    #[tokio::test]
    async fn extract_solo_voices_concatenates_in_filename_order() {
        let decoder: Arc<dyn AudioDecoderAdapter> = Arc::new(FixedAudioDecoder { frame_count: 0 });
        let context = context_with(&[("b.mp4", &["steve"]), ("a.mp4", &["steve"])]);
        let files = vec![
            MediaFile { file_name: "b.mp4".into(), bytes: vec![2], kind: MediaKind::Video },
            MediaFile { file_name: "a.mp4".into(), bytes: vec![1], kind: MediaKind::Video },
        ];

        let voices = extract_solo_voices(&decoder, &context, &files).await.unwrap();
        assert_eq!(voices[0].1, vec![1, 2]);
    }

    struct FakeVoiceCloneRegistry {
        existing: HashMap<String, String>,
        created: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl VoiceCloneRegistry for FakeVoiceCloneRegistry {
        async fn list(&self) -> CoreResult<HashMap<String, String>> {
            Ok(self.existing.clone())
        }

        async fn create(&self, name: &str, _audio_bytes: Vec<u8>) -> CoreResult<String> {
            self.created.lock().unwrap().push(name.to_string());
            Ok(format!("{name}-id"))
        }
    }

    #[tokio::test]
    async fn provision_voice_clones_creates_missing_and_skips_existing() {
        let registry: Arc<dyn VoiceCloneRegistry> = Arc::new(FakeVoiceCloneRegistry {
            existing: HashMap::from([("Maria_voice_forgetmenot".to_string(), "existing-id".to_string())]),
            created: Mutex::new(Vec::new()),
        });
        let mut people = vec![Person::new("Steve", vec![]), Person::new("Maria", vec![])];
        let solo_voices = vec![
            ("steve".to_string(), vec![1, 2, 3]),
            ("maria".to_string(), vec![4, 5, 6]),
        ];

        provision_voice_clones(&registry, &mut people, &solo_voices).await.unwrap();

        assert_eq!(people[0].voice_clone_id, Some("Steve_voice_forgetmenot-id".to_string()));
        assert_eq!(people[1].voice_clone_id, Some("existing-id".to_string()));
    }
}
