//! The Patient Query Runtime (C9): one query in, one [`DisplayPacket`] out.
//! Transcription and retrieval race via `tokio::join!`, then classification,
//! narration, and (in agent mode) voice synthesis run in sequence.

use remind_config::constants::{history as history_defaults, retrieval as retrieval_defaults};
use remind_core::traits::{LipSyncAdapter, SpeechToTextAdapter, TtsAdapter};
use remind_core::{DisplayMode, DisplayPacket, FileType, Orientation, RemindError, Result, Role};
use remind_classifier::Classifier;
use remind_history::ConversationHistoryStore;
use remind_narration::{NarrationBuilder, Style};
use remind_people::PersonRegistry;
use remind_retrieval::RetrievalEngine;
use std::sync::Arc;

pub struct QueryRequest {
    pub audio: Option<Vec<u8>>,
    pub transcript: Option<String>,
    pub topic: String,
    pub patient_id: String,
}

pub struct PatientQueryRuntime {
    retrieval: Arc<RetrievalEngine>,
    classifier: Arc<Classifier>,
    narration: Arc<NarrationBuilder>,
    history: Arc<ConversationHistoryStore>,
    people: Arc<PersonRegistry>,
    stt: Arc<dyn SpeechToTextAdapter>,
    tts: Arc<dyn TtsAdapter>,
    lipsync: Arc<dyn LipSyncAdapter>,
}

impl PatientQueryRuntime {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        retrieval: Arc<RetrievalEngine>,
        classifier: Arc<Classifier>,
        narration: Arc<NarrationBuilder>,
        history: Arc<ConversationHistoryStore>,
        people: Arc<PersonRegistry>,
        stt: Arc<dyn SpeechToTextAdapter>,
        tts: Arc<dyn TtsAdapter>,
        lipsync: Arc<dyn LipSyncAdapter>,
    ) -> Self {
        Self {
            retrieval,
            classifier,
            narration,
            history,
            people,
            stt,
            tts,
            lipsync,
        }
    }

    pub async fn query(&self, request: QueryRequest) -> Result<DisplayPacket> {
        let (transcript_result, retrieval_result) = tokio::join!(
            self.resolve_transcript(&request),
            self.retrieval
                .retrieve_memories(&request.topic, retrieval_defaults::DEFAULT_TOP_K, None)
        );
        let transcript = transcript_result?;
        let retrieved = retrieval_result?;

        self.history.append(&request.patient_id, &request.topic, Role::Patient, transcript.clone());

        let people = self.people.all();
        let classification = self.classifier.classify(&transcript, &retrieved, &people).await;

        let packet = if classification.display_mode == DisplayMode::Agent {
            self.compose_agent_reply(&request, &transcript, &retrieved).await?
        } else {
            self.compose_media_reply(&request, &transcript, &retrieved, classification.display_mode).await?
        };

        let logged_reply = packet.text.clone().unwrap_or_else(|| "<agent mode>".to_string());
        self.history.append(&request.patient_id, &request.topic, Role::Agent, logged_reply);

        Ok(packet)
    }

    async fn resolve_transcript(&self, request: &QueryRequest) -> Result<String> {
        if let Some(audio) = &request.audio {
            self.stt.transcribe(audio).await
        } else {
            request
                .transcript
                .clone()
                .ok_or_else(|| RemindError::InputError("query requires either audio or transcript".into()))
        }
    }

    fn history_context(&self, patient_id: &str, topic: &str) -> (Vec<remind_core::ConversationTurn>, Vec<String>) {
        let slice = self.history.slice(patient_id, topic, history_defaults::MAX_CONTEXT_TURNS);
        let anti_repeat = self.history.recent_agent(patient_id, topic, history_defaults::MAX_ANTI_REPEAT_TURNS);
        (slice, anti_repeat)
    }

    async fn compose_agent_reply(
        &self,
        request: &QueryRequest,
        transcript: &str,
        retrieved: &[remind_core::ScoredMemory],
    ) -> Result<DisplayPacket> {
        let target = self
            .people
            .mentioned_in(transcript)
            .into_iter()
            .find(|p| p.has_voice_clone())
            .or_else(|| {
                retrieved
                    .iter()
                    .flat_map(|m| m.record.people.iter())
                    .find_map(|name| self.people.get(name).filter(|p| p.has_voice_clone()))
            })
            .ok_or_else(|| {
                RemindError::InvariantViolation("agent display mode selected but no agent-capable person resolved".into())
            })?;

        let (history_slice, anti_repeat) = self.history_context(&request.patient_id, &request.topic);
        let text_draft = self
            .narration
            .narrate(transcript, retrieved, &history_slice, &anti_repeat, Style::PatientQuery)
            .await?;

        let voice_clone_id = target
            .voice_clone_id
            .as_deref()
            .ok_or_else(|| RemindError::InvariantViolation("agent target has no voice_clone_id".into()))?;
        let audio = self.tts.synthesize(&text_draft, voice_clone_id).await?;

        let face_exemplar = target
            .face_exemplars
            .first()
            .ok_or_else(|| RemindError::InvariantViolation("agent target has no face exemplars".into()))?;
        let video_url = self.lipsync.generate(face_exemplar, audio).await?;

        Ok(DisplayPacket {
            topic: request.topic.clone(),
            text: None,
            display_mode: DisplayMode::Agent,
            media: vec![video_url],
        })
    }

    async fn compose_media_reply(
        &self,
        request: &QueryRequest,
        transcript: &str,
        retrieved: &[remind_core::ScoredMemory],
        display_mode: DisplayMode,
    ) -> Result<DisplayPacket> {
        let (history_slice, anti_repeat) = self.history_context(&request.patient_id, &request.topic);
        let text = self
            .narration
            .narrate(transcript, retrieved, &history_slice, &anti_repeat, Style::PatientQuery)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "patient query narration failed, using template fallback");
                retrieved
                    .first()
                    .map(|m| NarrationBuilder::template_fallback(&m.record.event_name, &m.record.description))
                    .unwrap_or_default()
            });

        let (final_mode, media) = self.select_media(retrieved, display_mode);

        Ok(DisplayPacket {
            topic: request.topic.clone(),
            text: Some(text),
            display_mode: final_mode,
            media,
        })
    }

    /// Picks media URLs consistent with the arity of `display_mode`,
    /// stepping down within the picture family on a shortfall and upgrading
    /// `video` to `vertical_video` when the top-ranked video is vertical.
    fn select_media(&self, retrieved: &[remind_core::ScoredMemory], display_mode: DisplayMode) -> (DisplayMode, Vec<String>) {
        if display_mode.is_picture_mode() {
            let images: Vec<&str> = retrieved
                .iter()
                .filter(|m| m.record.file_type == FileType::Image)
                .map(|m| m.record.file_url.as_str())
                .collect();

            let mut mode = display_mode;
            while mode.is_picture_mode() && mode.arity() > images.len() {
                match mode.step_down() {
                    Some(next) => mode = next,
                    None => break,
                }
            }
            let media = images.into_iter().take(mode.arity()).map(str::to_string).collect();
            (mode, media)
        } else {
            let best_video = retrieved.iter().find(|m| m.record.file_type == FileType::Video);
            let mode = match (display_mode, best_video) {
                (_, Some(video)) if video.record.orientation == Some(Orientation::Vertical) => DisplayMode::VerticalVideo,
                _ => display_mode,
            };
            let media = best_video.map(|m| vec![m.record.file_url.clone()]).unwrap_or_default();
            (mode, media)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use remind_core::traits::embedding::fixtures::FakeEmbedder;
    use remind_core::traits::llm::fixtures::EchoLlm;
    use remind_core::traits::vector_store::fixtures::InMemoryVectorStore;
    use remind_core::{FileType as CoreFileType, MemoryRecord, Person};
    use remind_vault::VaultStore;
    use std::collections::BTreeSet;

    struct FixedStt(String);
    #[async_trait]
    impl SpeechToTextAdapter for FixedStt {
        async fn transcribe(&self, _audio_bytes: &[u8]) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    struct NoopTts;
    #[async_trait]
    impl TtsAdapter for NoopTts {
        async fn synthesize(&self, _text: &str, _voice_name: &str) -> Result<Vec<u8>> {
            Ok(vec![0u8, 1, 2])
        }
    }

    struct NoopLipSync;
    #[async_trait]
    impl LipSyncAdapter for NoopLipSync {
        async fn generate(&self, _image_or_video_url: &str, _audio: Vec<u8>) -> Result<String> {
            Ok("https://example/video.mp4".to_string())
        }
    }

    fn record(event: &str, file: &str, description: &str, file_type: CoreFileType) -> MemoryRecord {
        MemoryRecord {
            id: MemoryRecord::derive_id(event, file),
            event_name: event.to_string(),
            file_name: file.to_string(),
            file_type,
            description: description.to_string(),
            people: BTreeSet::new(),
            event_summary: format!("{event} summary"),
            file_url: format!("https://example/{event}/{file}"),
            orientation: None,
            embedding: None,
        }
    }

    async fn runtime_with(records: Vec<MemoryRecord>, transcript: &str) -> PatientQueryRuntime {
        let vault = Arc::new(VaultStore::new(
            Arc::new(FakeEmbedder { dim: 16 }),
            Arc::new(InMemoryVectorStore::new()),
        ));
        for r in records {
            vault.upsert(r).await.unwrap();
        }
        let narration = Arc::new(NarrationBuilder::new(Arc::new(EchoLlm)));
        let retrieval = Arc::new(RetrievalEngine::new(vault, Arc::clone(&narration), 30, "fake-embedder"));
        let classifier = Arc::new(Classifier::new(Arc::new(EchoLlm), 30));
        let history = Arc::new(ConversationHistoryStore::new(10, 24));
        let people = Arc::new(PersonRegistry::new());
        PatientQueryRuntime::new(
            retrieval,
            classifier,
            narration,
            history,
            people,
            Arc::new(FixedStt(transcript.to_string())),
            Arc::new(NoopTts),
            Arc::new(NoopLipSync),
        )
    }

    #[tokio::test]
    async fn non_agent_query_returns_text_and_media_and_appends_history() {
        let runtime = runtime_with(
            vec![record("disney trip", "a.png", "mickey mouse cinnamon roll", CoreFileType::Image)],
            "what did we eat",
        )
        .await;

        let packet = runtime
            .query(QueryRequest {
                audio: Some(vec![1, 2, 3]),
                transcript: None,
                topic: "disney trip".to_string(),
                patient_id: "p1".to_string(),
            })
            .await
            .unwrap();

        assert!(packet.text.is_some());
        assert_ne!(packet.display_mode, DisplayMode::Agent);

        let stats = runtime.history.stats("p1", "disney trip");
        assert_eq!(stats.patient_turns, 1);
        assert_eq!(stats.agent_turns, 1);
    }

    #[tokio::test]
    async fn agent_mode_with_no_resolvable_target_is_invariant_violation() {
        let runtime = runtime_with(vec![], "I want to talk to Steve").await;
        runtime.people.upsert(Person::new("Steve", vec!["https://example/steve.jpg".into()]));

        let result = runtime
            .query(QueryRequest {
                audio: None,
                transcript: Some("I want to talk to Steve".to_string()),
                topic: "steve".to_string(),
                patient_id: "p1".to_string(),
            })
            .await;
        assert!(matches!(result, Err(RemindError::InvariantViolation(_))));
    }

    #[tokio::test]
    async fn agent_mode_with_voice_clone_produces_silent_video_packet() {
        let runtime = runtime_with(vec![], "I want to talk to Steve").await;
        let mut steve = Person::new("Steve", vec!["https://example/steve.jpg".into()]);
        steve.voice_clone_id = Some("steve-vc".to_string());
        runtime.people.upsert(steve);

        let packet = runtime
            .query(QueryRequest {
                audio: None,
                transcript: Some("I want to talk to Steve".to_string()),
                topic: "steve".to_string(),
                patient_id: "p1".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(packet.display_mode, DisplayMode::Agent);
        assert!(packet.text.is_none());
        assert_eq!(packet.media.len(), 1);
    }

    #[tokio::test]
    async fn query_without_audio_or_transcript_is_input_error() {
        let runtime = runtime_with(vec![], "").await;
        let result = runtime
            .query(QueryRequest {
                audio: None,
                transcript: None,
                topic: "anything".to_string(),
                patient_id: "p1".to_string(),
            })
            .await;
        assert!(matches!(result, Err(RemindError::InputError(_))));
    }
}
