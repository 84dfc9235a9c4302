//! The Narration Builder (C6): composes a prompt from retrieved memories,
//! conversation history, and an anti-repetition list; invokes the LLM;
//! post-filters the result for length and near-duplication.

pub mod postfilter;
pub mod prompt;

use postfilter::{is_near_duplicate, trim_to_target};
use prompt::{build_prompt, NarrationStyle, PromptInputs};
use remind_config::constants::narration as narration_defaults;
use remind_core::traits::{GenerationParams, LlmAdapter};
use remind_core::{ConversationTurn, RemindError, Result, ScoredMemory};
use std::sync::Arc;

pub use prompt::NarrationStyle as Style;

pub struct NarrationBuilder {
    llm: Arc<dyn LlmAdapter>,
}

impl NarrationBuilder {
    pub fn new(llm: Arc<dyn LlmAdapter>) -> Self {
        Self { llm }
    }

    /// Generates and post-filters one narration. A caller with no history
    /// (Retrieval's own `answer` synthesis) simply passes empty slices;
    /// the anti-repetition step becomes a no-op per the design's boundary
    /// behavior for empty history.
    pub async fn narrate(
        &self,
        query: &str,
        retrieved: &[ScoredMemory],
        history_slice: &[ConversationTurn],
        anti_repeat_list: &[String],
        style: NarrationStyle,
    ) -> Result<String> {
        let first_attempt = self
            .generate_once(query, retrieved, history_slice, anti_repeat_list, style, false)
            .await?;

        if anti_repeat_list.is_empty()
            || !is_near_duplicate(
                &first_attempt,
                anti_repeat_list,
                narration_defaults::NEAR_DUPLICATE_OVERLAP_THRESHOLD,
            )
        {
            return Ok(first_attempt);
        }

        tracing::warn!("narration near-duplicate detected, retrying with stronger anti-repeat directive");
        let second_attempt = self
            .generate_once(query, retrieved, history_slice, anti_repeat_list, style, true)
            .await?;

        // Even if the second attempt is still a near-duplicate, returning
        // it is preferred over surfacing an error to the patient.
        Ok(second_attempt)
    }

    async fn generate_once(
        &self,
        query: &str,
        retrieved: &[ScoredMemory],
        history_slice: &[ConversationTurn],
        anti_repeat_list: &[String],
        style: NarrationStyle,
        strengthen_anti_repeat: bool,
    ) -> Result<String> {
        let prompt = build_prompt(&PromptInputs {
            query,
            retrieved,
            history_slice,
            anti_repeat_list,
            style,
            strengthen_anti_repeat,
        });

        let raw = self
            .llm
            .generate(
                &prompt,
                None,
                GenerationParams {
                    temperature: narration_defaults::TEMPERATURE,
                    max_tokens: narration_defaults::MAX_TOKENS,
                },
            )
            .await
            .map_err(|e| RemindError::NarrationUnavailable(e.to_string()))?;

        Ok(trim_to_target(
            &raw,
            narration_defaults::TARGET_WORDS_MIN,
            narration_defaults::TARGET_WORDS_MAX,
        ))
    }

    /// A deterministic fallback narration when the LLM is unavailable and
    /// the caller accepts a template (Experience Composer's per-scene
    /// degrade path): lists the event name and the top description.
    pub fn template_fallback(event_name: &str, top_description: &str) -> String {
        if top_description.trim().is_empty() {
            format!("Here are some memories from {event_name}.")
        } else {
            format!("From {event_name}: {top_description}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use remind_core::traits::llm::fixtures::EchoLlm;
    use remind_core::{FileType, MemoryRecord};
    use std::collections::BTreeSet;

    struct ScriptedLlm {
        responses: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmAdapter for ScriptedLlm {
        async fn generate(&self, _prompt: &str, _media: Option<&[u8]>, _params: GenerationParams) -> Result<String> {
            Ok(self.responses.lock().remove(0))
        }
    }

    fn memory(description: &str) -> ScoredMemory {
        ScoredMemory {
            record: MemoryRecord {
                id: MemoryRecord::derive_id("disney trip", "a.mp4"),
                event_name: "disney trip".into(),
                file_name: "a.mp4".into(),
                file_type: FileType::Video,
                description: description.to_string(),
                people: BTreeSet::new(),
                event_summary: "a trip to disney".into(),
                file_url: "https://example/a.mp4".into(),
                orientation: None,
                embedding: None,
            },
            similarity: 0.9,
        }
    }

    #[tokio::test]
    async fn narrate_with_empty_history_proceeds_unconstrained() {
        let builder = NarrationBuilder::new(Arc::new(EchoLlm));
        let result = builder
            .narrate("what did we eat", &[memory("cinnamon roll")], &[], &[], Style::PatientQuery)
            .await
            .unwrap();
        assert!(!result.is_empty());
    }

    #[tokio::test]
    async fn near_duplicate_triggers_one_retry_then_returns_second_attempt() {
        let llm = ScriptedLlm {
            responses: Mutex::new(vec![
                "we had a wonderful day at the beach together.".to_string(),
                "the waves were loud and the sand was warm underfoot.".to_string(),
            ]),
        };
        let builder = NarrationBuilder::new(Arc::new(llm));
        let anti_repeat = vec!["we had a wonderful day at the beach together.".to_string()];
        let result = builder
            .narrate("tell me more", &[], &[], &anti_repeat, Style::PatientQuery)
            .await
            .unwrap();
        assert_eq!(result, "the waves were loud and the sand was warm underfoot.");
    }

    #[test]
    fn template_fallback_lists_event_and_description() {
        let text = NarrationBuilder::template_fallback("disney trip", "cinnamon roll with Mickey");
        assert!(text.contains("disney trip"));
        assert!(text.contains("cinnamon roll"));
    }
}
