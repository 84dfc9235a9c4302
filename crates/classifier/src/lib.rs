//! The Intent/Display Classifier (C5): an ordered-rule cascade from
//! explicit heuristics down to an LLM fallback and a deterministic floor,
//! mirroring the ordered-intent-match style used elsewhere in this
//! workspace's agent-facing crates.

use once_cell::sync::Lazy;
use regex::Regex;
use remind_cache::{llm_key, TtlCache};
use remind_config::constants::classifier as classifier_defaults;
use remind_core::traits::{GenerationParams, LlmAdapter};
use remind_core::{DisplayMode, FileType, Orientation, Person, ScoredMemory};
use std::sync::Arc;

/// The classifier's decision plus a short rationale, logged but never shown
/// to the patient.
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    pub display_mode: DisplayMode,
    pub rationale: String,
}

static AGENT_HEURISTICS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\btalk to\b",
        r"(?i)\bask\b",
        r"(?i)\bwhat would\b.*\bsay\b",
        r"(?i)\bi want to hear\b",
        r"(?i)\bcan i speak (?:to|with)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static agent heuristic pattern"))
    .collect()
});

static VIDEO_KEYWORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(video|clip|recording|footage)\b").expect("static video keyword pattern"));

static PICTURE_KEYWORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(picture|pictures|photo|photos|pic|pics)\b").expect("static picture keyword pattern"));

pub struct Classifier {
    llm: Arc<dyn LlmAdapter>,
    /// Caches the step-3 LLM label lookup, keyed on the exact prompt. Safe
    /// to cache: the classification call runs at `LLM_TEMPERATURE == 0.0`,
    /// unlike narration's deliberately non-deterministic calls.
    cache: TtlCache<String>,
}

impl Classifier {
    pub fn new(llm: Arc<dyn LlmAdapter>, cache_ttl_minutes: i64) -> Self {
        Self {
            llm,
            cache: TtlCache::new(cache_ttl_minutes),
        }
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&self) {
        self.cache.clear()
    }

    /// Runs the four ordered display-mode rules, terminating at the first
    /// that both matches the utterance and can be satisfied by the
    /// available media inventory.
    pub async fn classify(
        &self,
        utterance: &str,
        retrieved: &[ScoredMemory],
        people: &[Person],
    ) -> ClassificationResult {
        let images: Vec<&ScoredMemory> = retrieved.iter().filter(|m| m.record.file_type == FileType::Image).collect();
        let videos: Vec<&ScoredMemory> = retrieved.iter().filter(|m| m.record.file_type == FileType::Video).collect();

        if let Some(result) = self.try_agent_heuristic(utterance, people) {
            return result;
        }

        if let Some(result) = self.try_explicit_media_kind(utterance, &images, &videos) {
            return result;
        }

        if let Some(result) = self.try_llm_classification(utterance, &images, &videos, people).await {
            return result;
        }

        self.deterministic_fallback(&images, &videos, people)
    }

    fn try_agent_heuristic(&self, utterance: &str, people: &[Person]) -> Option<ClassificationResult> {
        if !AGENT_HEURISTICS.iter().any(|re| re.is_match(utterance)) {
            return None;
        }
        let utterance_lower = utterance.to_lowercase();
        let named = people
            .iter()
            .find(|p| p.has_voice_clone() && utterance_lower.contains(&p.name))?;
        Some(ClassificationResult {
            display_mode: DisplayMode::Agent,
            rationale: format!("agent heuristic matched for {}", named.display_name),
        })
    }

    fn try_explicit_media_kind(
        &self,
        utterance: &str,
        images: &[&ScoredMemory],
        videos: &[&ScoredMemory],
    ) -> Option<ClassificationResult> {
        if VIDEO_KEYWORDS.is_match(utterance) {
            if let Some(best) = videos.first() {
                let mode = if best.record.orientation == Some(Orientation::Vertical) {
                    DisplayMode::VerticalVideo
                } else {
                    DisplayMode::Video
                };
                return Some(ClassificationResult {
                    display_mode: mode,
                    rationale: "utterance explicitly named video".to_string(),
                });
            }
        }

        if PICTURE_KEYWORDS.is_match(utterance) {
            let mode = DisplayMode::for_image_count(images.len()).unwrap_or(DisplayMode::Video);
            if mode == DisplayMode::Video && videos.is_empty() {
                return None;
            }
            return Some(ClassificationResult {
                display_mode: mode,
                rationale: "utterance explicitly named pictures".to_string(),
            });
        }

        None
    }

    async fn try_llm_classification(
        &self,
        utterance: &str,
        images: &[&ScoredMemory],
        videos: &[&ScoredMemory],
        people: &[Person],
    ) -> Option<ClassificationResult> {
        let prompt = format!(
            "Choose exactly one label from [three_pics, four_pics, five_pics, video, vertical_video, agent] \
             for this request.\nRequest: {utterance}\nAvailable images: {}\nAvailable videos: {}\nAgent-capable people: {}\nLabel:",
            images.len(),
            videos.len(),
            people.iter().filter(|p| p.has_voice_clone()).count(),
        );

        let cache_key = llm_key(&prompt);
        let raw = match self.cache.get(&cache_key) {
            Some(cached) => cached,
            None => {
                let generated = self
                    .llm
                    .generate(
                        &prompt,
                        None,
                        GenerationParams {
                            temperature: classifier_defaults::LLM_TEMPERATURE,
                            max_tokens: classifier_defaults::LLM_MAX_TOKENS,
                        },
                    )
                    .await
                    .map_err(|e| tracing::warn!(error = %e, "classifier LLM call failed, falling back"))
                    .ok()?;
                self.cache.put(cache_key, generated.clone());
                generated
            }
        };

        let label = raw.trim().to_lowercase();
        let mode = match label.as_str() {
            "three_pics" => DisplayMode::ThreePics,
            "four_pics" => DisplayMode::FourPics,
            "five_pics" => DisplayMode::FivePics,
            "video" => DisplayMode::Video,
            "vertical_video" => DisplayMode::VerticalVideo,
            "agent" => DisplayMode::Agent,
            _ => {
                tracing::warn!(label = %label, "classifier LLM returned an invalid label, falling back");
                return None;
            }
        };

        let mode = self.step_down_if_needed(mode, images.len());
        Some(ClassificationResult {
            display_mode: mode,
            rationale: format!("LLM classifier selected {label}"),
        })
    }

    fn deterministic_fallback(
        &self,
        images: &[&ScoredMemory],
        videos: &[&ScoredMemory],
        people: &[Person],
    ) -> ClassificationResult {
        let (mode, rationale) = if !videos.is_empty() {
            (DisplayMode::Video, "deterministic fallback: video available")
        } else if images.len() >= 4 {
            (DisplayMode::FourPics, "deterministic fallback: four or more images")
        } else if !images.is_empty() {
            (DisplayMode::ThreePics, "deterministic fallback: default to three pics")
        } else if people.iter().any(|p| p.has_voice_clone()) {
            (DisplayMode::Agent, "deterministic fallback: agent-capable person present")
        } else {
            (DisplayMode::ThreePics, "deterministic fallback: final floor")
        };
        ClassificationResult {
            display_mode: mode,
            rationale: rationale.to_string(),
        }
    }

    /// Picture modes step down within the family until arity is satisfiable
    /// by the available image count.
    fn step_down_if_needed(&self, mode: DisplayMode, image_count: usize) -> DisplayMode {
        let mut current = mode;
        while current.is_picture_mode() && current.arity() > image_count {
            match current.step_down() {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remind_core::traits::llm::fixtures::EchoLlm;
    use remind_core::MemoryRecord;
    use std::collections::BTreeSet;

    fn media(file_type: FileType, orientation: Option<Orientation>) -> ScoredMemory {
        ScoredMemory {
            record: MemoryRecord {
                id: MemoryRecord::derive_id("trip", "a"),
                event_name: "trip".into(),
                file_name: "a".into(),
                file_type,
                description: "desc".into(),
                people: BTreeSet::new(),
                event_summary: "summary".into(),
                file_url: "https://example/a".into(),
                orientation,
                embedding: None,
            },
            similarity: 0.8,
        }
    }

    fn classifier() -> Classifier {
        Classifier::new(Arc::new(EchoLlm), 30)
    }

    #[tokio::test]
    async fn agent_heuristic_matches_named_person_with_voice_clone() {
        let mut person = Person::new("Steve", vec!["https://example/steve.jpg".into()]);
        person.voice_clone_id = Some("vc-1".into());
        let result = classifier()
            .classify("I want to talk to Steve", &[], std::slice::from_ref(&person))
            .await;
        assert_eq!(result.display_mode, DisplayMode::Agent);
    }

    #[tokio::test]
    async fn agent_heuristic_does_not_match_person_without_voice_clone() {
        let person = Person::new("Steve", vec!["https://example/steve.jpg".into()]);
        let result = classifier().classify("I want to talk to Steve", &[], &[person]).await;
        assert_ne!(result.display_mode, DisplayMode::Agent);
    }

    #[tokio::test]
    async fn explicit_video_keyword_selects_video_mode() {
        let retrieved = vec![media(FileType::Video, Some(Orientation::Horizontal))];
        let result = classifier().classify("show me the clip", &retrieved, &[]).await;
        assert_eq!(result.display_mode, DisplayMode::Video);
    }

    #[tokio::test]
    async fn explicit_video_keyword_prefers_vertical_when_best_candidate_is_vertical() {
        let retrieved = vec![media(FileType::Video, Some(Orientation::Vertical))];
        let result = classifier().classify("play the video", &retrieved, &[]).await;
        assert_eq!(result.display_mode, DisplayMode::VerticalVideo);
    }

    #[tokio::test]
    async fn explicit_picture_keyword_with_few_images_falls_back_to_video() {
        let retrieved = vec![
            media(FileType::Image, None),
            media(FileType::Video, Some(Orientation::Horizontal)),
        ];
        let result = classifier().classify("show me a photo", &retrieved, &[]).await;
        assert_eq!(result.display_mode, DisplayMode::Video);
    }

    #[tokio::test]
    async fn explicit_picture_keyword_picks_mode_by_image_count() {
        let retrieved = vec![media(FileType::Image, None); 4];
        let result = classifier().classify("show me some pictures", &retrieved, &[]).await;
        assert_eq!(result.display_mode, DisplayMode::FourPics);
    }

    #[tokio::test]
    async fn deterministic_fallback_prefers_video_when_available() {
        let retrieved = vec![media(FileType::Video, Some(Orientation::Horizontal))];
        let result = classifier().classify("tell me something", &retrieved, &[]).await;
        assert_eq!(result.display_mode, DisplayMode::Video);
    }

    #[tokio::test]
    async fn deterministic_fallback_with_nothing_retrieved_is_three_pics() {
        let result = classifier().classify("hello", &[], &[]).await;
        assert_eq!(result.display_mode, DisplayMode::ThreePics);
    }

    struct CountingLlm {
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl LlmAdapter for CountingLlm {
        async fn generate(
            &self,
            _prompt: &str,
            _media: Option<&[u8]>,
            _params: GenerationParams,
        ) -> remind_core::Result<String> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok("five_pics".to_string())
        }
    }

    #[tokio::test]
    async fn repeated_llm_classification_for_the_same_utterance_hits_the_cache() {
        let llm = Arc::new(CountingLlm { calls: std::sync::atomic::AtomicUsize::new(0) });
        let classifier = Classifier::new(llm.clone(), 30);

        let retrieved = vec![media(FileType::Image, None); 5];
        let media_refs: Vec<ScoredMemory> = retrieved;
        classifier.classify("an utterance with no keyword match", &media_refs, &[]).await;
        classifier.classify("an utterance with no keyword match", &media_refs, &[]).await;

        assert_eq!(llm.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(classifier.cache_len(), 1);
    }
}
