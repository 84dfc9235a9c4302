//! Prompt composition for narration calls: `Message`/`Role` structs
//! arranged into the four-block structure the design calls for instead of
//! a general chat-history builder.

use remind_core::{ConversationTurn, ScoredMemory};

/// Style hint threaded through to the instruction block: a plain utterance
/// query, or a therapist-authored scene prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationStyle {
    PatientQuery,
    Scene,
}

pub struct PromptInputs<'a> {
    pub query: &'a str,
    pub retrieved: &'a [ScoredMemory],
    pub history_slice: &'a [ConversationTurn],
    pub anti_repeat_list: &'a [String],
    pub style: NarrationStyle,
    pub strengthen_anti_repeat: bool,
}

/// Builds the language-neutral prompt: instruction, grounding block,
/// history block, anti-repetition block, then the query itself.
pub fn build_prompt(inputs: &PromptInputs) -> String {
    let mut sections = Vec::new();

    sections.push(instruction_block(inputs.style));

    if !inputs.retrieved.is_empty() {
        sections.push(grounding_block(inputs.retrieved));
    }

    if !inputs.history_slice.is_empty() {
        sections.push(history_block(inputs.history_slice));
    }

    if !inputs.anti_repeat_list.is_empty() {
        sections.push(anti_repeat_block(
            inputs.anti_repeat_list,
            inputs.strengthen_anti_repeat,
        ));
    }

    sections.push(format!("Query: {}", inputs.query));

    sections.join("\n\n")
}

fn instruction_block(style: NarrationStyle) -> String {
    let subject = match style {
        NarrationStyle::PatientQuery => "the person you are speaking with",
        NarrationStyle::Scene => "the scene described below",
    };
    format!(
        "You are composing a warm, gentle, second-person narration for {subject}, a person living \
         with dementia. Speak only from the facts given below; never invent names, places, or \
         events that are not present. Never mention that you are an AI or a system."
    )
}

fn grounding_block(retrieved: &[ScoredMemory]) -> String {
    let bullets = retrieved
        .iter()
        .map(|m| {
            let people = if m.record.people.is_empty() {
                String::new()
            } else {
                format!(
                    " (with {})",
                    m.record.people.iter().cloned().collect::<Vec<_>>().join(", ")
                )
            };
            format!(
                "- {}: {}{}",
                m.record.event_summary, m.record.description, people
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("Grounding (do not mention URLs):\n{bullets}")
}

fn history_block(history: &[ConversationTurn]) -> String {
    let lines = history
        .iter()
        .map(|turn| format!("{}: {}", turn.role.as_str(), turn.message))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Recent conversation:\n{lines}")
}

fn anti_repeat_block(anti_repeat_list: &[String], strengthen: bool) -> String {
    let quoted = anti_repeat_list
        .iter()
        .map(|m| format!("- \"{m}\""))
        .collect::<Vec<_>>()
        .join("\n");
    let directive = if strengthen {
        "Do not repeat or paraphrase any of the following in any form, even partially; use \
         entirely different wording and details:"
    } else {
        "Do not repeat or paraphrase the following:"
    };
    format!("{directive}\n{quoted}")
}
