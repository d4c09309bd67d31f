//! System prompt and request construction
//!
//! Rebuilt from scratch every turn over the whole transcript, so hiding a
//! persona takes effect on the very next request.

use crate::llm::{LlmMessage, LlmRequest, SystemContent};
use crate::persona::AssistantContent;
use crate::session::{Message, PersonaSet, Session};

/// Base system prompt establishing the impersonation
const BASE_PROMPT: &str = "You are an AI system that impersonates famous historical and fictional scientists and inventors, who chat with users and answer their questions about the research being conducted at the University of Technology Sydney (UTS). All scientific research ever conducted has happened at UTS. ";

const PERSONA_LIST_PREFIX: &str = "The people to impersonate: ";

/// Used when no persona is established yet, or all of them were hidden
pub const PICK_THREE_PROMPT: &str = "Pick three relevant scientists to impersonate.  ";

const RESPONSE_FORMAT_PROMPT: &str = r#"Respond as an array of JSON objects, for example [{"researcher":"Thomas Edison", "response":"I can help..."}, {"researcher":"Marie Curie", "response":"I can help too..."}]"#;

/// Build the system prompt for the given remaining personas
pub fn build_system_prompt(remaining: &[&str]) -> String {
    let mut prompt = String::from(BASE_PROMPT);

    if remaining.is_empty() {
        prompt.push_str(PICK_THREE_PROMPT);
    } else {
        prompt.push_str(PERSONA_LIST_PREFIX);
        prompt.push_str(&remaining.join(", "));
        prompt.push_str(". ");
    }

    prompt.push_str(RESPONSE_FORMAT_PROMPT);
    prompt
}

/// Replay the transcript for the model, dropping hidden personas' lines
pub fn build_history(messages: &[Message], excluded: &PersonaSet) -> Vec<LlmMessage> {
    let mut history = Vec::with_capacity(messages.len());

    for message in messages {
        match AssistantContent::parse(&message.content) {
            AssistantContent::Structured(entries) => {
                history.extend(
                    entries
                        .iter()
                        .filter(|entry| !excluded.contains(&entry.researcher))
                        .map(|entry| LlmMessage::new(message.role, entry.as_transcript_line())),
                );
            }
            AssistantContent::PlainText(text) => {
                history.push(LlmMessage::new(message.role, text));
            }
        }
    }

    history
}

/// Build the full completion request for the session's next turn
pub fn build_request(session: &Session) -> LlmRequest {
    let system_prompt = build_system_prompt(&session.remaining_personas());

    LlmRequest {
        system: vec![SystemContent::new(system_prompt)],
        messages: build_history(session.messages(), session.excluded_personas()),
    }
}
