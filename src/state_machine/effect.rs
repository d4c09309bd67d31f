//! Effects produced by state transitions

use crate::llm::MessageRole;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append an entry to the transcript
    AppendMessage { role: MessageRole, content: String },

    /// Record personas seen in a reply
    RegisterPersonas { names: Vec<String> },

    /// Add a persona to the exclusion set
    ExcludePersona { researcher: String },

    /// Build the request from the session and call the completion service
    RequestCompletion,

    /// Tell connected clients the conversation state changed
    NotifyStateChange,
}

impl Effect {
    pub fn append_user_message(content: impl Into<String>) -> Self {
        Effect::AppendMessage {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn append_assistant_message(content: impl Into<String>) -> Self {
        Effect::AppendMessage {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}
