//! Events that can occur in a conversation

use crate::state_machine::state::ErrorKind;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    UserMessage {
        text: String,
    },
    /// Hide a persona from display and from future requests
    HidePersona {
        researcher: String,
    },

    // Completion events
    LlmResponse {
        text: String,
    },
    LlmError {
        message: String,
        error_kind: ErrorKind,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::UserMessage { .. } => "user_message",
            Event::HidePersona { .. } => "hide_persona",
            Event::LlmResponse { .. } => "llm_response",
            Event::LlmError { .. } => "llm_error",
        }
    }
}
