//! Pure state transition function
//!
//! Given the same state, session and event it always produces the same
//! result, with no I/O side effects. The session is read, never written:
//! every mutation is expressed as an [`Effect`].

use super::{ConvState, Effect, Event};
use crate::persona::AssistantContent;
use crate::session::{remaining, Session};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Agent is busy, wait for the current reply")]
    AgentBusy,
    #[error("Message is empty")]
    EmptyMessage,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

pub fn transition(
    state: &ConvState,
    session: &Session,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // Idle/Error + UserMessage -> Processing
        (ConvState::Idle | ConvState::Error { .. }, Event::UserMessage { text }) => {
            if text.trim().is_empty() {
                return Err(TransitionError::EmptyMessage);
            }
            Ok(TransitionResult::new(ConvState::Processing)
                .with_effect(Effect::append_user_message(text))
                .with_effect(Effect::NotifyStateChange)
                .with_effect(Effect::RequestCompletion))
        }

        // The transcript must not change underneath an in-flight request
        (ConvState::Processing, Event::UserMessage { .. } | Event::HidePersona { .. }) => {
            Err(TransitionError::AgentBusy)
        }

        // Hiding is local: no completion call, state unchanged
        (ConvState::Idle | ConvState::Error { .. }, Event::HidePersona { researcher }) => {
            let notice = departure_notice(
                &researcher,
                &remaining(
                    session.active_personas(),
                    session.excluded_personas(),
                    Some(researcher.as_str()),
                ),
            );
            Ok(TransitionResult::new(state.clone())
                .with_effect(Effect::ExcludePersona { researcher })
                .with_effect(Effect::append_assistant_message(notice)))
        }

        // Processing + LlmResponse -> Idle
        (ConvState::Processing, Event::LlmResponse { text }) => {
            let names = AssistantContent::parse(&text).researchers();
            let mut result = TransitionResult::new(ConvState::Idle)
                .with_effect(Effect::append_assistant_message(text));
            if !names.is_empty() {
                result = result.with_effect(Effect::RegisterPersonas { names });
            }
            Ok(result.with_effect(Effect::NotifyStateChange))
        }

        // Processing + LlmError -> Error (recoverable)
        (ConvState::Processing, Event::LlmError { message, error_kind }) => {
            Ok(TransitionResult::new(ConvState::Error { message, error_kind })
                .with_effect(Effect::NotifyStateChange))
        }

        // Completion outcomes only make sense while a request is in flight
        (state, event @ (Event::LlmResponse { .. } | Event::LlmError { .. })) => {
            Err(TransitionError::InvalidTransition(format!(
                "{} in state {}",
                event.name(),
                state.name()
            )))
        }
    }
}

/// Synthetic transcript entry announcing that a persona left
pub fn departure_notice(researcher: &str, remaining: &[&str]) -> String {
    if remaining.is_empty() {
        format!("{researcher} has left the chat.")
    } else {
        format!(
            "{researcher} has left the chat. Please continue your chat with {}.",
            remaining.join(" and ")
        )
    }
}
