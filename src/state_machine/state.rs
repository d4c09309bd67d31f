//! Conversation state types

use crate::llm::LlmErrorKind;
use serde::{Deserialize, Serialize};

/// Error classification for UI display
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Auth,
    RateLimit,
    Network,
    ServerError,
    InvalidRequest,
    Unknown,
}

impl From<LlmErrorKind> for ErrorKind {
    fn from(kind: LlmErrorKind) -> Self {
        match kind {
            LlmErrorKind::Auth => ErrorKind::Auth,
            LlmErrorKind::RateLimit => ErrorKind::RateLimit,
            LlmErrorKind::Network => ErrorKind::Network,
            LlmErrorKind::ServerError => ErrorKind::ServerError,
            LlmErrorKind::InvalidRequest => ErrorKind::InvalidRequest,
            LlmErrorKind::Unknown => ErrorKind::Unknown,
        }
    }
}

/// Conversation state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConvState {
    /// Ready for user input, no pending operations
    #[default]
    Idle,

    /// Completion request in flight
    Processing,

    /// The last completion failed; the next message retries
    Error {
        message: String,
        error_kind: ErrorKind,
    },
}

impl ConvState {
    /// Check if a request is in flight
    pub fn is_busy(&self) -> bool {
        matches!(self, ConvState::Processing)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConvState::Idle => "idle",
            ConvState::Processing => "processing",
            ConvState::Error { .. } => "error",
        }
    }
}
