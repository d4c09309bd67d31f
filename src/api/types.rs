//! API request and response types

use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

/// Request to hide a persona
#[derive(Debug, Deserialize)]
pub struct HideRequest {
    pub researcher: String,
}

/// Page header and credential status
#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub title: &'static str,
    pub description: &'static str,
    pub warning: &'static str,
    pub configured: bool,
    pub model: String,
    /// Actionable message when no key is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<&'static str>,
}

/// Response for session creation
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
}

/// Response for chat and hide actions
#[derive(Debug, Serialize)]
pub struct QueuedResponse {
    pub queued: bool,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
