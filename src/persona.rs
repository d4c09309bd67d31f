//! Persona replies: the structured shape the model is asked to answer in
//!
//! Assistant content is either a JSON array of `{researcher, response}`
//! objects or free text. The decision is made by a strict schema parse, so
//! anything that is not exactly that shape stays plain text forever.

use serde::{Deserialize, Serialize};


/// One persona's contribution to an assistant turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaResponse {
    pub researcher: String,
    pub response: String,
}

impl PersonaResponse {
    #[cfg(test)]
    pub fn new(researcher: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            researcher: researcher.into(),
            response: response.into(),
        }
    }

    /// Flattened form used when replaying history to the model
    pub fn as_transcript_line(&self) -> String {
        format!("{}: {}", self.researcher, self.response)
    }
}

/// Message content, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantContent {
    Structured(Vec<PersonaResponse>),
    PlainText(String),
}

impl AssistantContent {
    /// Classify raw message content.
    ///
    /// An empty array is plain text: there is nothing to lay out in columns.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Vec<PersonaResponse>>(raw) {
            Ok(entries) if !entries.is_empty() => AssistantContent::Structured(entries),
            Ok(_) => {
                tracing::debug!("Persona array is empty, rendering as text");
                AssistantContent::PlainText(raw.to_string())
            }
            Err(e) => {
                tracing::debug!(category = ?e.classify(), error = %e, "Content is not a persona array");
                AssistantContent::PlainText(raw.to_string())
            }
        }
    }

    /// Persona names in reply order (empty for plain text)
    pub fn researchers(&self) -> Vec<String> {
        match self {
            AssistantContent::Structured(entries) => {
                entries.iter().map(|e| e.researcher.clone()).collect()
            }
            AssistantContent::PlainText(_) => Vec::new(),
        }
    }
}

/// Encode persona replies the way the model is asked to answer
#[cfg(test)]
pub(crate) fn encode(entries: &[PersonaResponse]) -> String {
    serde_json::to_string(entries).unwrap_or_else(|_| "[]".to_string())
}
