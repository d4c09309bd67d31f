//! Session state: the append-only transcript and the persona roster
//!
//! The transcript plus the exclusion set are the single source of truth;
//! request messages and rendered panels are derived from them on demand.

use crate::llm::MessageRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A transcript entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    #[cfg(test)]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    #[cfg(test)]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Insertion-ordered set of persona names. Names compare by exact string
/// equality, case included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PersonaSet(Vec<String>);

impl PersonaSet {
    /// Add a name; returns false if it was already present
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.0.push(name);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<S: Into<String>> FromIterator<S> for PersonaSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = PersonaSet::default();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

/// One user's conversation
#[derive(Debug, Clone, Default)]
pub struct Session {
    messages: Vec<Message>,
    active_personas: PersonaSet,
    excluded_personas: PersonaSet,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Every persona ever seen in a reply
    pub fn active_personas(&self) -> &PersonaSet {
        &self.active_personas
    }

    /// Personas the user has hidden
    pub fn excluded_personas(&self) -> &PersonaSet {
        &self.excluded_personas
    }

    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn register_personas<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            if self.active_personas.insert(name) {
                tracing::debug!(count = self.active_personas.len(), "Persona registered");
            }
        }
    }

    /// Hide a persona. Tolerates names that never appeared.
    pub fn exclude(&mut self, researcher: impl Into<String>) -> bool {
        self.excluded_personas.insert(researcher)
    }

    /// Active personas that are not hidden, in first-seen order
    pub fn remaining_personas(&self) -> Vec<&str> {
        remaining(&self.active_personas, &self.excluded_personas, None)
    }
}

/// `active - excluded - also_excluded`, deduplicated, first-seen order
pub fn remaining<'a>(
    active: &'a PersonaSet,
    excluded: &PersonaSet,
    also_excluded: Option<&str>,
) -> Vec<&'a str> {
    active
        .iter()
        .filter(|name| !excluded.contains(name) && Some(*name) != also_excluded)
        .collect()
}
