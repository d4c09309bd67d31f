//! Transcript rendering
//!
//! A pure function of the stored transcript and the exclusion set. Every
//! message is re-classified on every render; nothing derived is cached.

use crate::llm::MessageRole;
use crate::persona::{AssistantContent, PersonaResponse};
use crate::session::{Message, PersonaSet, Session};
use crate::state_machine::ConvState;
use chrono::{DateTime, Utc};
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};
use serde::Serialize;

pub const EMPTY_PLACEHOLDER: &str = "What's your research interest?";
pub const CONTINUE_PLACEHOLDER: &str = "Continue your chat";

/// One persona column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Panel {
    pub researcher: String,
    pub response: String,
    pub response_html: String,
    pub contact_url: String,
    /// Only offered when more than one panel is visible in the message
    pub can_hide: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageBody {
    Panels { panels: Vec<Panel> },
    Text { text: String, html: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedMessage {
    pub role: MessageRole,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub body: MessageBody,
}

impl RenderedMessage {
    #[cfg(test)]
    fn panels(&self) -> &[Panel] {
        match &self.body {
            MessageBody::Panels { panels } => panels,
            MessageBody::Text { .. } => &[],
        }
    }
}

/// Everything the page needs to draw a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptView {
    pub state: ConvState,
    pub placeholder: &'static str,
    pub messages: Vec<RenderedMessage>,
}

impl TranscriptView {
    pub fn build(session: &Session, state: &ConvState, contact_url: &str) -> Self {
        Self {
            state: state.clone(),
            placeholder: placeholder(session.messages()),
            messages: render_transcript(session.messages(), session.excluded_personas(), contact_url),
        }
    }
}

/// Input placeholder for the current history
pub fn placeholder(messages: &[Message]) -> &'static str {
    if messages.is_empty() {
        EMPTY_PLACEHOLDER
    } else {
        CONTINUE_PLACEHOLDER
    }
}

pub fn render_transcript(
    messages: &[Message],
    excluded: &PersonaSet,
    contact_url: &str,
) -> Vec<RenderedMessage> {
    messages
        .iter()
        .map(|message| render_message(message, excluded, contact_url))
        .collect()
}

/// Render a single message. Structured content whose personas are all
/// hidden renders as an empty panel row.
pub fn render_message(message: &Message, excluded: &PersonaSet, contact_url: &str) -> RenderedMessage {
    let body = match AssistantContent::parse(&message.content) {
        AssistantContent::Structured(entries) => MessageBody::Panels {
            panels: render_panels(&entries, excluded, contact_url),
        },
        AssistantContent::PlainText(text) => MessageBody::Text {
            html: markdown_to_html(&text),
            text,
        },
    };

    RenderedMessage {
        role: message.role,
        created_at: message.created_at,
        body,
    }
}

fn render_panels(entries: &[PersonaResponse], excluded: &PersonaSet, contact_url: &str) -> Vec<Panel> {
    let visible: Vec<&PersonaResponse> = entries
        .iter()
        .filter(|entry| !excluded.contains(&entry.researcher))
        .collect();
    let can_hide = visible.len() > 1;

    visible
        .into_iter()
        .map(|entry| Panel {
            researcher: entry.researcher.clone(),
            response: entry.response.clone(),
            response_html: markdown_to_html(&entry.response),
            contact_url: contact_url.to_string(),
            can_hide,
        })
        .collect()
}

/// Render model-authored markdown. Raw HTML in the source is shown as text,
/// and links or images with a scheme outside http, https and mailto point
/// nowhere.
pub fn markdown_to_html(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    let parser = Parser::new_ext(source, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: checked_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: checked_url(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

fn checked_url(dest: CowStr<'_>) -> CowStr<'_> {
    if is_allowed_url(&dest) {
        dest
    } else {
        tracing::debug!(url = %dest, "Dropping link with disallowed scheme");
        CowStr::Borrowed("#")
    }
}

/// Relative URLs pass; absolute ones need an allowed scheme
fn is_allowed_url(dest: &str) -> bool {
    let head = dest.split(['/', '?', '#']).next().unwrap_or_default();
    match head.split_once(':') {
        None => true,
        Some((scheme, _)) => {
            // Browsers ignore tabs and newlines inside a scheme
            let scheme: String = scheme
                .chars()
                .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
                .collect();
            ["http", "https", "mailto"]
                .iter()
                .any(|allowed| scheme.eq_ignore_ascii_case(allowed))
        }
    }
}
