//! Server configuration and page copy

use crate::llm::LlmConfig;
use crate::runtime::DEFAULT_DISCONNECT_GRACE;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_CONTACT_URL: &str = "https://profiles.uts.edu.au/Glen.Babington";

pub const PAGE_TITLE: &str = "💬 Chat with UTS Research";
pub const PAGE_DESCRIPTION: &str = "University of Technology Sydney (UTS) had over 1,000 researchers across various disciplines and research programs. Chat privately with our AI to discover which UTS researchers can help you.";
pub const PAGE_WARNING: &str = "This demo AI agent is trained on famous scientists, rather than using proprietary data about UTS research.";
pub const MISSING_KEY_MESSAGE: &str = "Please add your OpenAI API key to continue.";

/// Application configuration, read from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Target of every persona's Contact link
    pub contact_url: String,
    /// Sessions end once no page has been streaming them for this long
    pub disconnect_grace: Duration,
    pub llm: LlmConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            contact_url: DEFAULT_CONTACT_URL.to_string(),
            disconnect_grace: DEFAULT_DISCONNECT_GRACE,
            llm: LlmConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PERSONA_CHAT_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let contact_url = lookup("PERSONA_CHAT_CONTACT_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTACT_URL.to_string());

        let disconnect_grace = lookup("PERSONA_CHAT_DISCONNECT_GRACE_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|&secs| secs > 0)
            .map_or(DEFAULT_DISCONNECT_GRACE, Duration::from_secs);

        Self {
            port,
            contact_url,
            disconnect_grace,
            llm: LlmConfig::from_env(),
        }
    }
}
