//! Model registry: builds the completion service from configuration

use super::{LlmService, LoggingService, OpenAIService, CHAT_MODEL};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Configuration for the completion provider
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub openai_api_key: Option<String>,
    /// Optional OpenAI-compatible gateway base URL
    pub gateway: Option<String>,
    /// Transport timeout for a single completion request
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            gateway: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            gateway: std::env::var("LLM_GATEWAY").ok(),
            timeout: std::env::var("PERSONA_CHAT_LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS), Duration::from_secs),
        }
    }

    /// The configured key, with blank values treated as absent
    pub fn api_key(&self) -> Option<&str> {
        self.openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Registry holding the completion service, if credentials allow one
pub struct ModelRegistry {
    service: Option<Arc<dyn LlmService>>,
}

impl ModelRegistry {
    /// Create an empty registry (no credentials)
    pub fn new_empty() -> Self {
        Self { service: None }
    }

    pub fn new(config: &LlmConfig) -> Self {
        let Some(api_key) = config.api_key() else {
            return Self::new_empty();
        };

        match OpenAIService::new(api_key.to_string(), config.gateway.as_deref(), config.timeout) {
            Ok(service) => Self::with_service(Arc::new(service)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to create completion service");
                Self::new_empty()
            }
        }
    }

    /// Wrap an existing service with logging
    pub fn with_service(service: Arc<dyn LlmService>) -> Self {
        Self {
            service: Some(Arc::new(LoggingService::new(service))),
        }
    }

    /// Get the completion service
    pub fn default(&self) -> Option<Arc<dyn LlmService>> {
        self.service.clone()
    }

    /// Get the model ID requests are sent to
    pub fn default_model_id(&self) -> &str {
        self.service.as_ref().map_or(CHAT_MODEL, |s| s.model_id())
    }

    /// Check if a completion service is available
    pub fn has_models(&self) -> bool {
        self.service.is_some()
    }
}
