//! LLM provider abstraction
//!
//! The completion service is an opaque request/response collaborator. Only
//! the `OpenAI` chat-completions shape is spoken, against one fixed model.

mod error;
mod openai;
mod registry;
mod types;

pub use error::{LlmError, LlmErrorKind};
pub use openai::{OpenAIService, CHAT_MODEL};
pub use registry::{LlmConfig, ModelRegistry};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Common interface for completion providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Make a completion request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Decorator that logs every completion with its timing and token usage
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let started = Instant::now();
        let outcome = self.inner.complete(request).await;
        let elapsed_ms = started.elapsed().as_millis();
        let model = self.inner.model_id();

        match &outcome {
            Ok(reply) => tracing::info!(
                model,
                elapsed_ms,
                turns = request.messages.len(),
                reply_chars = reply.text.chars().count(),
                input_tokens = reply.usage.input_tokens,
                output_tokens = reply.usage.output_tokens,
                "Completion finished"
            ),
            Err(e) => {
                tracing::error!(model, elapsed_ms, kind = ?e.kind, error = %e, "Completion failed");
            }
        }

        outcome
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}
