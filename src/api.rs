//! HTTP API for the persona chat page

mod assets;
mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::llm::ModelRegistry;
use crate::runtime::RuntimeManager;
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<RuntimeManager>,
}

impl AppState {
    pub fn new(
        llm_registry: Arc<ModelRegistry>,
        contact_url: impl Into<String>,
        disconnect_grace: Duration,
    ) -> Self {
        let runtime =
            RuntimeManager::new(llm_registry, contact_url).with_disconnect_grace(disconnect_grace);
        Self {
            runtime: Arc::new(runtime),
        }
    }
}
