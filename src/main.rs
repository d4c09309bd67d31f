//! Persona chat - a research chat where impersonated scientists answer
//! side by side
//!
//! A Rust backend driving a per-session conversation state machine against
//! a hosted completion API, serving a single page over HTTP and SSE.

mod api;
mod config;
mod llm;
mod persona;
mod render;
mod runtime;
mod session;
mod state_machine;
mod system_prompt;

use api::{create_router, AppState};
use config::AppConfig;
use llm::ModelRegistry;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "persona_chat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AppConfig::from_env();

    // The server starts either way; without a key the page explains what is missing
    let llm_registry = Arc::new(ModelRegistry::new(&config.llm));
    if llm_registry.has_models() {
        tracing::info!(
            model = %llm_registry.default_model_id(),
            gateway = ?config.llm.gateway,
            "Completion service initialized"
        );
    } else {
        tracing::warn!("No OpenAI API key configured. Set OPENAI_API_KEY.");
    }

    let state = AppState::new(
        llm_registry,
        config.contact_url.clone(),
        config.disconnect_grace,
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(contact_url = %config.contact_url, "Persona chat server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
