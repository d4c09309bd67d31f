//! HTTP request handlers

use super::assets::{get_index_html, serve_static};
use super::sse::sse_stream;
use super::types::{
    ChatRequest, ErrorResponse, HideRequest, InfoResponse, QueuedResponse, SessionResponse,
    SuccessResponse,
};
use super::AppState;
use crate::config::{MISSING_KEY_MESSAGE, PAGE_DESCRIPTION, PAGE_TITLE, PAGE_WARNING};
use crate::render::TranscriptView;
use crate::runtime::{RuntimeError, SseEvent};
use crate::state_machine::{Event, TransitionError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Root serves the page
        .route("/", get(serve_page))
        // Static assets (embedded or filesystem fallback)
        .route("/assets/*path", get(serve_static))
        // Page header and credential status
        .route("/api/info", get(get_info))
        // Session lifecycle
        .route("/api/sessions/new", post(create_session))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id/close", post(close_session))
        // SSE streaming
        .route("/api/sessions/:id/stream", get(stream_session))
        // User actions
        .route("/api/sessions/:id/chat", post(send_chat))
        .route("/api/sessions/:id/hide", post(hide_persona))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Page
// ============================================================

async fn serve_page() -> Response {
    match get_index_html() {
        Some(content) => Html(content).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Html("<h1>404 - UI not found</h1>".to_string()),
        )
            .into_response(),
    }
}

async fn get_info(State(state): State<AppState>) -> Json<InfoResponse> {
    let registry = state.runtime.model_registry();
    let configured = registry.has_models();

    Json(InfoResponse {
        title: PAGE_TITLE,
        description: PAGE_DESCRIPTION,
        warning: PAGE_WARNING,
        configured,
        model: registry.default_model_id().to_string(),
        info: (!configured).then_some(MISSING_KEY_MESSAGE),
    })
}

// ============================================================
// Sessions
// ============================================================

async fn create_session(State(state): State<AppState>) -> Result<Json<SessionResponse>, AppError> {
    let session_id = state.runtime.create_session().await?;
    Ok(Json(SessionResponse { session_id }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TranscriptView>, AppError> {
    Ok(Json(state.runtime.view(&id).await?))
}

async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<SuccessResponse> {
    let success = state.runtime.close(&id).await;
    Json(SuccessResponse { success })
}

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (broadcast_rx, view) = state.runtime.subscribe(&id).await?;
    Ok(sse_stream(SseEvent::Init { view }, broadcast_rx))
}

// ============================================================
// User Actions
// ============================================================

async fn send_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<QueuedResponse>, AppError> {
    ensure_credential(&state)?;
    if req.text.trim().is_empty() {
        return Err(TransitionError::EmptyMessage.into());
    }
    ensure_idle(&state, &id).await?;

    state
        .runtime
        .send_event(&id, Event::UserMessage { text: req.text })
        .await?;

    Ok(Json(QueuedResponse { queued: true }))
}

async fn hide_persona(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<HideRequest>,
) -> Result<Json<QueuedResponse>, AppError> {
    ensure_credential(&state)?;
    if req.researcher.is_empty() {
        return Err(AppError::BadRequest("researcher is required".to_string()));
    }
    ensure_idle(&state, &id).await?;

    state
        .runtime
        .send_event(
            &id,
            Event::HidePersona {
                researcher: req.researcher,
            },
        )
        .await?;

    Ok(Json(QueuedResponse { queued: true }))
}

fn ensure_credential(state: &AppState) -> Result<(), AppError> {
    if state.runtime.model_registry().has_models() {
        Ok(())
    } else {
        Err(RuntimeError::MissingCredential.into())
    }
}

/// Reject early when a reply is in flight; the state machine rejects it
/// again if the race is lost.
async fn ensure_idle(state: &AppState, id: &str) -> Result<(), AppError> {
    if state.runtime.view(id).await?.state.is_busy() {
        return Err(TransitionError::AgentBusy.into());
    }
    Ok(())
}

async fn get_version() -> &'static str {
    concat!("persona-chat ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unavailable(String),
    Internal(String),
}

impl From<RuntimeError> for AppError {
    fn from(e: RuntimeError) -> Self {
        match e {
            RuntimeError::SessionNotFound(_) => AppError::NotFound(e.to_string()),
            RuntimeError::MissingCredential => AppError::Unavailable(e.to_string()),
            RuntimeError::ChannelClosed => AppError::Internal(e.to_string()),
        }
    }
}

impl From<TransitionError> for AppError {
    fn from(e: TransitionError) -> Self {
        match e {
            TransitionError::AgentBusy => AppError::Conflict(e.to_string()),
            TransitionError::EmptyMessage | TransitionError::InvalidTransition(_) => {
                AppError::BadRequest(e.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
