//! Runtime for executing conversations
//!
//! Each session is owned by one actor task. Handlers talk to it through an
//! event channel and observe it through a broadcast channel (SSE) and a
//! watch channel holding the latest rendered view.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::ConversationRuntime;

use crate::config::MISSING_KEY_MESSAGE;
use crate::llm::ModelRegistry;
use crate::render::TranscriptView;
use crate::session::Session;
use crate::state_machine::{ConvState, Event};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch, RwLock};

/// Errors surfaced by the runtime manager
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    #[error("{}", MISSING_KEY_MESSAGE)]
    MissingCredential,
    #[error("Session runtime has stopped")]
    ChannelClosed,
}

/// Events sent to SSE clients; the `type` tag doubles as the SSE event name
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SseEvent {
    Init { view: TranscriptView },
    View { view: TranscriptView },
    StateChange { state: ConvState },
    Error { message: String },
}

impl SseEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SseEvent::Init { .. } => "init",
            SseEvent::View { .. } => "view",
            SseEvent::StateChange { .. } => "state_change",
            SseEvent::Error { .. } => "error",
        }
    }
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    pub event_tx: mpsc::Sender<Event>,
    pub broadcast_tx: broadcast::Sender<SseEvent>,
    pub view_rx: watch::Receiver<TranscriptView>,
}

/// Default time a session survives without any stream subscriber
pub const DEFAULT_DISCONNECT_GRACE: Duration = Duration::from_secs(60);

type SessionMap = Arc<RwLock<HashMap<String, SessionHandle>>>;

/// Manager for all session runtimes
pub struct RuntimeManager {
    llm_registry: Arc<ModelRegistry>,
    contact_url: String,
    disconnect_grace: Duration,
    sessions: SessionMap,
}

impl RuntimeManager {
    pub fn new(llm_registry: Arc<ModelRegistry>, contact_url: impl Into<String>) -> Self {
        Self {
            llm_registry,
            contact_url: contact_url.into(),
            disconnect_grace: DEFAULT_DISCONNECT_GRACE,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// End sessions whose page has gone for this long
    #[must_use]
    pub fn with_disconnect_grace(mut self, grace: Duration) -> Self {
        self.disconnect_grace = grace;
        self
    }

    pub fn model_registry(&self) -> &ModelRegistry {
        &self.llm_registry
    }

    /// Start an isolated session and return its id
    pub async fn create_session(&self) -> Result<String, RuntimeError> {
        let llm = self
            .llm_registry
            .default()
            .ok_or(RuntimeError::MissingCredential)?;

        let session_id = uuid::Uuid::new_v4().to_string();
        let session = Session::new();
        let state = ConvState::default();

        let (event_tx, event_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);
        let (view_tx, view_rx) =
            watch::channel(TranscriptView::build(&session, &state, &self.contact_url));

        let runtime = ConversationRuntime::new(
            session_id.clone(),
            session,
            state,
            self.contact_url.clone(),
            llm,
            event_rx,
            event_tx.downgrade(),
            broadcast_tx.clone(),
            view_tx,
            self.disconnect_grace,
        );

        let id = session_id.clone();
        let sessions = self.sessions.clone();
        tokio::spawn(async move {
            runtime.run().await;
            // No-op when the session was closed explicitly
            sessions.write().await.remove(&id);
            tracing::info!(session_id = %id, "Session runtime finished");
        });

        let active = {
            let mut sessions = self.sessions.write().await;
            sessions.insert(
                session_id.clone(),
                SessionHandle {
                    event_tx,
                    broadcast_tx,
                    view_rx,
                },
            );
            sessions.len()
        };

        tracing::info!(session_id = %session_id, active, "Session created");
        Ok(session_id)
    }

    async fn handle(&self, session_id: &str) -> Result<SessionHandle, RuntimeError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| RuntimeError::SessionNotFound(session_id.to_string()))
    }

    /// Send an event to a session
    pub async fn send_event(&self, session_id: &str, event: Event) -> Result<(), RuntimeError> {
        let handle = self.handle(session_id).await?;
        handle.event_tx.send(event).await.map_err(|e| {
            tracing::warn!(session_id = %session_id, error = %e, "Failed to send event");
            RuntimeError::ChannelClosed
        })
    }

    /// Subscribe to session updates, along with the view to start from
    pub async fn subscribe(
        &self,
        session_id: &str,
    ) -> Result<(broadcast::Receiver<SseEvent>, TranscriptView), RuntimeError> {
        let handle = self.handle(session_id).await?;
        // Subscribe first so no update lands between the snapshot and the stream
        let rx = handle.broadcast_tx.subscribe();
        let view = handle.view_rx.borrow().clone();
        Ok((rx, view))
    }

    /// Watch the rendered view of a session
    pub async fn watch_view(
        &self,
        session_id: &str,
    ) -> Result<watch::Receiver<TranscriptView>, RuntimeError> {
        Ok(self.handle(session_id).await?.view_rx)
    }

    /// Current rendered view of a session
    pub async fn view(&self, session_id: &str) -> Result<TranscriptView, RuntimeError> {
        let view_rx = self.watch_view(session_id).await?;
        let view = view_rx.borrow().clone();
        Ok(view)
    }

    /// Drop a session. Its actor stops once in-flight work drains.
    pub async fn close(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            tracing::info!(session_id = %session_id, "Session closed");
        }
        removed
    }
}
