//! Session runtime executor

use super::SseEvent;

use crate::llm::LlmService;
use crate::render::TranscriptView;
use crate::session::{Message, Session};
use crate::state_machine::{transition, ConvState, Effect, Event, TransitionError};
use crate::system_prompt::build_request;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::MissedTickBehavior;

const MIN_CHECK_PERIOD: Duration = Duration::from_millis(10);

/// Actor owning one session's state
pub struct ConversationRuntime {
    session_id: String,
    session: Session,
    state: ConvState,
    contact_url: String,
    llm: Arc<dyn LlmService>,
    event_rx: mpsc::Receiver<Event>,
    /// Weak so that dropping the manager's handle ends the actor
    event_tx: mpsc::WeakSender<Event>,
    broadcast_tx: broadcast::Sender<SseEvent>,
    view_tx: watch::Sender<TranscriptView>,
    /// How long the session may go without a stream subscriber
    disconnect_grace: Duration,
}

impl ConversationRuntime {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_id: String,
        session: Session,
        state: ConvState,
        contact_url: String,
        llm: Arc<dyn LlmService>,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::WeakSender<Event>,
        broadcast_tx: broadcast::Sender<SseEvent>,
        view_tx: watch::Sender<TranscriptView>,
        disconnect_grace: Duration,
    ) -> Self {
        Self {
            session_id,
            session,
            state,
            contact_url,
            llm,
            event_rx,
            event_tx,
            broadcast_tx,
            view_tx,
            disconnect_grace,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(session_id = %self.session_id, "Starting session runtime");

        let mut check = tokio::time::interval((self.disconnect_grace / 2).max(MIN_CHECK_PERIOD));
        check.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut unwatched_since: Option<Instant> = None;

        // Process events in a loop - no recursion
        loop {
            tokio::select! {
                event = self.event_rx.recv() => {
                    let Some(event) = event else { break };
                    if let Err(e) = self.process_event(event) {
                        tracing::warn!(session_id = %self.session_id, error = %e, "Event rejected");
                    }
                }
                _ = check.tick() => {
                    if self.broadcast_tx.receiver_count() > 0 {
                        unwatched_since = None;
                        continue;
                    }
                    let since = *unwatched_since.get_or_insert_with(Instant::now);
                    if since.elapsed() >= self.disconnect_grace {
                        tracing::info!(session_id = %self.session_id, "Client disconnected, ending session");
                        break;
                    }
                }
            }
        }

        tracing::info!(session_id = %self.session_id, "Session runtime stopped");
    }

    fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        let event_name = event.name();

        // Pure state transition
        let result = match transition(&self.state, &self.session, event) {
            Ok(r) => r,
            Err(e) => {
                // Transition errors are user-facing (e.g., "agent is busy")
                let _ = self.broadcast_tx.send(SseEvent::Error {
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        tracing::debug!(
            session_id = %self.session_id,
            event = event_name,
            from = self.state.name(),
            to = result.new_state.name(),
            "Transition"
        );
        self.state = result.new_state;

        for effect in result.effects {
            self.execute_effect(effect);
        }

        self.publish_view();
        Ok(())
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AppendMessage { role, content } => {
                self.session.push_message(Message::new(role, content));
            }

            Effect::RegisterPersonas { names } => {
                self.session.register_personas(names);
            }

            Effect::ExcludePersona { researcher } => {
                tracing::info!(session_id = %self.session_id, researcher = %researcher, "Persona hidden");
                self.session.exclude(researcher);
            }

            Effect::RequestCompletion => self.request_completion(),

            Effect::NotifyStateChange => {
                let _ = self.broadcast_tx.send(SseEvent::StateChange {
                    state: self.state.clone(),
                });
            }
        }
    }

    /// Call the completion service in the background; the outcome comes
    /// back through the event channel.
    fn request_completion(&self) {
        let Some(event_tx) = self.event_tx.upgrade() else {
            tracing::debug!(session_id = %self.session_id, "Session closed, skipping completion");
            return;
        };

        let request = build_request(&self.session);
        let llm = self.llm.clone();
        let session_id = self.session_id.clone();

        tokio::spawn(async move {
            tracing::info!(
                session_id = %session_id,
                messages = request.messages.len(),
                "Making completion request (background)"
            );

            let event = match llm.complete(&request).await {
                Ok(response) => Event::LlmResponse {
                    text: response.text,
                },
                Err(e) => Event::LlmError {
                    message: e.message,
                    error_kind: e.kind.into(),
                },
            };

            if event_tx.send(event).await.is_err() {
                tracing::debug!(session_id = %session_id, "Session stopped before completion arrived");
            }
        });
    }

    fn publish_view(&self) {
        let view = TranscriptView::build(&self.session, &self.state, &self.contact_url);
        self.view_tx.send_replace(view.clone());
        let _ = self.broadcast_tx.send(SseEvent::View { view });
    }
}
