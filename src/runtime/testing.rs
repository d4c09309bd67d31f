//! Mock implementations for testing
//!
//! These mocks enable integration testing of session runtimes without
//! calling a real completion service.

use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService, ModelRegistry};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// ============================================================================
// Mock LLM Service
// ============================================================================

/// Mock completion service that returns queued responses
pub struct MockLlmService {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<LlmRequest>>,
    /// When set, each call waits for a permit before answering
    gate: Option<Arc<Notify>>,
}

impl MockLlmService {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Hold every reply until the returned notifier releases it
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let mock = Self {
            gate: Some(gate.clone()),
            ..Self::new()
        };
        (mock, gate)
    }

    /// Queue a successful response
    pub fn queue_response(&self, text: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(LlmResponse::text(text)));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}

/// Registry serving the given mock
pub fn mock_registry(mock: Arc<MockLlmService>) -> Arc<ModelRegistry> {
    Arc::new(ModelRegistry::with_service(mock))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MISSING_KEY_MESSAGE;
    use crate::llm::{LlmErrorKind, MessageRole};
    use crate::render::{MessageBody, TranscriptView};
    use crate::runtime::{RuntimeError, RuntimeManager, SseEvent};
    use crate::state_machine::{ConvState, ErrorKind, Event};
    use crate::system_prompt::PICK_THREE_PROMPT;
    use std::time::Duration;
    use tokio::sync::watch;

    const CONTACT: &str = "https://profiles.example.edu/someone";
    const TWO_PERSONAS: &str =
        r#"[{"researcher":"Marie Curie","response":"Radium!"},{"researcher":"Nikola Tesla","response":"Coils!"}]"#;

    async fn wait_for_view(
        rx: &mut watch::Receiver<TranscriptView>,
        pred: impl FnMut(&TranscriptView) -> bool,
    ) -> TranscriptView {
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
            .await
            .expect("timed out waiting for view")
            .expect("runtime stopped")
            .clone()
    }

    fn is_idle_with(count: usize) -> impl FnMut(&TranscriptView) -> bool {
        move |v| v.state == ConvState::Idle && v.messages.len() == count
    }

    async fn manager_with(mock: &Arc<MockLlmService>) -> (RuntimeManager, String) {
        let manager = RuntimeManager::new(mock_registry(mock.clone()), CONTACT);
        let id = manager.create_session().await.unwrap();
        (manager, id)
    }

    #[tokio::test]
    async fn test_mock_llm_service() {
        let mock = MockLlmService::new();
        mock.queue_response("Hello");

        let response = mock.complete(&LlmRequest::default()).await.unwrap();
        assert_eq!(response.text, "Hello");

        // Second call should fail (no more responses)
        assert!(mock.complete(&LlmRequest::default()).await.is_err());
        assert_eq!(mock.recorded_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_new_session_starts_empty() {
        let mock = Arc::new(MockLlmService::new());
        let (manager, id) = manager_with(&mock).await;

        let view = manager.view(&id).await.unwrap();
        assert_eq!(view.state, ConvState::Idle);
        assert!(view.messages.is_empty());
        assert_eq!(view.placeholder, "What's your research interest?");
    }

    #[tokio::test]
    async fn test_first_prompt_renders_two_panels() {
        let mock = Arc::new(MockLlmService::new());
        mock.queue_response(TWO_PERSONAS);
        let (manager, id) = manager_with(&mock).await;
        let mut rx = manager.watch_view(&id).await.unwrap();

        manager
            .send_event(&id, Event::UserMessage { text: "Tell me about energy".to_string() })
            .await
            .unwrap();

        let view = wait_for_view(&mut rx, is_idle_with(2)).await;
        assert_eq!(view.placeholder, "Continue your chat");
        match &view.messages[1].body {
            MessageBody::Panels { panels } => {
                assert_eq!(panels.len(), 2);
                assert_eq!(panels[0].researcher, "Marie Curie");
                assert_eq!(panels[1].response, "Coils!");
                assert!(panels.iter().all(|p| p.can_hide && p.contact_url == CONTACT));
            }
            MessageBody::Text { .. } => panic!("expected panels"),
        }

        // First turn asks the model to pick personas
        let requests = mock.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].system[0].text.contains(PICK_THREE_PROMPT));
        assert_eq!(requests[0].messages.len(), 1);
        assert_eq!(requests[0].messages[0].role, MessageRole::User);
    }

    #[tokio::test]
    async fn test_hide_filters_next_request() {
        let mock = Arc::new(MockLlmService::new());
        mock.queue_response(TWO_PERSONAS);
        mock.queue_response(r#"[{"researcher":"Marie Curie","response":"Still here"}]"#);
        let (manager, id) = manager_with(&mock).await;
        let mut rx = manager.watch_view(&id).await.unwrap();

        manager
            .send_event(&id, Event::UserMessage { text: "hello".to_string() })
            .await
            .unwrap();
        wait_for_view(&mut rx, is_idle_with(2)).await;

        manager
            .send_event(&id, Event::HidePersona { researcher: "Nikola Tesla".to_string() })
            .await
            .unwrap();
        let view = wait_for_view(&mut rx, is_idle_with(3)).await;

        // Hidden panel gone, survivor no longer hideable, notice appended
        match &view.messages[1].body {
            MessageBody::Panels { panels } => {
                assert_eq!(panels.len(), 1);
                assert!(!panels[0].can_hide);
            }
            MessageBody::Text { .. } => panic!("expected panels"),
        }
        match &view.messages[2].body {
            MessageBody::Text { text, .. } => assert_eq!(
                text,
                "Nikola Tesla has left the chat. Please continue your chat with Marie Curie."
            ),
            MessageBody::Panels { .. } => panic!("expected notice"),
        }
        // Hiding never calls the service
        assert_eq!(mock.recorded_requests().len(), 1);

        manager
            .send_event(&id, Event::UserMessage { text: "more please".to_string() })
            .await
            .unwrap();
        wait_for_view(&mut rx, is_idle_with(5)).await;

        let requests = mock.recorded_requests();
        let second = &requests[1];
        let system = &second.system[0].text;
        assert!(system.contains("The people to impersonate: Marie Curie. "));
        assert!(!system.contains(PICK_THREE_PROMPT));
        assert!(second.messages.iter().all(|m| !m.content.starts_with("Nikola Tesla:")));
        assert!(second.messages.iter().any(|m| m.content == "Marie Curie: Radium!"));
    }

    #[tokio::test]
    async fn test_service_failure_is_recoverable() {
        let mock = Arc::new(MockLlmService::new());
        mock.queue_error(LlmError::from_status(401, "bad key"));
        mock.queue_response("Plain reply");
        let (manager, id) = manager_with(&mock).await;
        let mut rx = manager.watch_view(&id).await.unwrap();

        manager
            .send_event(&id, Event::UserMessage { text: "hi".to_string() })
            .await
            .unwrap();
        let view = wait_for_view(&mut rx, |v| matches!(v.state, ConvState::Error { .. })).await;
        match &view.state {
            ConvState::Error { message, error_kind } => {
                assert_eq!(*error_kind, ErrorKind::from(LlmErrorKind::Auth));
                assert!(message.contains("bad key"));
            }
            other => panic!("unexpected state {other:?}"),
        }
        assert_eq!(view.messages.len(), 1);

        manager
            .send_event(&id, Event::UserMessage { text: "hi again".to_string() })
            .await
            .unwrap();
        let view = wait_for_view(&mut rx, is_idle_with(3)).await;
        assert!(matches!(view.messages[2].body, MessageBody::Text { .. }));
    }

    #[tokio::test]
    async fn test_busy_session_rejects_input() {
        let (mock, gate) = MockLlmService::gated();
        let mock = Arc::new(mock);
        mock.queue_response(TWO_PERSONAS);
        let (manager, id) = manager_with(&mock).await;
        let mut rx = manager.watch_view(&id).await.unwrap();
        let (mut events, _) = manager.subscribe(&id).await.unwrap();

        manager
            .send_event(&id, Event::UserMessage { text: "first".to_string() })
            .await
            .unwrap();
        wait_for_view(&mut rx, |v| v.state == ConvState::Processing).await;

        manager
            .send_event(&id, Event::UserMessage { text: "second".to_string() })
            .await
            .unwrap();

        let busy = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Ok(SseEvent::Error { message }) = events.recv().await {
                    return message;
                }
            }
        })
        .await
        .unwrap();
        assert!(busy.contains("busy"));

        gate.notify_one();
        let view = wait_for_view(&mut rx, is_idle_with(2)).await;
        // Only the first message made it into the transcript
        assert_eq!(mock.recorded_requests().len(), 1);
        assert!(matches!(view.messages[0].body, MessageBody::Text { ref text, .. } if text == "first"));
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let mock = Arc::new(MockLlmService::new());
        mock.queue_response(TWO_PERSONAS);
        let (manager, first) = manager_with(&mock).await;
        let second = manager.create_session().await.unwrap();
        let mut rx = manager.watch_view(&first).await.unwrap();

        manager
            .send_event(&first, Event::UserMessage { text: "hi".to_string() })
            .await
            .unwrap();
        wait_for_view(&mut rx, is_idle_with(2)).await;

        assert!(manager.view(&second).await.unwrap().messages.is_empty());
    }

    #[tokio::test]
    async fn test_missing_credential_blocks_sessions() {
        let manager = RuntimeManager::new(Arc::new(ModelRegistry::new_empty()), CONTACT);
        let err = manager.create_session().await.unwrap_err();
        assert!(matches!(err, RuntimeError::MissingCredential));
        assert_eq!(err.to_string(), MISSING_KEY_MESSAGE);
    }

    #[tokio::test]
    async fn test_closed_session_is_gone() {
        let mock = Arc::new(MockLlmService::new());
        let (manager, id) = manager_with(&mock).await;

        assert!(manager.close(&id).await);
        assert!(!manager.close(&id).await);
        assert!(matches!(
            manager.view(&id).await,
            Err(RuntimeError::SessionNotFound(_))
        ));
        assert!(matches!(
            manager
                .send_event(&id, Event::UserMessage { text: "hi".to_string() })
                .await,
            Err(RuntimeError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_session_ends_after_last_subscriber_leaves() {
        let mock = Arc::new(MockLlmService::new());
        let manager = RuntimeManager::new(mock_registry(mock), CONTACT)
            .with_disconnect_grace(Duration::from_millis(50));
        let id = manager.create_session().await.unwrap();
        let (events, _) = manager.subscribe(&id).await.unwrap();

        // A watched session outlives the grace period
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(manager.view(&id).await.is_ok());

        drop(events);
        tokio::time::timeout(Duration::from_secs(5), async {
            while manager.view(&id).await.is_ok() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("session outlived its last subscriber");

        assert!(!manager.close(&id).await);
    }
}
