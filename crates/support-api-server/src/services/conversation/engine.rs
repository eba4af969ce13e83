use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::models::chat::{ChatMessage, Role, Session};
use crate::services::faq;
use crate::utils::error::{ApiError, BackendError};

use super::escalation::needs_escalation;
use super::store::SessionStore;

/// How many history turns are included in the backend prompt.
const HISTORY_WINDOW: usize = 10;

/// Reply for sessions that escalate on the current call.
pub const HANDOFF_RESPONSE: &str =
    "It sounds like this may require human support. I am connecting you to a specialist now.";

/// Reply for sessions that were already escalated before this call.
pub const ALREADY_ESCALATED_RESPONSE: &str =
    "This session has been escalated. A human agent will be with you shortly.";

/// Generic reason recorded when the evaluator triggers the hand-off.
pub const ESCALATION_REASON: &str = "Complex issue or user frustration detected.";

/// Fallback when the backend produced no usable text.
pub const EMPTY_RESPONSE_FALLBACK: &str =
    "I apologize, I couldn't generate a response. Could you rephrase?";

/// Fallback when the backend call failed outright (error, timeout, safety block).
pub const BACKEND_FAILURE_FALLBACK: &str =
    "I apologize, but I'm having trouble processing your request right now. A human agent will assist you shortly.";

/// The generative backend, reduced to an opaque text-completion function.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, BackendError>;
}

/// Result of one `handle_query` call, shaped for the query response body.
#[derive(Debug)]
pub struct QueryOutcome {
    pub response: String,
    pub escalated: bool,
    pub escalation_reason: Option<String>,
    pub message_count: Option<usize>,
}

/// Orchestrates one conversation turn: resolve session, evaluate escalation,
/// obtain a reply from the backend, append it, return the result.
pub struct ConversationEngine {
    store: Arc<SessionStore>,
    backend: Arc<dyn ChatBackend>,
    velocity_threshold_seconds: i64,
}

impl ConversationEngine {
    pub fn new(
        store: Arc<SessionStore>,
        backend: Arc<dyn ChatBackend>,
        velocity_threshold_seconds: i64,
    ) -> Self {
        Self {
            store,
            backend,
            velocity_threshold_seconds,
        }
    }

    /// Handle one inbound customer message.
    ///
    /// The per-session lock is held across the backend call, so at most one
    /// backend request is in flight per session and replies never interleave
    /// within one conversation. Other sessions proceed unblocked.
    pub async fn handle_query(
        &self,
        session_id: &str,
        customer_name: Option<String>,
        message_text: &str,
        now: DateTime<Utc>,
    ) -> QueryOutcome {
        let slot = self
            .store
            .get_or_create(session_id, customer_name.clone(), now);
        let mut session = slot.lock().await;
        session.touch(now);

        if session.customer_name.is_none() {
            if let Some(name) = customer_name {
                session.customer_name = Some(name);
            }
        }

        // Once escalated the session is terminal for automation: the new
        // message is not recorded and the backend is never contacted.
        if session.escalated {
            debug!("Session {} already escalated, returning hand-off", session_id);
            return QueryOutcome {
                response: ALREADY_ESCALATED_RESPONSE.to_string(),
                escalated: true,
                escalation_reason: session.escalation_reason.clone(),
                message_count: None,
            };
        }

        session.append(Role::User, message_text, now);

        if needs_escalation(message_text, &session, self.velocity_threshold_seconds) {
            session.escalate(ESCALATION_REASON);
            warn!("Session {} escalated to human support", session_id);
            return QueryOutcome {
                response: HANDOFF_RESPONSE.to_string(),
                escalated: true,
                escalation_reason: session.escalation_reason.clone(),
                message_count: None,
            };
        }

        let prompt = build_prompt(&session);
        let reply = match self.backend.generate(&prompt).await {
            Ok(text) => text,
            Err(BackendError::Empty) => {
                warn!("Empty backend response for session {}", session_id);
                EMPTY_RESPONSE_FALLBACK.to_string()
            }
            Err(BackendError::Failed(e)) => {
                error!("Backend call failed for session {}: {}", session_id, e);
                BACKEND_FAILURE_FALLBACK.to_string()
            }
        };

        session.append(Role::Assistant, &reply, now);

        QueryOutcome {
            response: reply,
            escalated: false,
            escalation_reason: None,
            message_count: Some(session.messages.len()),
        }
    }

    /// Force a hand-off with a caller-supplied reason (`POST /chat/escalate`).
    pub async fn force_escalate(
        &self,
        session_id: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        let slot = self
            .store
            .get(session_id)
            .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;
        let mut session = slot.lock().await;
        session.touch(now);
        session.escalate(reason);
        warn!("Session {} escalated by caller request", session_id);
        Ok(())
    }
}

/// System instructions + FAQ reference + the most recent history turns,
/// each tagged by role.
fn build_prompt(session: &Session) -> Vec<ChatMessage> {
    let mut prompt = vec![ChatMessage::system(faq::system_prompt())];
    let start = session.messages.len().saturating_sub(HISTORY_WINDOW);
    prompt.extend(session.messages[start..].iter().map(|m| match m.role {
        Role::User => ChatMessage::user(&m.content),
        Role::Assistant => ChatMessage::assistant(&m.content),
    }));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::conversation::store::GREETING;
    use chrono::Duration;
    use mockall::mock;

    mock! {
        pub Backend {}

        #[async_trait]
        impl ChatBackend for Backend {
            async fn generate(&self, messages: &[ChatMessage]) -> Result<String, BackendError>;
        }
    }

    fn engine_with(backend: MockBackend) -> (ConversationEngine, Arc<SessionStore>) {
        let store = Arc::new(SessionStore::new());
        let engine = ConversationEngine::new(store.clone(), Arc::new(backend), 45);
        (engine, store)
    }

    #[tokio::test]
    async fn first_query_returns_reply_and_counts_three_messages() {
        let mut backend = MockBackend::new();
        backend
            .expect_generate()
            .times(1)
            .returning(|_| Ok("We offer 30-day returns.".to_string()));
        let (engine, store) = engine_with(backend);

        let now = Utc::now();
        let outcome = engine
            .handle_query("s1", Some("Alice".to_string()), "What is your return policy?", now)
            .await;

        assert!(!outcome.escalated);
        assert_eq!(outcome.response, "We offer 30-day returns.");
        // greeting + user message + assistant reply
        assert_eq!(outcome.message_count, Some(3));

        let session = store.get("s1").expect("session exists");
        let session = session.lock().await;
        assert_eq!(session.customer_name.as_deref(), Some("Alice"));
        assert_eq!(session.messages[0].content, GREETING);
        assert_eq!(session.messages[1].role, Role::User);
        assert_eq!(session.messages[2].role, Role::Assistant);
    }

    #[tokio::test]
    async fn prompt_carries_system_instructions_and_history() {
        let mut backend = MockBackend::new();
        backend
            .expect_generate()
            .withf(|messages: &[ChatMessage]| {
                messages[0].role == "system"
                    && messages[0].content.contains("# FAQ Database")
                    && messages.last().is_some_and(|m| m.role == "user" && m.content == "hello")
            })
            .times(1)
            .returning(|_| Ok("Hi!".to_string()));
        let (engine, _store) = engine_with(backend);

        engine.handle_query("s1", None, "hello", Utc::now()).await;
    }

    #[tokio::test]
    async fn keyword_escalation_skips_backend_and_keeps_trigger_message() {
        let mut backend = MockBackend::new();
        backend.expect_generate().times(0);
        let (engine, store) = engine_with(backend);

        let now = Utc::now();
        let outcome = engine
            .handle_query("s1", None, "I want to speak to a manager", now)
            .await;

        assert!(outcome.escalated);
        assert_eq!(outcome.response, HANDOFF_RESPONSE);
        assert_eq!(outcome.escalation_reason.as_deref(), Some(ESCALATION_REASON));

        let session = store.get("s1").expect("session exists");
        let session = session.lock().await;
        assert!(session.escalated);
        // greeting + the triggering user message, no assistant reply
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[1].content, "I want to speak to a manager");
    }

    #[tokio::test]
    async fn escalated_session_is_terminal_and_idempotent() {
        let mut backend = MockBackend::new();
        backend.expect_generate().times(0);
        let (engine, store) = engine_with(backend);

        let now = Utc::now();
        engine.handle_query("s1", None, "manager", now).await;

        for i in 0..2 {
            let outcome = engine
                .handle_query("s1", None, "manager again", now + Duration::seconds(i + 1))
                .await;
            assert!(outcome.escalated);
            assert_eq!(outcome.response, ALREADY_ESCALATED_RESPONSE);
            assert_eq!(outcome.escalation_reason.as_deref(), Some(ESCALATION_REASON));
            assert_eq!(outcome.message_count, None);
        }

        // History did not grow after the transition
        let session = store.get("s1").expect("session exists");
        assert_eq!(session.lock().await.messages.len(), 2);
    }

    #[tokio::test]
    async fn backend_failure_becomes_fallback_reply() {
        let mut backend = MockBackend::new();
        backend
            .expect_generate()
            .times(1)
            .returning(|_| Err(BackendError::Failed("boom".to_string())));
        let (engine, store) = engine_with(backend);

        let outcome = engine.handle_query("s1", None, "hello", Utc::now()).await;

        assert!(!outcome.escalated);
        assert_eq!(outcome.response, BACKEND_FAILURE_FALLBACK);
        assert_eq!(outcome.message_count, Some(3));

        // The fallback still lands in history as an assistant turn
        let session = store.get("s1").expect("session exists");
        let session = session.lock().await;
        assert_eq!(session.messages[2].content, BACKEND_FAILURE_FALLBACK);
        assert_eq!(session.messages[2].role, Role::Assistant);
    }

    #[tokio::test]
    async fn empty_backend_result_uses_distinct_fallback() {
        let mut backend = MockBackend::new();
        backend
            .expect_generate()
            .times(1)
            .returning(|_| Err(BackendError::Empty));
        let (engine, _store) = engine_with(backend);

        let outcome = engine.handle_query("s1", None, "hello", Utc::now()).await;
        assert!(!outcome.escalated);
        assert_eq!(outcome.response, EMPTY_RESPONSE_FALLBACK);
    }

    #[tokio::test]
    async fn rapid_fire_queries_escalate_on_third_message() {
        let mut backend = MockBackend::new();
        backend
            .expect_generate()
            .times(2)
            .returning(|_| Ok("sure".to_string()));
        let (engine, _store) = engine_with(backend);

        let t0 = Utc::now();
        let first = engine.handle_query("s1", None, "where is my order", t0).await;
        assert!(!first.escalated);
        let second = engine
            .handle_query("s1", None, "hello??", t0 + Duration::seconds(10))
            .await;
        assert!(!second.escalated);
        let third = engine
            .handle_query("s1", None, "anyone there", t0 + Duration::seconds(20))
            .await;
        assert!(third.escalated);
        assert_eq!(third.response, HANDOFF_RESPONSE);
    }

    #[tokio::test]
    async fn customer_name_backfills_only_once() {
        let mut backend = MockBackend::new();
        backend
            .expect_generate()
            .times(2)
            .returning(|_| Ok("ok".to_string()));
        let (engine, store) = engine_with(backend);

        let now = Utc::now();
        engine.handle_query("s1", None, "hi", now).await;
        engine
            .handle_query("s1", Some("Alice".to_string()), "hi again", now + Duration::seconds(60))
            .await;

        let session = store.get("s1").expect("session exists");
        assert_eq!(session.lock().await.customer_name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn force_escalate_requires_existing_session() {
        let backend = MockBackend::new();
        let (engine, store) = engine_with(backend);

        let err = engine
            .force_escalate("missing", "reason", Utc::now())
            .await
            .expect_err("should be NotFound");
        assert!(matches!(err, ApiError::NotFound(_)));

        let now = Utc::now();
        store.get_or_create("s1", None, now);
        engine
            .force_escalate("s1", "caller asked", now)
            .await
            .expect("escalation succeeds");

        let session = store.get("s1").expect("session exists");
        let session = session.lock().await;
        assert!(session.escalated);
        assert_eq!(session.escalation_reason.as_deref(), Some("caller asked"));
    }
}
