//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use crate::responder::{Responder, ResponderError, ResponderReply, ResponderRequest};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Mock Responder
// ============================================================================

/// Mock responder that returns queued replies
pub struct MockResponder {
    replies: Mutex<VecDeque<Result<ResponderReply, ResponderError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<ResponderRequest>>,
}

impl MockResponder {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply carrying `payload`
    pub fn queue_payload(&self, payload: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(ResponderReply {
            response: payload.into(),
        }));
    }

    /// Queue an error reply
    pub fn queue_error(&self, error: ResponderError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<ResponderRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_reply(&self) -> Result<ResponderReply, ResponderError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ResponderError::network("No mock reply queued")))
    }
}

impl Default for MockResponder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Responder for MockResponder {
    async fn ask(&self, request: &ResponderRequest) -> Result<ResponderReply, ResponderError> {
        self.requests.lock().unwrap().push(request.clone());
        self.next_reply()
    }

    fn endpoint(&self) -> &str {
        "mock://responder"
    }
}

// ============================================================================
// Delayed Mock Responder (for in-flight and timeout testing)
// ============================================================================

/// Mock responder with configurable delay
pub struct DelayedMockResponder {
    inner: MockResponder,
    delay: Duration,
    /// Notified when a request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl DelayedMockResponder {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockResponder::new(),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_payload(&self, payload: impl Into<String>) {
        self.inner.queue_payload(payload);
    }

    pub fn recorded_requests(&self) -> Vec<ResponderRequest> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl Responder for DelayedMockResponder {
    async fn ask(&self, request: &ResponderRequest) -> Result<ResponderReply, ResponderError> {
        self.inner.requests.lock().unwrap().push(request.clone());
        // notify_one keeps a permit if nobody is waiting yet
        self.request_started.notify_one();
        tokio::time::sleep(self.delay).await;
        self.inner.next_reply()
    }

    fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{AuthSnapshot, StaticIdentity};
    use crate::runtime::{
        SessionContext, SessionController, SessionError, SessionHandle, SessionManager,
        SessionUpdate,
    };
    use crate::state_machine::state::ERROR_REPLY;
    use crate::state_machine::transcript::Turn;
    use crate::state_machine::{Notice, SessionView, TransitionError};

    const WAIT: Duration = Duration::from_secs(5);

    fn start<R: Responder + 'static>(
        auth: AuthSnapshot,
        responder: R,
        timeout: Option<Duration>,
    ) -> SessionHandle {
        let (controller, handle) =
            SessionController::new(SessionContext::new("test-session", timeout), auth, responder);
        tokio::spawn(controller.run());
        handle
    }

    async fn wait_idle(handle: &SessionHandle) -> SessionView {
        let mut rx = handle.watch();
        let view = tokio::time::timeout(WAIT, rx.wait_for(|view| !view.is_awaiting_response))
            .await
            .expect("session never went idle")
            .unwrap()
            .clone();
        view
    }

    #[tokio::test]
    async fn test_mock_responder() {
        let mock = MockResponder::new();
        mock.queue_payload("### Response: hi");

        let request = ResponderRequest::answer("hello");
        let reply = mock.ask(&request).await.unwrap();
        assert_eq!(reply.response, "### Response: hi");

        // Second call should fail (no more replies)
        assert!(mock.ask(&request).await.is_err());
        assert_eq!(mock.recorded_requests().len(), 2);
    }

    /// Integration test: anonymous question answered
    #[tokio::test]
    async fn test_anonymous_question_answered() {
        let responder = Arc::new(MockResponder::new());
        responder.queue_payload("### Instruction: ... ### Response:\n  Anxiety is a feeling of unease.  \n");
        let handle = start(AuthSnapshot::anonymous(), responder.clone(), None);

        handle.submit("  What is anxiety?  ").await.unwrap();
        let view = wait_idle(&handle).await;

        assert_eq!(
            view.turns,
            vec![
                Turn::user("What is anxiety?"),
                Turn::assistant("Anxiety is a feeling of unease."),
            ]
        );
        assert!(view.is_quota_exhausted);
        assert!(!view.can_submit);
        assert_eq!(
            responder.recorded_requests(),
            vec![ResponderRequest::answer("What is anxiety?")]
        );
    }

    /// A failed first attempt still costs the only free question
    #[tokio::test]
    async fn test_failed_call_exhausts_quota() {
        let responder = Arc::new(MockResponder::new());
        responder.queue_error(ResponderError::network("simulated network error"));
        let handle = start(AuthSnapshot::anonymous(), responder.clone(), None);

        handle.submit("What is anxiety?").await.unwrap();
        let view = wait_idle(&handle).await;

        assert_eq!(
            view.turns,
            vec![Turn::user("What is anxiety?"), Turn::assistant(ERROR_REPLY)]
        );

        for _ in 0..3 {
            assert_eq!(
                handle.submit("Another question").await,
                Err(SessionError::Rejected(TransitionError::QuotaExhausted))
            );
        }
        assert_eq!(handle.view().turns.len(), 2);
        assert_eq!(responder.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_quota_spent_before_reply() {
        let responder = Arc::new(DelayedMockResponder::new(Duration::from_millis(200)));
        responder.queue_payload("### Response: later");
        let handle = start(AuthSnapshot::anonymous(), responder.clone(), None);

        handle.submit("hi").await.unwrap();

        // The ack arrives after the transition, before the reply
        let view = handle.view();
        assert!(view.is_awaiting_response);
        assert!(view.is_quota_exhausted);
        assert_eq!(view.turns, vec![Turn::user("hi")]);

        wait_idle(&handle).await;
    }

    #[tokio::test]
    async fn test_single_flight() {
        let responder = Arc::new(DelayedMockResponder::new(Duration::from_millis(200)));
        responder.queue_payload("### Response: one");
        responder.queue_payload("### Response: two");
        let handle = start(AuthSnapshot::authenticated(), responder.clone(), None);

        handle.submit("first").await.unwrap();
        responder.request_started.notified().await;

        assert_eq!(
            handle.submit("second").await,
            Err(SessionError::Rejected(TransitionError::AwaitingResponse))
        );

        let view = wait_idle(&handle).await;
        assert_eq!(view.turns, vec![Turn::user("first"), Turn::assistant("one")]);
        assert_eq!(responder.recorded_requests().len(), 1);

        // Open again once settled
        handle.submit("second").await.unwrap();
        let view = wait_idle(&handle).await;
        assert_eq!(view.turns.len(), 4);
        assert!(!view.is_quota_exhausted);
    }

    #[tokio::test]
    async fn test_timeout_forces_failure() {
        let responder = DelayedMockResponder::new(Duration::from_secs(30));
        responder.queue_payload("### Response: too late");
        let handle = start(
            AuthSnapshot::authenticated(),
            responder,
            Some(Duration::from_millis(50)),
        );

        handle.submit("hello?").await.unwrap();
        let view = wait_idle(&handle).await;

        assert_eq!(
            view.turns,
            vec![Turn::user("hello?"), Turn::assistant(ERROR_REPLY)]
        );
        assert!(view.can_submit);
    }

    #[tokio::test]
    async fn test_empty_and_whitespace_rejected() {
        let responder = Arc::new(MockResponder::new());
        let handle = start(AuthSnapshot::anonymous(), responder.clone(), None);

        assert_eq!(
            handle.submit("   ").await,
            Err(SessionError::Rejected(TransitionError::EmptyInput))
        );
        assert!(handle.view().turns.is_empty());
        assert!(handle.view().can_submit);
        assert!(responder.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_see_updates_in_order() {
        let responder = Arc::new(MockResponder::new());
        responder.queue_payload("### Response: hello");
        let handle = start(AuthSnapshot::authenticated(), responder, None);
        let mut updates = handle.subscribe();

        handle.submit("hi").await.unwrap();

        let first = updates.recv().await.unwrap();
        assert_eq!(first, SessionUpdate::InputCleared);

        let SessionUpdate::View { view } = updates.recv().await.unwrap() else {
            panic!("Expected view update");
        };
        assert!(view.is_awaiting_response);

        let SessionUpdate::View { view } = updates.recv().await.unwrap() else {
            panic!("Expected view update");
        };
        assert!(!view.is_awaiting_response);
        assert_eq!(view.turns.last(), Some(&Turn::assistant("hello")));
    }

    #[tokio::test]
    async fn test_reset_on_empty_transcript_notifies() {
        let handle = start(AuthSnapshot::anonymous(), MockResponder::new(), None);
        let mut updates = handle.subscribe();

        handle.request_reset().await.unwrap();

        assert_eq!(
            updates.recv().await.unwrap(),
            SessionUpdate::notice(Notice::EmptyTranscript)
        );
        let view = handle.view();
        assert!(!view.is_pending_reset);
        assert!(view.turns.is_empty());
    }

    #[tokio::test]
    async fn test_reset_workflow() {
        let responder = Arc::new(MockResponder::new());
        responder.queue_payload("### Response: a");
        let handle = start(AuthSnapshot::anonymous(), responder, None);

        handle.submit("q").await.unwrap();
        let view = wait_idle(&handle).await;
        assert_eq!(view.turns.len(), 2);
        assert!(view.is_quota_exhausted);

        handle.request_reset().await.unwrap();
        assert!(handle.view().is_pending_reset);
        assert!(handle.view().confirmation.is_some());

        handle.cancel_reset().await.unwrap();
        let view = handle.view();
        assert!(!view.is_pending_reset);
        assert_eq!(view.turns.len(), 2);

        handle.request_reset().await.unwrap();
        handle.confirm_reset().await.unwrap();
        let view = handle.view();
        assert!(view.turns.is_empty());
        assert!(!view.is_quota_exhausted);
        assert!(view.can_submit);

        // Second confirm with no gate open changes nothing
        handle.confirm_reset().await.unwrap();
        assert_eq!(handle.view(), view);
    }

    #[tokio::test]
    async fn test_reply_after_reset_lands_in_new_conversation() {
        let responder = Arc::new(DelayedMockResponder::new(Duration::from_millis(200)));
        responder.queue_payload("### Response: late answer");
        let handle = start(AuthSnapshot::anonymous(), responder.clone(), None);

        handle.submit("What is anxiety?").await.unwrap();
        handle.request_reset().await.unwrap();
        handle.confirm_reset().await.unwrap();

        let view = handle.view();
        assert!(view.turns.is_empty());
        assert!(view.is_awaiting_response);
        assert!(!view.can_submit);

        let view = wait_idle(&handle).await;
        assert_eq!(view.turns, vec![Turn::assistant("late answer")]);
        assert!(view.can_submit);
    }

    #[tokio::test]
    async fn test_manager_lifecycle_and_refresh() {
        let identity = Arc::new(StaticIdentity::new(AuthSnapshot::anonymous()));
        let responder = Arc::new(MockResponder::new());
        responder.queue_payload("### Response: one");
        responder.queue_payload("### Response: two");
        let manager = SessionManager::new(responder, identity.clone(), None);

        let handle = manager.create().await;
        assert_eq!(manager.session_count().await, 1);

        handle.submit("first").await.unwrap();
        wait_idle(&handle).await;
        assert!(handle.view().is_quota_exhausted);

        // Signing in elsewhere is only seen after a refresh
        identity.set(AuthSnapshot::authenticated());
        assert!(handle.view().is_quota_exhausted);
        let auth = manager.refresh_identity(handle.id()).await.unwrap();
        assert!(auth.is_authenticated);
        assert!(handle.view().can_submit);

        handle.submit("second").await.unwrap();
        assert_eq!(wait_idle(&handle).await.turns.len(), 4);

        manager.end(handle.id()).await.unwrap();
        assert_eq!(
            manager.get(handle.id()).await.err(),
            Some(SessionError::NotFound(handle.id().to_string()))
        );
        assert!(manager.end(handle.id()).await.is_err());
    }

    #[tokio::test]
    async fn test_new_session_reads_identity_once() {
        let identity = Arc::new(StaticIdentity::new(AuthSnapshot::authenticated()));
        let manager = SessionManager::new(Arc::new(MockResponder::new()), identity.clone(), None);

        let signed_in = manager.create().await;
        identity.set(AuthSnapshot::anonymous());
        let signed_out = manager.create().await;

        // Neither session has asked anything, so only the stored snapshot differs
        signed_in.submit("q").await.unwrap();
        signed_out.submit("q").await.unwrap();
        assert!(!wait_idle(&signed_in).await.is_quota_exhausted);
        assert!(wait_idle(&signed_out).await.is_quota_exhausted);
    }

    #[tokio::test]
    async fn test_controller_stops_when_handles_dropped() {
        let (controller, handle) = SessionController::new(
            SessionContext::new("short-lived", None),
            AuthSnapshot::anonymous(),
            MockResponder::new(),
        );
        let task = tokio::spawn(controller.run());

        drop(handle);
        tokio::time::timeout(WAIT, task)
            .await
            .expect("controller kept running")
            .unwrap();
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let identity = Arc::new(StaticIdentity::new(AuthSnapshot::anonymous()));
        let manager = SessionManager::new(Arc::new(MockResponder::new()), identity, None);

        let abandoned = manager.create().await;
        let active = manager.create().await;
        tokio::time::sleep(Duration::from_millis(80)).await;

        // Any lookup counts as activity
        manager.get(active.id()).await.unwrap();

        assert_eq!(manager.evict_idle(Duration::from_millis(40)).await, 1);
        assert_eq!(
            manager.get(abandoned.id()).await.err(),
            Some(SessionError::NotFound(abandoned.id().to_string()))
        );
        assert!(manager.get(active.id()).await.is_ok());
    }

    #[tokio::test]
    async fn test_session_with_call_in_flight_is_kept() {
        let responder = Arc::new(DelayedMockResponder::new(Duration::from_millis(300)));
        responder.queue_payload("### Response: slow");
        let identity = Arc::new(StaticIdentity::new(AuthSnapshot::authenticated()));
        let manager = SessionManager::new(responder.clone(), identity, None);

        let handle = manager.create().await;
        handle.submit("hi").await.unwrap();
        responder.request_started.notified().await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(manager.evict_idle(Duration::from_millis(10)).await, 0);
        assert_eq!(manager.session_count().await, 1);

        wait_idle(&handle).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(manager.evict_idle(Duration::from_millis(10)).await, 1);
    }

    #[tokio::test]
    async fn test_cleanup_task_expires_and_stops() {
        let identity = Arc::new(StaticIdentity::new(AuthSnapshot::anonymous()));
        let manager = Arc::new(SessionManager::new(
            Arc::new(MockResponder::new()),
            identity,
            None,
        ));

        manager.create().await;
        let task = manager.start_cleanup_task(Duration::from_millis(40));

        tokio::time::timeout(WAIT, async {
            while manager.session_count().await > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("idle session never expired");

        // The task ends once the manager is gone
        drop(manager);
        tokio::time::timeout(WAIT, task)
            .await
            .expect("cleanup task kept running")
            .unwrap();
    }
}
