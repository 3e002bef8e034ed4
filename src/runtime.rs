//! Runtime for executing conversation sessions
//!
//! Each session runs its own [`SessionController`] task. Hosts talk to it
//! through a [`SessionHandle`]: commands in, [`SessionUpdate`]s out.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::{SessionContext, SessionController};

use crate::identity::{AuthSnapshot, IdentitySignal};
use crate::responder::Responder;
use crate::state_machine::{Event, Notice, SessionView, TransitionError};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Type alias for production controllers with a boxed responder
pub type ProductionController = SessionController<Arc<dyn Responder>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Rejected(#[from] TransitionError),
    #[error("Session has stopped")]
    Closed,
}

/// An event plus an optional channel for the transition outcome
#[derive(Debug)]
pub struct SessionCommand {
    pub event: Event,
    pub ack: Option<oneshot::Sender<Result<(), TransitionError>>>,
}

impl SessionCommand {
    /// Fire-and-forget command
    pub fn event(event: Event) -> Self {
        Self { event, ack: None }
    }
}

/// Updates pushed to session subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionUpdate {
    View { view: SessionView },
    Notice { notice: Notice, message: &'static str },
    InputCleared,
}

impl SessionUpdate {
    pub fn notice(notice: Notice) -> Self {
        SessionUpdate::Notice {
            notice,
            message: notice.message(),
        }
    }

    /// SSE event name
    pub fn kind(&self) -> &'static str {
        match self {
            SessionUpdate::View { .. } => "view",
            SessionUpdate::Notice { .. } => "notice",
            SessionUpdate::InputCleared => "input_cleared",
        }
    }
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    session_id: String,
    command_tx: mpsc::Sender<SessionCommand>,
    broadcast_tx: broadcast::Sender<SessionUpdate>,
    view_rx: watch::Receiver<SessionView>,
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.session_id
    }

    /// Send an event and wait until the controller has applied it
    pub async fn dispatch(&self, event: Event) -> Result<(), SessionError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.command_tx
            .send(SessionCommand {
                event,
                ack: Some(ack_tx),
            })
            .await
            .map_err(|_| SessionError::Closed)?;

        ack_rx.await.map_err(|_| SessionError::Closed)??;
        Ok(())
    }

    pub async fn submit(&self, text: impl Into<String>) -> Result<(), SessionError> {
        self.dispatch(Event::Submit { text: text.into() }).await
    }

    pub async fn request_reset(&self) -> Result<(), SessionError> {
        self.dispatch(Event::RequestReset).await
    }

    pub async fn confirm_reset(&self) -> Result<(), SessionError> {
        self.dispatch(Event::ConfirmReset).await
    }

    pub async fn cancel_reset(&self) -> Result<(), SessionError> {
        self.dispatch(Event::CancelReset).await
    }

    /// Hand the controller a fresh identity snapshot
    pub async fn refresh(&self, auth: AuthSnapshot) -> Result<(), SessionError> {
        self.dispatch(Event::IdentityChanged { auth }).await
    }

    /// Latest published view
    pub fn view(&self) -> SessionView {
        self.view_rx.borrow().clone()
    }

    /// Watch the latest view
    pub fn watch(&self) -> watch::Receiver<SessionView> {
        self.view_rx.clone()
    }

    /// Register for every update published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<SessionUpdate> {
        self.broadcast_tx.subscribe()
    }
}

/// Floor for the sweep period so tiny idle limits cannot spin
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(10);

struct SessionEntry {
    handle: SessionHandle,
    last_active: Instant,
}

/// Manager for all live sessions
pub struct SessionManager {
    responder: Arc<dyn Responder>,
    identity: Arc<dyn IdentitySignal>,
    response_timeout: Option<Duration>,
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionManager {
    pub fn new(
        responder: Arc<dyn Responder>,
        identity: Arc<dyn IdentitySignal>,
        response_timeout: Option<Duration>,
    ) -> Self {
        Self {
            responder,
            identity,
            response_timeout,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a new session. Identity is read once, here.
    pub async fn create(&self) -> SessionHandle {
        let session_id = uuid::Uuid::new_v4().to_string();
        let auth = self.identity.snapshot();
        let context = SessionContext::new(&session_id, self.response_timeout);

        let (controller, handle): (ProductionController, _) =
            SessionController::new(context, auth, self.responder.clone());

        tokio::spawn(controller.run());

        tracing::info!(
            session_id = %session_id,
            authenticated = auth.is_authenticated,
            "Session created"
        );

        self.sessions.write().await.insert(
            session_id,
            SessionEntry {
                handle: handle.clone(),
                last_active: Instant::now(),
            },
        );

        handle
    }

    /// Look up a session and mark it active
    pub async fn get(&self, session_id: &str) -> Result<SessionHandle, SessionError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        entry.last_active = Instant::now();
        Ok(entry.handle.clone())
    }

    /// Re-read the identity signal and pass it to a session
    pub async fn refresh_identity(&self, session_id: &str) -> Result<AuthSnapshot, SessionError> {
        let handle = self.get(session_id).await?;
        let auth = self.identity.snapshot();
        handle.refresh(auth).await?;
        Ok(auth)
    }

    /// Forget a session. Its controller stops once the last handle is gone.
    pub async fn end(&self, session_id: &str) -> Result<(), SessionError> {
        if self.sessions.write().await.remove(session_id).is_none() {
            return Err(SessionError::NotFound(session_id.to_string()));
        }
        tracing::info!(session_id = %session_id, "Session ended");
        Ok(())
    }

    /// Drop sessions untouched for longer than `max_idle`. Sessions with a
    /// call in flight are kept; the response timeout bounds those.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|session_id, entry| {
            let keep = entry.last_active.elapsed() <= max_idle
                || entry.handle.view().is_awaiting_response;
            if !keep {
                tracing::info!(session_id = %session_id, "Session expired after inactivity");
            }
            keep
        });

        before - sessions.len()
    }

    /// Background task that expires idle sessions. Stops once the manager is
    /// dropped.
    pub fn start_cleanup_task(self: &Arc<Self>, max_idle: Duration) -> JoinHandle<()> {
        let manager = Arc::downgrade(self);
        let period = (max_idle / 2).max(MIN_SWEEP_INTERVAL);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;

                let Some(manager) = manager.upgrade() else {
                    break;
                };
                let evicted = manager.evict_idle(max_idle).await;
                if evicted > 0 {
                    tracing::info!(evicted, "Expired idle sessions");
                }
            }
        })
    }

    #[cfg(test)]
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
