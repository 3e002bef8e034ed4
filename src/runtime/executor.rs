//! Session controller executor

use super::{SessionCommand, SessionHandle, SessionUpdate};

use crate::identity::AuthSnapshot;
use crate::responder::{Responder, ResponderError, ResponderRequest};
use crate::state_machine::{transition, Effect, Event, SessionState, TransitionError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};

/// Immutable per-session configuration
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    /// Bound on a single responder call; `None` waits forever
    pub response_timeout: Option<Duration>,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>, response_timeout: Option<Duration>) -> Self {
        Self {
            session_id: session_id.into(),
            response_timeout,
        }
    }
}

/// Owns one session's state and is the only thing that mutates it or talks
/// to the responder
pub struct SessionController<R>
where
    R: Responder + 'static,
{
    context: SessionContext,
    state: SessionState,
    responder: Arc<R>,
    command_rx: mpsc::Receiver<SessionCommand>,
    /// Weak so the loop ends once every handle is dropped
    command_tx: mpsc::WeakSender<SessionCommand>,
    broadcast_tx: broadcast::Sender<SessionUpdate>,
    view_tx: watch::Sender<crate::state_machine::SessionView>,
}

impl<R> SessionController<R>
where
    R: Responder + 'static,
{
    pub fn new(context: SessionContext, auth: AuthSnapshot, responder: R) -> (Self, SessionHandle) {
        let state = SessionState::new(auth);
        let (command_tx, command_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);
        let (view_tx, view_rx) = watch::channel(state.view());

        let handle = SessionHandle {
            session_id: context.session_id.clone(),
            command_tx: command_tx.clone(),
            broadcast_tx: broadcast_tx.clone(),
            view_rx,
        };

        let controller = Self {
            context,
            state,
            responder: Arc::new(responder),
            command_rx,
            command_tx: command_tx.downgrade(),
            broadcast_tx,
            view_tx,
        };

        (controller, handle)
    }

    pub async fn run(mut self) {
        tracing::info!(session_id = %self.context.session_id, "Starting session controller");

        // One command at a time, each applied to completion
        while let Some(SessionCommand { event, ack }) = self.command_rx.recv().await {
            let outcome = self.process_event(event);
            if let Some(ack) = ack {
                let _ = ack.send(outcome);
            }
        }

        tracing::info!(session_id = %self.context.session_id, "Session controller stopped");
    }

    fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        let event_name = event.name();

        // Pure state transition
        let result = match transition(&self.state, event) {
            Ok(r) => r,
            Err(e) => {
                // Rejected input is not an error for the user; the UI already
                // disables the control
                tracing::debug!(
                    session_id = %self.context.session_id,
                    event = event_name,
                    reason = %e,
                    "Event rejected"
                );
                return Err(e);
            }
        };

        self.state = result.new_state;

        tracing::debug!(
            session_id = %self.context.session_id,
            event = event_name,
            effects = result.effects.len(),
            turns = self.state.transcript.len(),
            "Event applied"
        );

        for effect in result.effects {
            self.execute_effect(effect);
        }

        Ok(())
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::RequestResponse {
                request_id,
                input_text,
            } => self.request_response(request_id, input_text),

            Effect::ClearInput => {
                let _ = self.broadcast_tx.send(SessionUpdate::InputCleared);
            }

            Effect::ShowNotice { notice } => {
                let _ = self.broadcast_tx.send(SessionUpdate::notice(notice));
            }

            Effect::PublishView => {
                let view = self.state.view();
                self.view_tx.send_replace(view.clone());
                let _ = self.broadcast_tx.send(SessionUpdate::View { view });
            }
        }
    }

    /// Spawn the responder call; its outcome comes back as an event
    fn request_response(&self, request_id: u64, input_text: String) {
        let Some(reply_tx) = self.command_tx.upgrade() else {
            tracing::warn!(
                session_id = %self.context.session_id,
                request_id,
                "Session closed before the request was sent"
            );
            return;
        };

        let responder = self.responder.clone();
        let timeout = self.context.response_timeout;
        let session_id = self.context.session_id.clone();

        tokio::spawn(async move {
            tracing::info!(session_id = %session_id, request_id, "Asking responder (background)");

            let request = ResponderRequest::answer(input_text);
            let outcome = match timeout {
                Some(limit) => tokio::time::timeout(limit, responder.ask(&request))
                    .await
                    .unwrap_or_else(|_| {
                        Err(ResponderError::timeout(format!(
                            "No reply within {}ms",
                            limit.as_millis()
                        )))
                    }),
                None => responder.ask(&request).await,
            };

            let event = match outcome {
                Ok(reply) => Event::ResponseReceived {
                    request_id,
                    payload: reply.response,
                },
                Err(e) => {
                    tracing::warn!(
                        session_id = %session_id,
                        request_id,
                        kind = %e.kind,
                        error = %e.message,
                        "Responder call failed"
                    );
                    Event::ResponseFailed {
                        request_id,
                        reason: e.message,
                    }
                }
            };

            if reply_tx.send(SessionCommand::event(event)).await.is_err() {
                tracing::debug!(session_id = %session_id, request_id, "Session gone, reply dropped");
            }
        });
    }
}
