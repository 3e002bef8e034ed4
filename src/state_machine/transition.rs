//! Pure state transition function
//!
//! Given the same state and event it always produces the same result, with
//! no I/O. The runtime executes the returned effects.

use super::state::{Notice, Phase, SessionState, ERROR_REPLY};
use super::transcript::Turn;
use super::{Effect, Event};
use crate::responder::extract_response;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Input the session refused. State is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Question is empty")]
    EmptyInput,
    #[error("Free question already used, sign in to ask more")]
    QuotaExhausted,
    #[error("Still waiting for the previous answer")]
    AwaitingResponse,
    #[error("Reply does not belong to the request in flight")]
    UnexpectedResponse,
}

/// Pure transition function
pub fn transition(
    state: &SessionState,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (&state.phase, event) {
        // ============================================================
        // Submission
        // ============================================================

        (Phase::AwaitingResponse { .. }, Event::Submit { .. }) => {
            Err(TransitionError::AwaitingResponse)
        }

        (Phase::Idle, Event::Submit { text }) => {
            let question = text.trim();
            if question.is_empty() {
                return Err(TransitionError::EmptyInput);
            }
            if !state.quota.may_ask() {
                return Err(TransitionError::QuotaExhausted);
            }

            let mut next = state.clone();
            let request_id = next.next_request_id;
            next.next_request_id += 1;
            next.transcript.append(Turn::user(question));
            // Spent now, not on success
            next.quota = next.quota.consume();
            next.phase = Phase::AwaitingResponse { request_id };

            Ok(TransitionResult::new(next).with_effects([
                Effect::ClearInput,
                Effect::request_response(request_id, question),
                Effect::PublishView,
            ]))
        }

        // ============================================================
        // Responder replies
        // ============================================================

        (
            Phase::AwaitingResponse { request_id },
            Event::ResponseReceived {
                request_id: reply_id,
                payload,
            },
        ) if *request_id == reply_id => Ok(settle(
            state,
            Turn::assistant(extract_response(&payload)),
        )),

        (
            Phase::AwaitingResponse { request_id },
            Event::ResponseFailed {
                request_id: reply_id,
                ..
            },
        ) if *request_id == reply_id => Ok(settle(state, Turn::assistant(ERROR_REPLY))),

        (_, Event::ResponseReceived { .. } | Event::ResponseFailed { .. }) => {
            Err(TransitionError::UnexpectedResponse)
        }

        // ============================================================
        // Reset workflow (valid in any phase)
        // ============================================================

        (_, Event::RequestReset) => {
            if state.transcript.is_empty() {
                Ok(TransitionResult::new(state.clone())
                    .with_effect(Effect::notice(Notice::EmptyTranscript)))
            } else if state.pending_reset {
                Ok(TransitionResult::new(state.clone()))
            } else {
                let mut next = state.clone();
                next.pending_reset = true;
                Ok(TransitionResult::new(next).with_effect(Effect::PublishView))
            }
        }

        (_, Event::ConfirmReset) => {
            if !state.pending_reset {
                return Ok(TransitionResult::new(state.clone()));
            }

            let mut next = state.clone();
            next.transcript.clear();
            next.quota = next.quota.reset();
            next.pending_reset = false;
            // A call in flight keeps running; its reply lands in the new conversation

            Ok(TransitionResult::new(next).with_effect(Effect::PublishView))
        }

        (_, Event::CancelReset) => {
            if !state.pending_reset {
                return Ok(TransitionResult::new(state.clone()));
            }

            let mut next = state.clone();
            next.pending_reset = false;
            Ok(TransitionResult::new(next).with_effect(Effect::PublishView))
        }

        // ============================================================
        // Identity
        // ============================================================

        (_, Event::IdentityChanged { auth }) => {
            if state.quota.is_authenticated == auth.is_authenticated {
                return Ok(TransitionResult::new(state.clone()));
            }

            let mut next = state.clone();
            next.quota = next.quota.with_auth(auth);
            Ok(TransitionResult::new(next).with_effect(Effect::PublishView))
        }
    }
}

/// Return to idle with the answer appended
fn settle(state: &SessionState, answer: Turn) -> TransitionResult {
    let mut next = state.clone();
    next.phase = Phase::Idle;
    next.transcript.append(answer);
    TransitionResult::new(next).with_effect(Effect::PublishView)
}
