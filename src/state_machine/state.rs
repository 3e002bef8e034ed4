//! Session state types

use super::quota::QuotaState;
use super::transcript::{Transcript, Turn};
use crate::identity::AuthSnapshot;
use serde::Serialize;

/// Assistant turn shown when the responder could not be reached
pub const ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// Shown to signed-out visitors once their free question is spent
pub const SIGN_IN_PROMPT: &str = "Please sign in to ask more questions.";

pub const RESET_CONFIRM_TITLE: &str = "Start New Chat?";
pub const RESET_CONFIRM_BODY: &str =
    "Are you sure you want to start a new chat? This will delete the current conversation.";

/// Request/response phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Phase {
    /// Ready for a question
    #[default]
    Idle,

    /// One responder call in flight
    AwaitingResponse { request_id: u64 },
}

/// Complete state of one conversation session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub phase: Phase,
    pub transcript: Transcript,
    pub quota: QuotaState,
    /// A reset confirmation prompt is open
    pub pending_reset: bool,
    /// Id handed to the next outbound call
    pub next_request_id: u64,
}

impl SessionState {
    pub fn new(auth: AuthSnapshot) -> Self {
        Self {
            phase: Phase::Idle,
            transcript: Transcript::new(),
            quota: QuotaState::new(auth),
            pending_reset: false,
            next_request_id: 1,
        }
    }

    pub fn is_awaiting_response(&self) -> bool {
        matches!(self.phase, Phase::AwaitingResponse { .. })
    }

    pub fn is_quota_exhausted(&self) -> bool {
        !self.quota.may_ask()
    }

    pub fn can_submit(&self) -> bool {
        !self.is_awaiting_response() && self.quota.may_ask()
    }

    /// Projection handed to observers after each transition
    pub fn view(&self) -> SessionView {
        let is_quota_exhausted = self.is_quota_exhausted();
        SessionView {
            turns: self.transcript.turns().to_vec(),
            is_awaiting_response: self.is_awaiting_response(),
            can_submit: self.can_submit(),
            is_quota_exhausted,
            is_pending_reset: self.pending_reset,
            sign_in_prompt: is_quota_exhausted.then_some(SIGN_IN_PROMPT),
            confirmation: self.pending_reset.then_some(ConfirmationPrompt {
                title: RESET_CONFIRM_TITLE,
                body: RESET_CONFIRM_BODY,
            }),
        }
    }
}

/// What a UI needs to render a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub turns: Vec<Turn>,
    pub is_awaiting_response: bool,
    pub can_submit: bool,
    pub is_quota_exhausted: bool,
    pub is_pending_reset: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sign_in_prompt: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<ConfirmationPrompt>,
}

/// Text of the reset confirmation dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfirmationPrompt {
    pub title: &'static str,
    pub body: &'static str,
}

/// Informational messages that are not part of the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    /// Reset requested with nothing to reset
    EmptyTranscript,
}

impl Notice {
    pub fn message(self) -> &'static str {
        match self {
            Notice::EmptyTranscript => "The chat is currently empty.",
        }
    }
}
