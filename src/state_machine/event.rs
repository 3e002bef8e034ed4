//! Events that drive a session

use crate::identity::AuthSnapshot;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // User events
    Submit {
        text: String,
    },
    RequestReset,
    ConfirmReset,
    CancelReset,

    // Responder events
    ResponseReceived {
        request_id: u64,
        /// Raw payload, marker and all
        payload: String,
    },
    ResponseFailed {
        request_id: u64,
        /// Logged, never shown
        reason: String,
    },

    // Host events
    IdentityChanged {
        auth: AuthSnapshot,
    },
}

impl Event {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Event::Submit { .. } => "submit",
            Event::RequestReset => "request_reset",
            Event::ConfirmReset => "confirm_reset",
            Event::CancelReset => "cancel_reset",
            Event::ResponseReceived { .. } => "response_received",
            Event::ResponseFailed { .. } => "response_failed",
            Event::IdentityChanged { .. } => "identity_changed",
        }
    }
}
