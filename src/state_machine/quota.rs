//! Free-question quota for signed-out visitors

use crate::identity::AuthSnapshot;
use serde::Serialize;

/// Quota bookkeeping for one conversation
///
/// Signed-in users are never limited. A signed-out visitor gets one question
/// per conversation, spent the moment it is accepted rather than when an
/// answer arrives, so a failed or slow reply does not earn a second try.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct QuotaState {
    pub is_authenticated: bool,
    pub has_used_free_question: bool,
}

impl QuotaState {
    pub fn new(auth: AuthSnapshot) -> Self {
        Self {
            is_authenticated: auth.is_authenticated,
            has_used_free_question: false,
        }
    }

    /// Whether a new question may be submitted
    pub fn may_ask(self) -> bool {
        self.is_authenticated || !self.has_used_free_question
    }

    /// Spend the free question. No-op for signed-in users.
    #[must_use]
    pub fn consume(self) -> Self {
        if self.is_authenticated {
            self
        } else {
            Self {
                has_used_free_question: true,
                ..self
            }
        }
    }

    /// Give the free question back, keeping the identity as is
    #[must_use]
    pub fn reset(self) -> Self {
        Self {
            has_used_free_question: false,
            ..self
        }
    }

    /// Apply a new identity snapshot without touching usage
    #[must_use]
    pub fn with_auth(self, auth: AuthSnapshot) -> Self {
        Self {
            is_authenticated: auth.is_authenticated,
            ..self
        }
    }
}
