//! API request and response types

use crate::state_machine::{Notice, SessionView};
use serde::{Deserialize, Serialize};

/// Request to submit a question
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub text: String,
}

/// A session and its current view
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub view: SessionView,
}

/// Response for an accepted question
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub accepted: bool,
    pub view: SessionView,
}

/// Response for reset actions
#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub view: SessionView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<NoticeBody>,
}

/// Informational notice with its display text
#[derive(Debug, Serialize)]
pub struct NoticeBody {
    pub notice: Notice,
    pub message: &'static str,
}

impl From<Notice> for NoticeBody {
    fn from(notice: Notice) -> Self {
        Self {
            notice,
            message: notice.message(),
        }
    }
}

/// Response for identity refresh
#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub is_authenticated: bool,
    pub view: SessionView,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
