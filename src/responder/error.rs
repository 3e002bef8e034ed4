//! Responder error types

use thiserror::Error;

/// Responder error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ResponderError {
    pub kind: ResponderErrorKind,
    pub message: String,
}

impl ResponderError {
    pub fn new(kind: ResponderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ResponderErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ResponderErrorKind::Timeout, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(ResponderErrorKind::RateLimit, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(ResponderErrorKind::ServerError, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ResponderErrorKind::Auth, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ResponderErrorKind::InvalidRequest, message)
    }

    pub fn malformed_body(message: impl Into<String>) -> Self {
        Self::new(ResponderErrorKind::MalformedBody, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ResponderErrorKind::Unknown, message)
    }
}

/// Why a responder call failed. Only used for logging; every kind ends the
/// request the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponderErrorKind {
    /// Connection refused, reset, DNS
    Network,
    /// No reply within the configured bound
    Timeout,
    /// 429
    RateLimit,
    /// 5xx
    ServerError,
    /// 401, 403
    Auth,
    /// 400, 404, 422
    InvalidRequest,
    /// 2xx with a body that is not `{ "response": string }`
    MalformedBody,
    Unknown,
}

impl ResponderErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::RateLimit => "rate_limit",
            Self::ServerError => "server_error",
            Self::Auth => "auth",
            Self::InvalidRequest => "invalid_request",
            Self::MalformedBody => "malformed_body",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ResponderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
