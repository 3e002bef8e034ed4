//! Remote responder client
//!
//! The responder is the remote service that turns a question into an answer
//! payload. Everything that talks to it goes through the [`Responder`] trait.

mod error;
mod extract;
mod http;
mod types;

pub use error::{ResponderError, ResponderErrorKind};
pub use extract::extract_response;
pub use http::HttpResponder;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for responders
#[async_trait]
pub trait Responder: Send + Sync {
    /// Send one question and wait for the raw reply
    async fn ask(&self, request: &ResponderRequest) -> Result<ResponderReply, ResponderError>;

    /// Where questions are sent, for logs
    fn endpoint(&self) -> &str;
}

#[async_trait]
impl<T: Responder + ?Sized> Responder for Arc<T> {
    async fn ask(&self, request: &ResponderRequest) -> Result<ResponderReply, ResponderError> {
        (**self).ask(request).await
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}

/// Logging wrapper for responders
pub struct LoggingResponder {
    inner: Arc<dyn Responder>,
}

impl LoggingResponder {
    pub fn new(inner: Arc<dyn Responder>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Responder for LoggingResponder {
    async fn ask(&self, request: &ResponderRequest) -> Result<ResponderReply, ResponderError> {
        let start = std::time::Instant::now();
        let result = self.inner.ask(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    endpoint = %self.inner.endpoint(),
                    duration_ms = %duration.as_millis(),
                    input_len = request.input_text.len(),
                    payload_len = reply.response.len(),
                    "Responder request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    endpoint = %self.inner.endpoint(),
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = %e.kind,
                    "Responder request failed"
                );
            }
        }

        result
    }

    fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }
}
