//! HTTP responder client

use super::types::{ResponderReply, ResponderRequest};
use super::{Responder, ResponderError};
use crate::config::ResponderConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts questions as JSON to a configured endpoint
pub struct HttpResponder {
    client: Client,
    endpoint: String,
}

impl HttpResponder {
    pub fn new(config: &ResponderConfig) -> Result<Self, ResponderError> {
        // The overall call bound lives in the session controller so it applies
        // to every responder, not only this one.
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ResponderError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    fn classify_error(status: reqwest::StatusCode, body: &str) -> ResponderError {
        match status.as_u16() {
            401 | 403 => ResponderError::auth(format!("Authentication failed: {body}")),
            429 => ResponderError::rate_limit(format!("Rate limited: {body}")),
            400 | 404 | 422 => ResponderError::invalid_request(format!("Invalid request: {body}")),
            500..=599 => ResponderError::server_error(format!("Server error: {body}")),
            _ => ResponderError::unknown(format!("HTTP {status}: {body}")),
        }
    }
}

#[async_trait]
impl Responder for HttpResponder {
    async fn ask(&self, request: &ResponderRequest) -> Result<ResponderReply, ResponderError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ResponderError::timeout(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    ResponderError::network(format!("Connection failed: {e}"))
                } else {
                    ResponderError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ResponderError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::classify_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            ResponderError::malformed_body(format!("Failed to parse response: {e} - body: {body}"))
        })
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
