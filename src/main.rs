//! Ask Assistant - question/answer sessions with a one-question free tier
//!
//! A Rust backend implementing a conversation session state machine that
//! forwards questions to a remote responder.

mod api;
mod config;
mod identity;
mod responder;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use config::AppConfig;
use identity::{IdentitySignal, PersistedIdentity};
use responder::{HttpResponder, LoggingResponder, Responder};
use runtime::SessionManager;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ask_assistant=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = AppConfig::from_env()?;

    // Remote responder
    let http = HttpResponder::new(&config.responder)?;
    let responder: Arc<dyn Responder> = Arc::new(LoggingResponder::new(Arc::new(http)));
    tracing::info!(
        endpoint = %responder.endpoint(),
        timeout_secs = config.responder.timeout.map(|t| t.as_secs()),
        "Responder configured"
    );

    // Identity signal
    let identity = PersistedIdentity::new(config.identity_path.clone());
    if !identity.path().exists() {
        tracing::warn!(
            path = %identity.path().display(),
            "No identity file yet; sessions start anonymous"
        );
    }
    let identity: Arc<dyn IdentitySignal> = Arc::new(identity);

    // Create application state
    let sessions = Arc::new(SessionManager::new(
        responder,
        identity,
        config.responder.timeout,
    ));
    match config.session_idle_timeout {
        Some(max_idle) => {
            sessions.start_cleanup_task(max_idle);
            tracing::info!(idle_secs = max_idle.as_secs(), "Idle session expiry enabled");
        }
        None => tracing::warn!("Idle session expiry disabled; sessions live until ended"),
    }
    let state = AppState::new(sessions);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Ask Assistant server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
