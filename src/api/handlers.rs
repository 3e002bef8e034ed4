//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ErrorResponse, IdentityResponse, NoticeBody, ResetResponse, SessionResponse, SubmitRequest,
    SubmitResponse, SuccessResponse,
};
use super::AppState;
use crate::runtime::{SessionError, SessionUpdate};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::sync::broadcast::error::TryRecvError;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session lifecycle
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(end_session))
        // Questions
        .route("/api/sessions/:id/messages", post(submit_message))
        // Reset workflow
        .route("/api/sessions/:id/reset", post(request_reset))
        .route("/api/sessions/:id/reset/confirm", post(confirm_reset))
        .route("/api/sessions/:id/reset/cancel", post(cancel_reset))
        // Identity
        .route("/api/sessions/:id/identity/refresh", post(refresh_identity))
        // SSE streaming
        .route("/api/sessions/:id/stream", get(stream_session))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session lifecycle
// ============================================================

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionResponse>) {
    let handle = state.sessions.create().await;
    (
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id: handle.id().to_string(),
            view: handle.view(),
        }),
    )
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = state.sessions.get(&id).await?;
    Ok(Json(SessionResponse {
        session_id: id,
        view: handle.view(),
    }))
}

async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.sessions.end(&id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Questions
// ============================================================

async fn submit_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let handle = state.sessions.get(&id).await?;
    handle.submit(req.text).await?;

    // The answer arrives later, over the stream
    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            accepted: true,
            view: handle.view(),
        }),
    ))
}

// ============================================================
// Reset workflow
// ============================================================

async fn request_reset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResetResponse>, AppError> {
    let handle = state.sessions.get(&id).await?;

    // Subscribe first: effects are published before the dispatch is acked,
    // so any notice is already buffered once it returns
    let mut updates = handle.subscribe();
    handle.request_reset().await?;

    let mut notice = None;
    loop {
        match updates.try_recv() {
            Ok(SessionUpdate::Notice { notice: n, .. }) => notice = Some(NoticeBody::from(n)),
            Ok(_) | Err(TryRecvError::Lagged(_)) => {}
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }

    Ok(Json(ResetResponse {
        view: handle.view(),
        notice,
    }))
}

async fn confirm_reset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResetResponse>, AppError> {
    let handle = state.sessions.get(&id).await?;
    handle.confirm_reset().await?;
    Ok(Json(ResetResponse {
        view: handle.view(),
        notice: None,
    }))
}

async fn cancel_reset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResetResponse>, AppError> {
    let handle = state.sessions.get(&id).await?;
    handle.cancel_reset().await?;
    Ok(Json(ResetResponse {
        view: handle.view(),
        notice: None,
    }))
}

// ============================================================
// Identity
// ============================================================

async fn refresh_identity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<IdentityResponse>, AppError> {
    let auth = state.sessions.refresh_identity(&id).await?;
    let handle = state.sessions.get(&id).await?;
    Ok(Json(IdentityResponse {
        is_authenticated: auth.is_authenticated,
        view: handle.view(),
    }))
}

// ============================================================
// Streaming
// ============================================================

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let handle = state.sessions.get(&id).await?;

    // Subscribe before reading the view so nothing falls in between
    let broadcast_rx = handle.subscribe();
    Ok(sse_stream(handle.view(), broadcast_rx))
}

async fn get_version() -> &'static str {
    concat!("ask-assistant ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotFound(_) => AppError::NotFound(e.to_string()),
            SessionError::Rejected(_) => AppError::Conflict(e.to_string()),
            SessionError::Closed => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
