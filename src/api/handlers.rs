//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{CreateSessionResponse, ErrorResponse, QueryRequest, SuccessResponse};
use super::AppState;
use crate::catalog::Catalog;
use crate::runtime::{Outcome, RuntimeError, SessionHandle};
use crate::session::SessionSnapshot;
use crate::state_machine::ActionRequest;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Static content
        .route("/api/catalog", get(get_catalog))
        // Session lifecycle
        .route("/api/sessions", post(create_session))
        .route(
            "/api/sessions/:id",
            get(get_session).delete(delete_session),
        )
        .route("/api/sessions/:id/open", post(open_session))
        .route("/api/sessions/:id/close", post(close_session))
        .route("/api/sessions/:id/reset", post(reset_session))
        // User input
        .route("/api/sessions/:id/action", post(dispatch_action))
        .route("/api/sessions/:id/query", post(send_query))
        // SSE streaming
        .route("/api/sessions/:id/stream", get(stream_session))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

async fn session(state: &AppState, id: &str) -> Result<SessionHandle, AppError> {
    Ok(state.sessions.get(id).await?)
}

// ============================================================
// Catalog
// ============================================================

async fn get_catalog(State(state): State<AppState>) -> Json<Catalog> {
    Json(state.sessions.context().catalog.as_ref().clone())
}

// ============================================================
// Sessions
// ============================================================

async fn create_session(State(state): State<AppState>) -> Json<CreateSessionResponse> {
    let handle = state.sessions.create().await;
    Json(CreateSessionResponse {
        session_id: handle.id().to_string(),
        snapshot: handle.snapshot(),
    })
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(session(&state, &id).await?.snapshot()))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.sessions.remove(&id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn open_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Outcome>, AppError> {
    Ok(Json(session(&state, &id).await?.open().await?))
}

async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Outcome>, AppError> {
    Ok(Json(session(&state, &id).await?.close().await?))
}

async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Outcome>, AppError> {
    Ok(Json(session(&state, &id).await?.reset().await?))
}

// ============================================================
// User Input
// ============================================================

async fn dispatch_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ActionRequest>,
) -> Result<Json<Outcome>, AppError> {
    let handle = session(&state, &id).await?;
    let outcome = handle
        .dispatch_raw(&req.kind, req.payload.as_ref())
        .await?;
    Ok(Json(outcome))
}

async fn send_query(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<Outcome>, AppError> {
    if req.text.trim().is_empty() {
        return Err(AppError::BadRequest("Query text is empty".to_string()));
    }
    let handle = session(&state, &id).await?;
    Ok(Json(handle.dispatch_text(req.text).await?))
}

// ============================================================
// SSE Streaming
// ============================================================

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let handle = session(&state, &id).await?;
    // Subscribe before taking the snapshot so nothing falls in between
    let events = handle.subscribe();
    Ok(sse_stream(handle.snapshot(), events))
}

async fn get_version() -> &'static str {
    concat!("pricing-assistant ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<RuntimeError> for AppError {
    fn from(e: RuntimeError) -> Self {
        match e {
            RuntimeError::NotFound(_) => AppError::NotFound(e.to_string()),
            RuntimeError::Action(_) => AppError::BadRequest(e.to_string()),
            RuntimeError::Stopped => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
