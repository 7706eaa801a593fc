use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub remaining_requests: u32,
    pub max_requests: u32,
    pub mapping_count: usize,
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionSummary>) {
    let (session_id, session) = state.sessions.create().await;
    let session = session.lock().await;
    (
        StatusCode::CREATED,
        Json(SessionSummary {
            session_id,
            remaining_requests: session.limiter.remaining(),
            max_requests: state.sessions.max_requests(),
            mapping_count: session.mappings.len(),
        }),
    )
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionSummary>, AppError> {
    let session = state.sessions.get(session_id).await?;
    let mut session = session.lock().await;
    session.touch();
    Ok(Json(SessionSummary {
        session_id,
        remaining_requests: session.limiter.remaining(),
        max_requests: session.limiter.max(),
        mapping_count: session.mappings.len(),
    }))
}
