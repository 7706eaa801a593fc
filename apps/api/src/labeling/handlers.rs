use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use occucode_core::{MappingRecord, Suggestion};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::labeling::{DEFAULT_SUGGESTIONS, MAX_SUGGESTIONS, MIN_SUGGESTIONS};
use crate::state::AppState;

pub const EXPORT_FILE_NAME: &str = "prematch.jsonl";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SuggestRequest {
    pub profession: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
pub struct AddMappingRequest {
    pub profession: String,
    /// Falls back to the top suggestion from the last suggestion request.
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MappingListResponse {
    pub mappings: Vec<MappingRecord>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/suggestions
///
/// Ranks the known codes against the typed profession. The list is kept on
/// the session until a mapping is added.
pub async fn handle_suggest(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SuggestRequest>,
) -> Result<Json<SuggestResponse>, AppError> {
    let limit = request.limit.unwrap_or(DEFAULT_SUGGESTIONS);
    if !(MIN_SUGGESTIONS..=MAX_SUGGESTIONS).contains(&limit) {
        return Err(AppError::Validation(format!(
            "limit must be between {MIN_SUGGESTIONS} and {MAX_SUGGESTIONS}"
        )));
    }

    let suggester = state.suggester.as_ref().ok_or_else(|| {
        AppError::NotImplemented("No embedding endpoint is configured".to_string())
    })?;
    let session = state.sessions.get(session_id).await?;

    let suggestions = suggester
        .index
        .suggest(&request.profession, limit, suggester.embedder.as_ref())
        .await?;

    let mut session = session.lock().await;
    session.touch();
    session.suggestions = suggestions.clone();

    Ok(Json(SuggestResponse { suggestions }))
}

/// GET /api/v1/sessions/:id/mappings
pub async fn handle_list_mappings(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<MappingListResponse>, AppError> {
    let session = state.sessions.get(session_id).await?;
    let mut session = session.lock().await;
    session.touch();
    Ok(Json(MappingListResponse {
        mappings: session.mappings.records().to_vec(),
    }))
}

/// POST /api/v1/sessions/:id/mappings
///
/// Without a `code`, the top entry of the stored suggestion list is used.
pub async fn handle_add_mapping(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<AddMappingRequest>,
) -> Result<(StatusCode, Json<MappingRecord>), AppError> {
    let session = state.sessions.get(session_id).await?;
    let mut session = session.lock().await;
    session.touch();
    let code = match request.code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => code.to_string(),
        _ => session
            .suggestions
            .first()
            .map(|s| s.code.clone())
            .unwrap_or_default(),
    };
    let record = session.mappings.add(&request.profession, &code)?.clone();
    session.suggestions.clear();
    Ok((StatusCode::CREATED, Json(record)))
}

/// DELETE /api/v1/sessions/:id/mappings/:index
pub async fn handle_delete_mapping(
    State(state): State<AppState>,
    Path((session_id, index)): Path<(Uuid, usize)>,
) -> Result<StatusCode, AppError> {
    let session = state.sessions.get(session_id).await?;
    let mut session = session.lock().await;
    session.touch();
    session.mappings.remove(index)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/sessions/:id/mappings/export
///
/// Line-delimited JSON download, readable by the lookup loader.
pub async fn handle_export_mappings(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let session = state.sessions.get(session_id).await?;
    let mut session = session.lock().await;
    session.touch();
    let body = session.mappings.to_jsonl()?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/jsonl".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
            ),
        ],
        body,
    )
        .into_response())
}
