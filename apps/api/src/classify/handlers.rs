use axum::{
    extract::{Path, State},
    Json,
};
use occucode_core::classify_title;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    /// Absent only when the provider call failed.
    pub raw_output: Option<String>,
    pub decoded_output: Option<String>,
    /// The model answered but the decode table has no entry for it.
    pub hallucination_suspected: bool,
    /// Inline provider error; the request still counts against the allowance.
    pub error: Option<String>,
    pub remaining_requests: u32,
}

/// POST /api/v1/sessions/:id/classify
pub async fn handle_classify(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, AppError> {
    if request.title.trim().is_empty() {
        return Err(AppError::Validation(
            "Please enter an occupation title.".to_string(),
        ));
    }

    let session = state.sessions.get(session_id).await?;
    let remaining_requests = {
        let mut session = session.lock().await;
        session.touch();
        session.limiter.try_acquire()?
    };
    info!(%session_id, remaining_requests, "classification request accepted");

    let response =
        match classify_title(state.model.as_ref(), &state.decoder, &request.title).await {
            Ok(result) => {
                let hallucination_suspected = result.hallucination_suspected();
                if hallucination_suspected {
                    info!(%session_id, raw = %result.raw_output, "no decode entry for model output");
                }
                ClassifyResponse {
                    raw_output: Some(result.raw_output),
                    decoded_output: result.decoded_output,
                    hallucination_suspected,
                    error: None,
                    remaining_requests,
                }
            }
            Err(e) => {
                warn!(%session_id, "classification call failed: {e}");
                ClassifyResponse {
                    raw_output: None,
                    decoded_output: None,
                    hallucination_suspected: false,
                    error: Some(format!("Error: {e}")),
                    remaining_requests,
                }
            }
        };

    Ok(Json(response))
}
