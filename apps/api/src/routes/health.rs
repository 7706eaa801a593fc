use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, version and a few runtime counts.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "occucode-api",
        "decoder_entries": state.decoder.len(),
        "suggestions_enabled": state.suggester.is_some(),
        "active_sessions": state.sessions.len().await,
    }))
}
