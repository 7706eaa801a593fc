use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use occucode_core::{MappingError, RateLimitExceeded, SuggestError};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    RateLimited(#[from] RateLimitExceeded),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Not implemented: {0}")]
    NotImplemented(String),
}

impl From<MappingError> for AppError {
    fn from(e: MappingError) -> Self {
        match e {
            MappingError::OutOfRange { .. } => AppError::NotFound(e.to_string()),
            MappingError::EmptyProfession
            | MappingError::EmptyCode
            | MappingError::NothingToExport => AppError::Validation(e.to_string()),
            MappingError::Serialize(_) | MappingError::Write { .. } => {
                AppError::Internal(anyhow::Error::new(e))
            }
        }
    }
}

impl From<SuggestError> for AppError {
    fn from(e: SuggestError) -> Self {
        match e {
            SuggestError::EmptyQuery => {
                AppError::Validation("Please enter a profession to get suggestions.".to_string())
            }
            SuggestError::Embed(inner) => AppError::Embedding(inner.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::RateLimited(e) => {
                tracing::info!("Rate limit reached: {e}");
                (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", e.to_string())
            }
            AppError::Embedding(msg) => {
                tracing::error!("Embedding error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "EMBEDDING_ERROR",
                    "The suggestion service is unavailable".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
            AppError::NotImplemented(msg) => {
                (StatusCode::NOT_IMPLEMENTED, "NOT_IMPLEMENTED", msg.clone())
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_maps_to_429() {
        let err = AppError::from(RateLimitExceeded {
            max: 5,
            contact: "ops@example.org".to_string(),
        });
        assert_eq!(err.into_response().status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_mapping_out_of_range_is_not_found() {
        let err = AppError::from(MappingError::OutOfRange { index: 3, len: 1 });
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_nothing_to_export_is_validation() {
        let err = AppError::from(MappingError::NothingToExport);
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_empty_query_is_validation() {
        let err = AppError::from(SuggestError::EmptyQuery);
        assert!(matches!(err, AppError::Validation(_)));
    }
}
