//! Error types for the HTTP surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use records::{RecordValidationError, RecordsError};
use thiserror::Error;

/// Errors that can occur while serving a request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Records database error; validation failures become 400s.
    #[error(transparent)]
    Records(#[from] RecordsError),

    /// Wine catalog error.
    #[error("Catalog error: {0}")]
    Catalog(#[from] catalog::ExecutionError),

    /// Chat pipeline error.
    #[error("Assistant error: {0}")]
    Assistant(#[from] assistant::AssistantError),
}

impl ApiError {
    fn validation(&self) -> Option<&RecordValidationError> {
        match self {
            ApiError::Records(RecordsError::Validation(err)) => Some(err),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Some(validation) = self.validation() {
            // {"error": message, "kind": ..., ...fields}
            let mut body = match serde_json::to_value(validation) {
                Ok(serde_json::Value::Object(map)) => map,
                _ => serde_json::Map::new(),
            };
            body.insert(
                "error".to_string(),
                serde_json::Value::String(validation.to_string()),
            );
            return (StatusCode::BAD_REQUEST, Json(serde_json::Value::Object(body)))
                .into_response();
        }

        tracing::error!("Request failed: {}", self);
        let body = serde_json::json!({
            "error": self.to_string()
        });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Result type for request handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = ApiError::Records(RecordsError::Validation(
            RecordValidationError::MissingContent,
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_catalog_failure_is_internal() {
        let err = ApiError::Catalog(catalog::ExecutionError::Timeout);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
