use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Failures surfaced by the query relay endpoints.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Query parameter is required")]
    MissingQuery,
    #[error("Invalid query string: {0}")]
    InvalidQueryString(#[from] QueryRejection),
    #[error("Failed to query Prometheus: {0}")]
    Upstream(#[from] reqwest::Error),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match self {
            RelayError::MissingQuery => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Query parameter is required" })),
            )
                .into_response(),
            RelayError::InvalidQueryString(e) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Invalid query string",
                    "message": e.to_string(),
                })),
            )
                .into_response(),
            RelayError::Upstream(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to query Prometheus",
                    "message": e.to_string(),
                })),
            )
                .into_response(),
        }
    }
}
