//! Error types for the history service.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use harbor_store::StoreError;
use serde_json::json;

/// Errors that can occur while serving a history request.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum HistoryError {
    /// A query parameter or path identifier is malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No scan has the requested identifier.
    #[error("not found")]
    NotFound,

    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for HistoryError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            HistoryError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            HistoryError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            HistoryError::Store(e) => {
                tracing::error!(error = %e, "store failure");
                if e.is_unavailable() {
                    (StatusCode::SERVICE_UNAVAILABLE, "store unavailable".to_owned())
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_owned())
                }
            }
        };
        (status, Json(json!({"error": message}))).into_response()
    }
}
