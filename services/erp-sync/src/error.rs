use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// ERP sync service error variants.
#[derive(Debug, thiserror::Error)]
pub enum ErpSyncError {
    #[error("saga not found")]
    SagaNotFound,
    #[error("result not found")]
    ResultNotFound,
    #[error("invalid command: {0}")]
    InvalidCommand(String),
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ErpSyncError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SagaNotFound => "SAGA_NOT_FOUND",
            Self::ResultNotFound => "RESULT_NOT_FOUND",
            Self::InvalidCommand(_) => "INVALID_COMMAND",
            Self::InvalidQuery(_) => "INVALID_QUERY",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for ErpSyncError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::SagaNotFound | Self::ResultNotFound => StatusCode::NOT_FOUND,
            Self::InvalidCommand(_) | Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Only 500s are logged here; TraceLayer already records every response status.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = ?e, kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
