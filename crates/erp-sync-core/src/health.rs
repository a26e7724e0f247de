use axum::extract::State;
use axum::http::StatusCode;
use sea_orm::DatabaseConnection;

/// Liveness: `GET /healthz`.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Readiness: `GET /readyz` answers 200 once the database responds to a ping.
///
/// Mount on a router whose state implements `FromRef<_>` for `DatabaseConnection`.
pub async fn readyz(State(db): State<DatabaseConnection>) -> StatusCode {
    match db.ping().await {
        Ok(()) => StatusCode::OK,
        Err(err) => {
            ::tracing::warn!(error = %err, "readiness ping failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
