use axum::extract::FromRef;
use sea_orm::DatabaseConnection;

use crate::domain::policy::RetryPolicy;
use crate::infra::db::DbOutboxStore;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub policy: RetryPolicy,
}

impl AppState {
    pub fn outbox_store(&self) -> DbOutboxStore {
        DbOutboxStore {
            db: self.db.clone(),
        }
    }
}

impl FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
