use axum::{Router, routing::get};
use tower::ServiceBuilder;

use erp_sync_core::health::{healthz, readyz};
use erp_sync_core::middleware::{propagate_request_id_layer, set_request_id_layer, trace_layer};

use crate::handlers::{
    monitoring::{get_failed, get_metrics, get_saga, get_status},
    saga::{get_dead_letters, get_entry, get_result},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Queue monitoring
        .route("/erp/status", get(get_status))
        .route("/erp/metrics", get(get_metrics))
        .route("/erp/failed", get(get_failed))
        .route("/erp/dead-letter", get(get_dead_letters))
        // Sagas
        .route("/erp/saga/{saga_id}", get(get_saga))
        .route("/erp/saga/{saga_id}/entry", get(get_entry))
        .route("/erp/saga/{saga_id}/result", get(get_result))
        .layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(trace_layer())
                .layer(propagate_request_id_layer()),
        )
        .with_state(state)
}
