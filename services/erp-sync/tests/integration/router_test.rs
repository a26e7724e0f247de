use axum_test::TestServer;
use chrono::{Duration, Utc};
use sea_orm::{DatabaseBackend, MockDatabase};
use serde_json::{Value, json};
use uuid::Uuid;

use erp_sync::domain::policy::RetryPolicy;
use erp_sync::router::build_router;
use erp_sync::state::AppState;
use erp_sync_schema::erp_outbox;

fn row(status: &str, attempts: i32) -> erp_outbox::Model {
    let created_at = Utc::now() - Duration::minutes(10);
    erp_outbox::Model {
        id: Uuid::new_v4(),
        saga_id: Uuid::new_v4(),
        tenant_id: Uuid::new_v4(),
        idempotency_key: "sync-rcp-100".to_owned(),
        event_type: erp_sync_domain::RECIPE_UPSERT_EVENT.to_owned(),
        payload: json!({ "recipe": { "recipe_code": "RCP-100", "version": "1.0" } }),
        status: status.to_owned(),
        attempts,
        next_run_at: created_at,
        last_error: None,
        result_payload: None,
        processing_started_at: None,
        processed_at: None,
        created_at,
        updated_at: created_at,
    }
}

fn server(db: MockDatabase) -> TestServer {
    let state = AppState {
        db: db.into_connection(),
        policy: RetryPolicy::default(),
    };
    TestServer::new(build_router(state)).unwrap()
}

#[tokio::test]
async fn should_answer_liveness_with_request_id() {
    let server = server(MockDatabase::new(DatabaseBackend::Postgres));

    let response = server.get("/healthz").await;

    response.assert_status_ok();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn should_return_saga_detail() {
    let mut pending = row("pending", 1);
    pending.last_error = Some("ERP responded 503".to_owned());
    let saga_id = pending.saga_id;
    let server = server(
        MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![pending]]),
    );

    let response = server.get(&format!("/erp/saga/{saga_id}")).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["saga_id"], saga_id.to_string());
    assert_eq!(body["status"], "pending");
    assert_eq!(body["attempts"], 1);
    assert_eq!(body["backoff_seconds"], 30);
    assert_eq!(body["last_error"], "ERP responded 503");
    assert_eq!(body["time_in_queue_seconds"], Value::Null);
}

#[tokio::test]
async fn should_return_404_for_unknown_saga() {
    let server = server(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<erp_outbox::Model>::new()]),
    );

    let response = server.get(&format!("/erp/saga/{}", Uuid::new_v4())).await;

    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["kind"], "SAGA_NOT_FOUND");
}

#[tokio::test]
async fn should_return_completed_result() {
    let mut completed = row("completed", 2);
    let processed_at = Utc::now();
    completed.processed_at = Some(processed_at);
    completed.result_payload = Some(json!({
        "external_recipe_id": "ERP-RCP-100",
        "processed_at": processed_at,
        "attempts": 2,
    }));
    let saga_id = completed.saga_id;
    let server = server(
        MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![completed]]),
    );

    let response = server.get(&format!("/erp/saga/{saga_id}/result")).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["external_recipe_id"], "ERP-RCP-100");
    assert_eq!(body["attempts"], 2);
}

#[tokio::test]
async fn should_return_404_for_result_of_unfinished_saga() {
    let pending = row("in_progress", 1);
    let saga_id = pending.saga_id;
    let server = server(
        MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![pending]]),
    );

    let response = server.get(&format!("/erp/saga/{saga_id}/result")).await;

    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["kind"], "RESULT_NOT_FOUND");
}

#[tokio::test]
async fn should_project_entry_shape() {
    let dead = row("dead", 5);
    let saga_id = dead.saga_id;
    let server = server(
        MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![dead]]),
    );

    let response = server.get(&format!("/erp/saga/{saga_id}/entry")).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "dead");
    assert_eq!(body["attempts"], 5);
    assert_eq!(body["event_type"], "inventory.recipe.upsert");
    assert!(body.get("payload").is_none());
}

#[tokio::test]
async fn should_list_dead_letters() {
    let server = server(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row("dead", 5), row("dead", 1)]]),
    );

    let response = server.get("/erp/dead-letter").add_query_param("limit", 10).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn should_reject_out_of_range_queries() {
    let server = server(MockDatabase::new(DatabaseBackend::Postgres));

    for (path, key, value) in [
        ("/erp/metrics", "hours", "0"),
        ("/erp/metrics", "hours", "169"),
        ("/erp/metrics", "hours", "soon"),
        ("/erp/dead-letter", "limit", "0"),
        ("/erp/failed", "page-size", "500"),
        ("/erp/failed", "page", "0"),
    ] {
        let response = server.get(path).add_query_param(key, value).await;
        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["kind"], "INVALID_QUERY", "{path}?{key}={value}");
    }
}
