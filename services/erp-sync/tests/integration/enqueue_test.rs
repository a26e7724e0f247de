use uuid::Uuid;

use erp_sync::domain::types::OutboxStatus;
use erp_sync::error::ErpSyncError;
use erp_sync::usecase::enqueue::EnqueueRecipeSyncUseCase;
use erp_sync_domain::RECIPE_UPSERT_EVENT;

use crate::helpers::{MemoryOutboxStore, test_command};

#[tokio::test]
async fn should_create_pending_entry_due_immediately() {
    let store = MemoryOutboxStore::new();
    let usecase = EnqueueRecipeSyncUseCase {
        store: store.clone(),
    };
    let tenant = Uuid::new_v4();

    let entry = usecase
        .execute(&test_command(tenant, "sync-rcp-100", "RCP-100"))
        .await
        .unwrap();

    assert_eq!(entry.tenant_id, tenant);
    assert_eq!(entry.idempotency_key, "sync-rcp-100");
    assert_eq!(entry.status, OutboxStatus::Pending);
    assert_eq!(entry.attempts, 0);
    assert_eq!(entry.last_error, None);
    assert_eq!(entry.event_type, RECIPE_UPSERT_EVENT);

    let stored = store.get(entry.saga_id);
    assert_eq!(stored.next_run_at, stored.created_at);
    assert_eq!(stored.payload["recipe"]["recipe_code"], "RCP-100");
}

#[tokio::test]
async fn should_return_same_saga_for_repeated_key() {
    let store = MemoryOutboxStore::new();
    let usecase = EnqueueRecipeSyncUseCase {
        store: store.clone(),
    };
    let command = test_command(Uuid::new_v4(), "sync-rcp-100", "RCP-100");

    let first = usecase.execute(&command).await.unwrap();
    let second = usecase.execute(&command).await.unwrap();
    let third = usecase.execute(&command).await.unwrap();

    assert_eq!(first.saga_id, second.saga_id);
    assert_eq!(first.saga_id, third.saga_id);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn should_keep_first_payload_when_duplicate_differs() {
    let store = MemoryOutboxStore::new();
    let usecase = EnqueueRecipeSyncUseCase {
        store: store.clone(),
    };
    let tenant = Uuid::new_v4();

    let first = usecase
        .execute(&test_command(tenant, "sync-rcp-100", "RCP-100"))
        .await
        .unwrap();
    let second = usecase
        .execute(&test_command(tenant, "sync-rcp-100", "RCP-999"))
        .await
        .unwrap();

    assert_eq!(first.saga_id, second.saga_id);
    assert_eq!(store.get(first.saga_id).payload["recipe"]["recipe_code"], "RCP-100");
}

#[tokio::test]
async fn should_return_existing_entry_in_its_current_state() {
    let store = MemoryOutboxStore::new();
    let usecase = EnqueueRecipeSyncUseCase {
        store: store.clone(),
    };
    let command = test_command(Uuid::new_v4(), "sync-rcp-100", "RCP-100");

    let first = usecase.execute(&command).await.unwrap();
    store.update(first.saga_id, |r| {
        r.status = OutboxStatus::Dead;
        r.attempts = 5;
    });

    let again = usecase.execute(&command).await.unwrap();
    assert_eq!(again.saga_id, first.saga_id);
    assert_eq!(again.status, OutboxStatus::Dead);
    assert_eq!(again.attempts, 5);
}

#[tokio::test]
async fn should_scope_idempotency_keys_per_tenant() {
    let store = MemoryOutboxStore::new();
    let usecase = EnqueueRecipeSyncUseCase {
        store: store.clone(),
    };

    let a = usecase
        .execute(&test_command(Uuid::new_v4(), "sync-rcp-100", "RCP-100"))
        .await
        .unwrap();
    let b = usecase
        .execute(&test_command(Uuid::new_v4(), "sync-rcp-100", "RCP-100"))
        .await
        .unwrap();

    assert_ne!(a.saga_id, b.saga_id);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn should_reject_blank_idempotency_key() {
    let store = MemoryOutboxStore::new();
    let usecase = EnqueueRecipeSyncUseCase {
        store: store.clone(),
    };

    let result = usecase
        .execute(&test_command(Uuid::new_v4(), "", "RCP-100"))
        .await;

    assert!(
        matches!(result, Err(ErpSyncError::InvalidCommand(_))),
        "expected InvalidCommand, got {result:?}"
    );
    assert_eq!(store.len(), 0);
}
