use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use erp_sync_domain::RecipeSyncResult;

/// Lifecycle of an outbox saga. `Completed` and `Dead` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxStatus {
    Pending,
    InProgress,
    Completed,
    Dead,
}

impl OutboxStatus {
    pub const ALL: [OutboxStatus; 4] = [
        OutboxStatus::Pending,
        OutboxStatus::InProgress,
        OutboxStatus::Completed,
        OutboxStatus::Dead,
    ];

    /// Tag stored in the `status` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Dead => "dead",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Dead)
    }
}

impl fmt::Display for OutboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown outbox status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OutboxStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_owned()))
    }
}

/// Full stored outbox row.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboxRecord {
    pub id: Uuid,
    pub saga_id: Uuid,
    pub tenant_id: Uuid,
    pub idempotency_key: String,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub status: OutboxStatus,
    pub attempts: u32,
    pub next_run_at: DateTime<Utc>,
    pub last_error: Option<String>,
    pub result_payload: Option<serde_json::Value>,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OutboxRecord {
    pub fn entry(&self) -> OutboxEntry {
        OutboxEntry {
            saga_id: self.saga_id,
            tenant_id: self.tenant_id,
            idempotency_key: self.idempotency_key.clone(),
            status: self.status,
            attempts: self.attempts,
            next_run_at: self.next_run_at,
            last_error: self.last_error.clone(),
            event_type: self.event_type.clone(),
        }
    }

    /// Stored sync result; present only once the saga has completed.
    pub fn result(&self) -> Result<Option<RecipeSyncResult>, serde_json::Error> {
        match (&self.status, &self.result_payload) {
            (OutboxStatus::Completed, Some(payload)) => {
                serde_json::from_value(payload.clone()).map(Some)
            }
            _ => Ok(None),
        }
    }
}

/// Caller-facing projection of an outbox row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboxEntry {
    pub saga_id: Uuid,
    pub tenant_id: Uuid,
    pub idempotency_key: String,
    pub status: OutboxStatus,
    pub attempts: u32,
    #[serde(serialize_with = "erp_sync_core::serde::to_rfc3339_ms")]
    pub next_run_at: DateTime<Utc>,
    pub last_error: Option<String>,
    pub event_type: String,
}

/// Row written at admission: pending, zero attempts, due immediately.
#[derive(Debug, Clone)]
pub struct NewOutboxEntry {
    pub id: Uuid,
    pub saga_id: Uuid,
    pub tenant_id: Uuid,
    pub idempotency_key: String,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Result of an idempotent insert.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Created(OutboxRecord),
    /// `(tenant_id, idempotency_key)` was already taken; this is the surviving row.
    Existing(OutboxRecord),
}

impl Admission {
    pub fn into_record(self) -> OutboxRecord {
        match self {
            Self::Created(record) | Self::Existing(record) => record,
        }
    }
}

/// Effect of one dispatch attempt, written back to a claimed row.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub status: OutboxStatus,
    pub next_run_at: DateTime<Utc>,
    pub last_error: Option<String>,
    pub result: Option<RecipeSyncResult>,
    pub processed_at: DateTime<Utc>,
}

impl Transition {
    pub fn completed(result: RecipeSyncResult) -> Self {
        Self {
            status: OutboxStatus::Completed,
            next_run_at: result.processed_at,
            last_error: None,
            processed_at: result.processed_at,
            result: Some(result),
        }
    }

    pub fn dead(error: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            status: OutboxStatus::Dead,
            next_run_at: now,
            last_error: Some(error.into()),
            result: None,
            processed_at: now,
        }
    }

    pub fn retry(error: impl Into<String>, now: DateTime<Utc>, next_run_at: DateTime<Utc>) -> Self {
        Self {
            status: OutboxStatus::Pending,
            next_run_at,
            last_error: Some(error.into()),
            result: None,
            processed_at: now,
        }
    }
}

/// Aggregated outcome of one `process_pending` round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessSummary {
    pub processed: usize,
    pub failed: usize,
    pub completed_ids: Vec<Uuid>,
    pub failed_ids: Vec<Uuid>,
}

impl ProcessSummary {
    pub fn record_success(&mut self, saga_id: Uuid) {
        self.processed += 1;
        self.completed_ids.push(saga_id);
    }

    pub fn record_failure(&mut self, saga_id: Uuid) {
        self.failed += 1;
        self.failed_ids.push(saga_id);
    }

    pub fn is_empty(&self) -> bool {
        self.processed == 0 && self.failed == 0
    }
}

/// Column width of `idempotency_key`.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;
