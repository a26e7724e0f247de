use serde::Deserialize;

use erp_sync_core::config::Config;
use erp_sync_core::tracing::LogFormat;

use crate::domain::policy::{
    DEFAULT_BACKOFF_SECS, DEFAULT_MAX_ATTEMPTS, InvalidRetryPolicy, RetryPolicy,
};

/// ERP sync service configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ErpSyncConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Base URL of the inventory ERP API.
    pub erp_base_url: String,
    /// Bearer token sent to the ERP, if it requires one.
    #[serde(default)]
    pub erp_api_token: Option<String>,
    /// Per-request timeout towards the ERP (default 30).
    #[serde(default = "default_timeout_secs")]
    pub erp_timeout_secs: u64,
    /// TCP port for the monitoring HTTP server (default 3120). Env var: `ERP_SYNC_PORT`.
    #[serde(default = "default_port")]
    pub erp_sync_port: u16,
    /// Sagas claimed per processing round (default 10).
    #[serde(default = "default_batch_size")]
    pub erp_sync_batch_size: u64,
    #[serde(default = "default_poll_interval_secs")]
    pub erp_sync_poll_interval_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub erp_sync_max_attempts: u32,
    /// Comma-separated, e.g. `30,120,600,1800,3600`.
    #[serde(default = "default_backoff_secs")]
    pub erp_sync_backoff_secs: Vec<u64>,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Config for ErpSyncConfig {}

impl ErpSyncConfig {
    pub fn retry_policy(&self) -> Result<RetryPolicy, InvalidRetryPolicy> {
        RetryPolicy::from_secs(self.erp_sync_max_attempts, &self.erp_sync_backoff_secs)
    }

    pub fn erp_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.erp_timeout_secs)
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.erp_sync_poll_interval_secs.max(1))
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_port() -> u16 {
    3120
}

fn default_batch_size() -> u64 {
    10
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_backoff_secs() -> Vec<u64> {
    DEFAULT_BACKOFF_SECS.to_vec()
}
