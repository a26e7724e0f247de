use std::time::Duration;

use anyhow::{Context as _, bail};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use uuid::Uuid;

use erp_sync_domain::RecipeSyncCommand;

use crate::domain::repository::{GatewayError, InventoryGateway};

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Inventory ERP adapter speaking JSON over HTTP.
///
/// `PUT {base_url}/tenants/{tenant_id}/recipes/{recipe_code}` with the command
/// as body. The caller's idempotency key travels in `Idempotency-Key` so the
/// ERP can collapse a redelivery after a lost response.
#[derive(Clone)]
pub struct HttpInventoryGateway {
    client: reqwest::Client,
    base_url: Url,
    api_token: Option<String>,
}

#[derive(Deserialize)]
struct UpsertResponse {
    #[serde(default)]
    external_id: Option<String>,
}

impl HttpInventoryGateway {
    pub fn new(
        base_url: &str,
        api_token: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url).with_context(|| format!("parse ERP url {base_url}"))?;
        if base_url.cannot_be_a_base() {
            bail!("ERP url {base_url} cannot carry a path");
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build ERP http client")?;
        Ok(Self {
            client,
            base_url,
            api_token,
        })
    }

    pub fn recipe_url(&self, tenant_id: Uuid, recipe_code: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["tenants", &tenant_id.to_string(), "recipes", recipe_code]);
        }
        url
    }
}

impl InventoryGateway for HttpInventoryGateway {
    async fn apply(
        &self,
        tenant_id: Uuid,
        command: &RecipeSyncCommand,
    ) -> Result<Option<String>, GatewayError> {
        let url = self.recipe_url(tenant_id, &command.recipe.recipe_code);
        let mut request = self
            .client
            .put(url)
            .header(IDEMPOTENCY_KEY_HEADER, &command.idempotency_key)
            .json(command);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Transient(format!("ERP request failed: {e}")))?;
        let status = response.status();

        if status.is_success() {
            let body = response
                .bytes()
                .await
                .map_err(|e| GatewayError::Transient(format!("ERP response interrupted: {e}")))?;
            if body.is_empty() {
                return Ok(None);
            }
            // The upsert was applied; an unreadable acknowledgement must not trigger a resend.
            return match serde_json::from_slice::<UpsertResponse>(&body) {
                Ok(parsed) => Ok(parsed.external_id),
                Err(err) => {
                    tracing::warn!(%tenant_id, error = %err, "unreadable ERP acknowledgement");
                    Ok(None)
                }
            };
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status, body.trim()))
    }
}

/// Map a non-success ERP response onto the retry taxonomy.
///
/// Server errors and throttling/timeouts are transient; any other client error
/// is a permanent rejection of the command.
pub fn classify_failure(status: StatusCode, body: &str) -> GatewayError {
    let message = if body.is_empty() {
        format!("ERP responded {status}")
    } else {
        format!("ERP responded {status}: {body}")
    };
    let transient = status.is_server_error()
        || matches!(
            status,
            StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS
        );
    if transient {
        GatewayError::Transient(message)
    } else {
        GatewayError::Fatal(message)
    }
}
