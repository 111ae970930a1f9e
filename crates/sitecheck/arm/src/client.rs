//! Replicated item lookup over the management REST API.

use async_trait::async_trait;
use serde_json::Value;
use sitecheck_types::CompoundRemoteKey;
use sitecheck_verify::{LookupError, LookupOutcome, RemoteLookup};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::config::ArmConfig;
use crate::error::ArmResult;
use crate::token::TokenProvider;

/// [`RemoteLookup`] backed by `GET` on the replication migration item.
pub struct ArmLookup {
    config: ArmConfig,
    client: reqwest::Client,
    token: Arc<dyn TokenProvider>,
}

impl ArmLookup {
    pub fn new(config: ArmConfig, token: Arc<dyn TokenProvider>) -> ArmResult<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            config,
            client,
            token,
        })
    }

    pub fn config(&self) -> &ArmConfig {
        &self.config
    }

    /// Full URL of the item `key` addresses.
    pub fn item_url(&self, key: &CompoundRemoteKey) -> String {
        format!(
            "{}/subscriptions/{}/resourceGroups/{}/providers/Microsoft.RecoveryServices/vaults/{}/replicationFabrics/{}/replicationProtectionContainers/{}/replicationMigrationItems/{}?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.subscription_id,
            key.resource_group,
            key.vault,
            key.fabric,
            key.protection_container,
            key.name,
            self.config.api_version,
        )
    }
}

#[async_trait]
impl RemoteLookup for ArmLookup {
    #[instrument(skip(self, key), fields(key = %key))]
    async fn lookup(&self, key: &CompoundRemoteKey) -> Result<LookupOutcome, LookupError> {
        let token = self
            .token
            .token()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        let url = self.item_url(key);
        debug!(url, "ARM GET");

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status().as_u16();
        let body = match resp.bytes().await {
            Ok(bytes) => decode_body(&bytes),
            Err(e) => Err(format!("failed to read response body: {e}")),
        };
        debug!(status, decoded = body.is_ok(), "ARM response");

        classify(status, body)
    }

    fn name(&self) -> &str {
        "arm"
    }
}

impl ArmLookup {
    fn transport_error(&self, err: reqwest::Error) -> LookupError {
        if err.is_timeout() {
            LookupError::Timeout {
                timeout_ms: self.config.request_timeout.as_millis() as u64,
            }
        } else {
            LookupError::Transport(err.to_string())
        }
    }
}

/// Map a response onto a lookup answer. 404 is a definitive not-found;
/// any other non-success status is an error, and so is a success whose body
/// could not be read or decoded.
pub fn classify(status: u16, body: Result<Value, String>) -> Result<LookupOutcome, LookupError> {
    match (status, body) {
        (404, _) => Ok(LookupOutcome::NotFound),
        (200..=299, Ok(body)) => Ok(LookupOutcome::Found(body)),
        (200..=299, Err(reason)) => Err(LookupError::Protocol {
            status,
            body: reason,
        }),
        (_, body) => Err(LookupError::Protocol {
            status,
            body: parse_arm_error(&body.unwrap_or(Value::Null)),
        }),
    }
}

fn decode_body(bytes: &[u8]) -> Result<Value, String> {
    serde_json::from_slice(bytes).map_err(|e| format!("invalid response body: {e}"))
}

/// `code: message` from an ARM error envelope.
pub fn parse_arm_error(body: &Value) -> String {
    let err = body
        .get("error")
        .or_else(|| body.get("Error"))
        .unwrap_or(body);
    let code = err["code"].as_str().unwrap_or("Unknown");
    let message = err["message"].as_str().unwrap_or("unknown error");
    format!("{code}: {message}")
}
