//! Vault API response bodies

use cfgvault_secrets::{SecretRecord, SecureSecret};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

/// Envelope of a logical read (`GET /v1/<path>`, `vault read -format=json`).
#[derive(Debug, Default, Deserialize)]
pub(crate) struct LogicalResponse {
    #[serde(default)]
    lease_id: String,
    #[serde(default)]
    lease_duration: u64,
    #[serde(default)]
    data: Option<Map<String, Value>>,
}

impl LogicalResponse {
    /// Lease of the read.
    ///
    /// A positive duration is always a lease. Zero is an expired lease when
    /// Vault issued a lease id, and no lease at all otherwise (KV reads).
    pub(crate) fn lease(&self) -> Option<Duration> {
        match self.lease_duration {
            0 if self.lease_id.is_empty() => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Convert to a record, unwrapping KV v2 payloads.
    pub(crate) fn into_record(self) -> SecretRecord {
        let lease = self.lease();
        let data = self
            .data
            .map(unwrap_kv2)
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| (key, SecureSecret::from_json_value(value)))
            .collect();

        SecretRecord::new(data, lease)
    }
}

/// KV v2 nests the secret as `{"data": {...}, "metadata": {...}}`.
fn unwrap_kv2(mut data: Map<String, Value>) -> Map<String, Value> {
    let is_kv2 = data.len() == 2
        && data.get("metadata").is_some_and(Value::is_object)
        && data
            .get("data")
            .is_some_and(|inner| inner.is_object() || inner.is_null());

    if !is_kv2 {
        return data;
    }

    match data.remove("data") {
        Some(Value::Object(inner)) => inner,
        _ => Map::new(),
    }
}

/// Body of an error response
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<String>,
}

/// `GET /v1/auth/token/lookup-self`
#[derive(Debug, Deserialize)]
pub(crate) struct LookupResponse {
    pub data: TokenInfo,
}

/// Token properties reported by lookup-self
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenInfo {
    #[serde(default)]
    pub ttl: u64,
    #[serde(default)]
    pub renewable: bool,
}

/// `POST /v1/auth/token/renew-self`
#[derive(Debug, Deserialize)]
pub(crate) struct RenewResponse {
    pub auth: RenewedAuth,
}

/// Lease granted by a renewal; the client token itself is not kept
#[derive(Debug, Deserialize)]
pub(crate) struct RenewedAuth {
    #[serde(default)]
    pub lease_duration: u64,
}
