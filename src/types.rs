//! Core types used throughout PricePull
//!
//! Asset identifiers, gas-bounded chunks, pending request handles and the
//! session report returned by the orchestrator.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::error::InvalidAssetId;

/// Request id placed on a handle whose submission exhausted all retries.
pub const FAILED_REQUEST_ID: &str = "failed";

/// A requested asset identifier: a category prefix plus a ticker base.
///
/// Written as `category:BASE`, or `category:BASE:QUOTE` for pairs — the
/// category is everything before the first colon, the base is the rest
/// joined back with colons (e.g. `cfd:XAU:USD` has base `XAU:USD`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetId {
    category: String,
    base: String,
}

impl AssetId {
    pub fn new(category: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            base: base.into(),
        }
    }

    /// Parse a `category:base` token.
    pub fn parse(raw: &str) -> Result<Self, InvalidAssetId> {
        match raw.split_once(':') {
            Some((category, base)) if !category.is_empty() && !base.is_empty() => {
                Ok(Self::new(category, base))
            }
            _ => Err(InvalidAssetId(raw.to_string())),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn base(&self) -> &str {
        &self.base
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.base)
    }
}

impl Serialize for AssetId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AssetId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        AssetId::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// An ordered, gas-bounded sublist of the requested assets.
///
/// Concatenating all chunks of a plan, in order, reconstructs the original
/// request list exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of this chunk within the plan.
    pub index: usize,
    pub assets: Vec<AssetId>,
    /// Gas this chunk is expected to burn.
    pub estimated_gas: u128,
    /// Estimated cost in network token units (gas * price, 1e9 scaled).
    pub estimated_cost: u128,
}

impl Chunk {
    /// Comma-joined asset list, the oracle program's input encoding.
    pub fn encoded_input(&self) -> String {
        self.assets
            .iter()
            .map(AssetId::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Outcome of one chunk submission, successful or not.
///
/// A chunk that exhausted its submission retries still produces a handle
/// (with the `failed` sentinel id) so the session report accounts for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingRequestHandle {
    pub request_id: String,
    /// Height the submission landed at, if the network reported one.
    pub submission_height: Option<u64>,
    pub chunk: Chunk,
    /// Last submission error when the chunk could not be posted.
    pub error: Option<String>,
}

impl PendingRequestHandle {
    pub fn accepted(request_id: String, submission_height: Option<u64>, chunk: Chunk) -> Self {
        Self {
            request_id,
            submission_height,
            chunk,
            error: None,
        }
    }

    pub fn failed(chunk: Chunk, error: String) -> Self {
        Self {
            request_id: FAILED_REQUEST_ID.to_string(),
            submission_height: None,
            chunk,
            error: Some(error),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// One finalized price, keyed by the canonical asset id when the raw symbol
/// normalized, or by the raw symbol itself when it did not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceResult {
    pub symbol: String,
    pub price: Decimal,
}

/// Terminal status of one request's resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestStatus {
    /// Finality reached and the payload decoded.
    Resolved { result_count: usize },
    /// Finality reached but the payload held zero results.
    ResolvedEmpty,
    /// Submission retries exhausted; the request never reached the network.
    SubmitFailed { error: String },
    /// No batch assignment appeared within the polling budget.
    NotFoundTimeout,
    /// The batch formed but never accumulated a signature in time.
    BatchUnsignedTimeout,
    /// The oracle program itself exited nonzero.
    ExecutionFailed { exit_code: u32 },
    /// Unexpected failure from the chain-query layer, or session deadline.
    Error { message: String },
}

impl RequestStatus {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            RequestStatus::Resolved { .. } | RequestStatus::ResolvedEmpty
        )
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestStatus::Resolved { result_count } => {
                write!(f, "resolved ({} results)", result_count)
            }
            RequestStatus::ResolvedEmpty => write!(f, "resolved (empty)"),
            RequestStatus::SubmitFailed { error } => write!(f, "submit failed: {}", error),
            RequestStatus::NotFoundTimeout => write!(f, "not found before timeout"),
            RequestStatus::BatchUnsignedTimeout => write!(f, "batch unsigned before timeout"),
            RequestStatus::ExecutionFailed { exit_code } => {
                write!(f, "program exited with code {}", exit_code)
            }
            RequestStatus::Error { message } => write!(f, "error: {}", message),
        }
    }
}

/// Per-request entry in the session report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestReport {
    pub request_id: String,
    pub submission_height: Option<u64>,
    pub assets: Vec<AssetId>,
    pub status: RequestStatus,
    /// Raw payload preserved when it could not be decoded into prices.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_result: Option<String>,
}

/// Everything one `pull_prices` call produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub requested_assets: Vec<AssetId>,
    pub requests: Vec<RequestReport>,
    /// Aggregate symbol → price map merged across all resolved requests.
    pub prices: BTreeMap<String, PriceResult>,
}

impl SessionReport {
    /// Number of requests that reached a successful terminal state.
    pub fn resolved_count(&self) -> usize {
        self.requests
            .iter()
            .filter(|r| r.status.is_success())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_id_parses_category_and_base() {
        let id = AssetId::parse("equity:AAPL").unwrap();
        assert_eq!(id.category(), "equity");
        assert_eq!(id.base(), "AAPL");
        assert_eq!(id.to_string(), "equity:AAPL");
    }

    #[test]
    fn asset_id_keeps_multi_part_base_intact() {
        let id = AssetId::parse("cfd:XAU:USD").unwrap();
        assert_eq!(id.category(), "cfd");
        assert_eq!(id.base(), "XAU:USD");
        assert_eq!(id.to_string(), "cfd:XAU:USD");
    }

    #[test]
    fn asset_id_rejects_missing_parts() {
        assert!(AssetId::parse("AAPL").is_err());
        assert!(AssetId::parse(":AAPL").is_err());
        assert!(AssetId::parse("equity:").is_err());
        assert!(AssetId::parse("").is_err());
    }

    #[test]
    fn chunk_encodes_input_comma_joined() {
        let chunk = Chunk {
            index: 0,
            assets: vec![
                AssetId::parse("equity:AAPL").unwrap(),
                AssetId::parse("fx:EUR").unwrap(),
            ],
            estimated_gas: 0,
            estimated_cost: 0,
        };
        assert_eq!(chunk.encoded_input(), "equity:AAPL,fx:EUR");
    }

    #[test]
    fn failed_handle_carries_sentinel_id() {
        let chunk = Chunk {
            index: 0,
            assets: vec![AssetId::parse("fx:EUR").unwrap()],
            estimated_gas: 0,
            estimated_cost: 0,
        };
        let handle = PendingRequestHandle::failed(chunk, "boom".to_string());
        assert!(handle.is_failed());
        assert_eq!(handle.request_id, FAILED_REQUEST_ID);
    }
}
