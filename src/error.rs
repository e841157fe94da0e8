//! Error taxonomy for the pull pipeline.
//!
//! Submission and chain-query failures are kept as separate types because
//! they are handled differently: submission errors are retried with backoff
//! and then downgraded to a failed handle, while query errors terminate a
//! single request's resolution without touching its siblings.

use thiserror::Error;

/// An asset token that is not `category:base`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid asset id '{0}': expected category:BASE")]
pub struct InvalidAssetId(pub String);

/// The chunk planner rejected its input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("asset list is empty")]
    EmptyAssetList,
    #[error("gas per asset must be nonzero")]
    ZeroGasPerAsset,
}

/// The network/signing layer rejected or failed to post a request.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("submission rejected: {0}")]
    Rejected(String),
    #[error("network error: {0}")]
    Network(String),
}

/// A chain-query call failed.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    /// The execution-result fetch ran out its own poll budget. Transient:
    /// the resolution loop retries rather than failing the request.
    #[error("timed out waiting for execution result")]
    ResultTimeout,
}

/// The execution payload could not be turned into price entries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("invalid hex payload: {0}")]
    InvalidHex(String),
    #[error("payload is not valid UTF-8")]
    InvalidUtf8,
}
