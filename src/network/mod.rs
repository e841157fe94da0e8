//! Oracle network client interface.
//!
//! The orchestrator only ever talks to the network through this trait: one
//! call to post a data request and three read-only calls that observe its
//! path to finality. The reqwest-backed implementation lives in [`rest`];
//! tests substitute scripted fakes.

pub mod rest;

pub use rest::GatewayClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{QueryError, SubmitError};

/// Everything the network needs to execute one chunk as a data request.
#[derive(Debug, Clone, Serialize)]
pub struct RequestDescriptor {
    /// Oracle program executing the query.
    pub program_id: String,
    /// Comma-joined asset list handed to the program as input.
    pub encoded_input: String,
    /// Consensus method requested for the result.
    pub consensus_method: String,
    /// Unique per submission so identical asset lists stay distinguishable.
    pub memo: String,
    pub gas_price: u128,
    /// Signing-identity sequence number this submission was issued under.
    pub sequence: u64,
}

/// What the network returned for an accepted submission.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionReceipt {
    pub request_id: String,
    /// Height the request was included at; absent while still pending.
    pub height: Option<u64>,
}

/// A request's batch assignment, once consensus has processed it.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentRecord {
    pub batch_number: u64,
}

/// A batch record with its attestation progress.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchRecord {
    pub batch_number: u64,
    pub block_height: u64,
    /// Validator signatures accumulated so far; zero means the batch exists
    /// but is not yet final from this client's point of view.
    pub signature_count: usize,
}

/// Decoded execution outcome of a finalized request.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionResult {
    pub exit_code: u32,
    /// Raw program output; may be hex-encoded JSON, plain JSON, or an
    /// opaque string.
    pub payload: String,
}

/// The submission and chain-query surface the pull pipeline consumes.
#[async_trait]
pub trait OracleNetworkClient: Send + Sync + 'static {
    /// Post one data request. Exactly one network call per invocation;
    /// retrying is the submitter's job.
    async fn submit(&self, descriptor: &RequestDescriptor)
        -> Result<SubmissionReceipt, SubmitError>;

    /// Fetch the batch assignment for a request id. `Ok(None)` means the
    /// request has not been assigned yet, which is not an error.
    async fn query_assignment(
        &self,
        request_id: &str,
        height: u64,
    ) -> Result<Option<AssignmentRecord>, QueryError>;

    /// Fetch a batch by number. `Ok(None)` means the batch has not formed.
    async fn query_batch(&self, batch_number: u64) -> Result<Option<BatchRecord>, QueryError>;

    /// Fetch the decoded execution result, polling internally up to
    /// `timeout`. Fails with [`QueryError::ResultTimeout`] when the result
    /// is still unavailable at the deadline.
    async fn await_result(
        &self,
        request_id: &str,
        height: u64,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<ExecutionResult, QueryError>;
}
