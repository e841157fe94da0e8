//! Per-request resolution state machine.
//!
//! After a data request is posted, its result only becomes observable in
//! stages: the request gets assigned to a batch, the batch forms on chain,
//! validators sign it, and finally the execution result can be fetched and
//! decoded. This machine drives one pending handle through those phases by
//! polling the chain-query client at a fixed interval.
//!
//! Phases move strictly forward:
//!
//! ```text
//! Submitted -> AssignmentKnown -> BatchFound -> BatchSigned -> Resolved
//! ```
//!
//! Polls that make no progress count against a bounded budget; polls that
//! advance a phase do not, so an assignment that appears on the last allowed
//! attempt still gets its batch and result fetched. The machine only reads
//! chain state, so cancelling it (dropping the future at any await point)
//! leaves nothing to roll back.

pub mod payload;

use std::sync::Arc;
use std::time::Duration;

use crate::error::QueryError;
use crate::network::{BatchRecord, OracleNetworkClient};
use crate::resolution::payload::{DecodedPayload, PriceEntry};
use crate::types::{PendingRequestHandle, RequestStatus};

/// Where a request currently sits on its way to finality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPhase {
    Submitted,
    AssignmentKnown,
    BatchFound,
    BatchSigned,
    Resolved,
}

impl std::fmt::Display for ResolutionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResolutionPhase::Submitted => "submitted",
            ResolutionPhase::AssignmentKnown => "assignment_known",
            ResolutionPhase::BatchFound => "batch_found",
            ResolutionPhase::BatchSigned => "batch_signed",
            ResolutionPhase::Resolved => "resolved",
        };
        f.write_str(name)
    }
}

/// Terminal output of one machine run.
#[derive(Debug, Clone)]
pub struct ResolutionOutcome {
    pub status: RequestStatus,
    /// Price entries decoded from the payload, when any.
    pub entries: Vec<PriceEntry>,
    /// Raw payload preserved when it did not decode into prices.
    pub raw_result: Option<String>,
}

impl ResolutionOutcome {
    fn of(status: RequestStatus) -> Self {
        Self {
            status,
            entries: Vec::new(),
            raw_result: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub poll_interval: Duration,
    /// Idle (no-progress) polls allowed before giving up.
    pub max_poll_attempts: u32,
    /// Budget for the heavier execution-result fetch.
    pub result_timeout: Duration,
}

enum Step {
    /// Phase advanced; poll again immediately.
    Progressed,
    /// Nothing new on chain; counts against the attempt budget.
    Pending,
    Terminal(ResolutionOutcome),
}

pub struct ResolutionStateMachine<C> {
    client: Arc<C>,
    handle: PendingRequestHandle,
    settings: ResolverSettings,
    phase: ResolutionPhase,
    batch_number: Option<u64>,
}

impl<C: OracleNetworkClient> ResolutionStateMachine<C> {
    pub fn new(client: Arc<C>, handle: PendingRequestHandle, settings: ResolverSettings) -> Self {
        Self {
            client,
            handle,
            settings,
            phase: ResolutionPhase::Submitted,
            batch_number: None,
        }
    }

    /// Drive the request to a terminal state.
    pub async fn resolve(mut self) -> ResolutionOutcome {
        let request_id = self.handle.request_id.clone();
        let mut idle_polls: u32 = 0;

        loop {
            let step = match self.advance().await {
                Ok(step) => step,
                Err(e) => {
                    tracing::error!(
                        request_id = %request_id,
                        phase = %self.phase,
                        error = %e,
                        "chain query failed during resolution"
                    );
                    return ResolutionOutcome::of(RequestStatus::Error {
                        message: e.to_string(),
                    });
                }
            };

            match step {
                Step::Terminal(outcome) => {
                    tracing::info!(
                        request_id = %request_id,
                        status = %outcome.status,
                        "resolution finished"
                    );
                    return outcome;
                }
                Step::Progressed => {
                    tracing::debug!(
                        request_id = %request_id,
                        phase = %self.phase,
                        "resolution advanced"
                    );
                }
                Step::Pending => {
                    idle_polls += 1;
                    tracing::debug!(
                        request_id = %request_id,
                        phase = %self.phase,
                        idle_polls,
                        max = self.settings.max_poll_attempts,
                        "still waiting"
                    );
                    if idle_polls >= self.settings.max_poll_attempts {
                        return ResolutionOutcome::of(self.timeout_status());
                    }
                    tokio::time::sleep(self.settings.poll_interval).await;
                }
            }
        }
    }

    /// One poll cycle: query the chain for whatever the current phase is
    /// waiting on and advance if it appeared.
    async fn advance(&mut self) -> Result<Step, QueryError> {
        match self.phase {
            ResolutionPhase::Submitted => {
                let height = self.handle.submission_height.unwrap_or(0);
                match self
                    .client
                    .query_assignment(&self.handle.request_id, height)
                    .await?
                {
                    Some(assignment) => {
                        self.batch_number = Some(assignment.batch_number);
                        self.phase = ResolutionPhase::AssignmentKnown;
                        Ok(Step::Progressed)
                    }
                    None => Ok(Step::Pending),
                }
            }
            ResolutionPhase::AssignmentKnown => match self.fetch_batch().await? {
                Some(batch) => {
                    tracing::debug!(
                        request_id = %self.handle.request_id,
                        batch = batch.batch_number,
                        block_height = batch.block_height,
                        signatures = batch.signature_count,
                        "batch found"
                    );
                    self.phase = ResolutionPhase::BatchFound;
                    if batch.signature_count > 0 {
                        self.phase = ResolutionPhase::BatchSigned;
                    }
                    Ok(Step::Progressed)
                }
                None => Ok(Step::Pending),
            },
            ResolutionPhase::BatchFound => match self.fetch_batch().await? {
                Some(batch) if batch.signature_count > 0 => {
                    self.phase = ResolutionPhase::BatchSigned;
                    Ok(Step::Progressed)
                }
                // Exists but unsigned, or briefly unobservable: keep waiting.
                _ => Ok(Step::Pending),
            },
            ResolutionPhase::BatchSigned => self.fetch_result().await,
            ResolutionPhase::Resolved => unreachable!("resolved is terminal"),
        }
    }

    async fn fetch_batch(&self) -> Result<Option<BatchRecord>, QueryError> {
        let batch_number = self
            .batch_number
            .expect("batch number is set before batch phases");
        self.client.query_batch(batch_number).await
    }

    /// The heavier call: fetch and decode the execution result. Its own
    /// timeout is transient — the outer loop retries it.
    async fn fetch_result(&mut self) -> Result<Step, QueryError> {
        let height = self.handle.submission_height.unwrap_or(0);
        let result = match self
            .client
            .await_result(
                &self.handle.request_id,
                height,
                self.settings.result_timeout,
                self.settings.poll_interval,
            )
            .await
        {
            Ok(result) => result,
            Err(QueryError::ResultTimeout) => return Ok(Step::Pending),
            Err(e) => return Err(e),
        };

        // Exit code first: a nonzero program exit is a hard failure for
        // this request regardless of chain-level finality.
        if result.exit_code != 0 {
            return Ok(Step::Terminal(ResolutionOutcome::of(
                RequestStatus::ExecutionFailed {
                    exit_code: result.exit_code,
                },
            )));
        }

        self.phase = ResolutionPhase::Resolved;
        let outcome = match payload::decode(&result.payload) {
            Ok(DecodedPayload::Prices(entries)) => ResolutionOutcome {
                status: RequestStatus::Resolved {
                    result_count: entries.len(),
                },
                entries,
                raw_result: None,
            },
            Ok(DecodedPayload::Empty) => ResolutionOutcome::of(RequestStatus::ResolvedEmpty),
            Ok(DecodedPayload::Opaque(text)) => ResolutionOutcome {
                status: RequestStatus::Resolved { result_count: 0 },
                entries: Vec::new(),
                raw_result: Some(text),
            },
            Err(e) => {
                // Decode failures are non-fatal; the raw payload is kept.
                tracing::warn!(
                    request_id = %self.handle.request_id,
                    error = %e,
                    "payload decode failed, surfacing raw result"
                );
                ResolutionOutcome {
                    status: RequestStatus::Resolved { result_count: 0 },
                    entries: Vec::new(),
                    raw_result: Some(result.payload),
                }
            }
        };
        Ok(Step::Terminal(outcome))
    }

    fn timeout_status(&self) -> RequestStatus {
        match self.phase {
            ResolutionPhase::Submitted => RequestStatus::NotFoundTimeout,
            ResolutionPhase::BatchFound => RequestStatus::BatchUnsignedTimeout,
            phase => RequestStatus::Error {
                message: format!("resolution timed out in phase {}", phase),
            },
        }
    }
}
