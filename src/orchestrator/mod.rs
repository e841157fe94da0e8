//! Session orchestration: plan, submit, resolve, aggregate.
//!
//! One `pull_prices` call is one session. Chunks are submitted strictly in
//! order under a single sequence manager (the one place serialization is
//! required); resolution then fans out to one independent task per accepted
//! handle, and completions stream back over a channel where the aggregate
//! map is updated. A session deadline turns still-running handles into
//! per-handle errors instead of failing the pull.

use anyhow::{bail, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use uuid::Uuid;

use crate::aggregator::ResultAggregator;
use crate::config::PullConfig;
use crate::network::OracleNetworkClient;
use crate::planner;
use crate::resolution::{ResolutionStateMachine, ResolverSettings};
use crate::sequence::SequenceManager;
use crate::submitter::{RequestSubmitter, SubmitterSettings};
use crate::types::{AssetId, RequestReport, RequestStatus, SessionReport};

pub struct Orchestrator<C> {
    client: Arc<C>,
    config: PullConfig,
}

impl<C: OracleNetworkClient> Orchestrator<C> {
    pub fn new(client: Arc<C>, config: PullConfig) -> Self {
        Self { client, config }
    }

    /// Run one full pull session for the requested assets.
    ///
    /// Returns a report covering every chunk, including ones that failed to
    /// submit or resolve; partial success is a normal return.
    pub async fn pull_prices(&self, requested: Vec<AssetId>) -> Result<SessionReport> {
        if requested.is_empty() {
            bail!("no assets requested");
        }

        let session_id = Uuid::new_v4();
        let deadline = Instant::now() + self.config.resolve.session_deadline();
        tracing::info!(
            session = %session_id,
            assets = requested.len(),
            "starting price pull"
        );

        let chunks = planner::plan(&requested, &self.config.gas)?;
        let total_cost: u128 = chunks.iter().map(|c| c.estimated_cost).sum();
        tracing::info!(
            session = %session_id,
            chunks = chunks.len(),
            total_estimated_cost = total_cost,
            "chunk plan ready"
        );

        // Submission is strictly sequential per signing identity.
        let sequences = Arc::new(SequenceManager::new());
        let submitter = RequestSubmitter::new(
            self.client.clone(),
            sequences.clone(),
            SubmitterSettings {
                program_id: self.config.network.program_id.clone(),
                gas_price: self.config.gas.price as u128,
                max_retries: self.config.submit.max_retries,
                backoff_base: self.config.submit.backoff_base(),
            },
        );

        let chunk_count = chunks.len();
        let mut handles = Vec::with_capacity(chunk_count);
        for chunk in &chunks {
            handles.push(submitter.submit(chunk).await);
            // Spacing out submissions reduces sequence contention at the
            // network layer; no pause needed after the last chunk.
            if chunk.index + 1 < chunk_count {
                tokio::time::sleep(self.config.submit.inter_submit_delay()).await;
            }
        }

        // Fan out: one independent resolution task per accepted handle.
        let resolver_settings = ResolverSettings {
            poll_interval: self.config.resolve.poll_interval(),
            max_poll_attempts: self.config.resolve.max_poll_attempts,
            result_timeout: self.config.resolve.result_timeout(),
        };

        let mut statuses: Vec<Option<RequestStatus>> = Vec::with_capacity(handles.len());
        let mut raw_results: Vec<Option<String>> = vec![None; handles.len()];
        let (tx, mut rx) = mpsc::channel(handles.len().max(1));
        let mut pending = 0usize;

        for (idx, handle) in handles.iter().enumerate() {
            if let Some(error) = &handle.error {
                statuses.push(Some(RequestStatus::SubmitFailed {
                    error: error.clone(),
                }));
                continue;
            }
            statuses.push(None);
            pending += 1;

            let machine = ResolutionStateMachine::new(
                self.client.clone(),
                handle.clone(),
                resolver_settings.clone(),
            );
            let tx = tx.clone();
            tokio::spawn(async move {
                let outcome = machine.resolve().await;
                // Receiver may be gone if the session deadline fired.
                let _ = tx.send((idx, outcome)).await;
            });
        }
        drop(tx);

        // Streaming merge: completions arrive in any order; only this loop
        // touches the aggregate map.
        let mut aggregator = ResultAggregator::new(requested.clone());
        while pending > 0 {
            match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(Some((idx, outcome))) => {
                    pending -= 1;
                    aggregator.merge(outcome.entries);
                    raw_results[idx] = outcome.raw_result;
                    statuses[idx] = Some(outcome.status);
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        session = %session_id,
                        unresolved = pending,
                        "session deadline reached with requests still pending"
                    );
                    break;
                }
            }
        }

        let requests: Vec<RequestReport> = handles
            .into_iter()
            .zip(statuses)
            .zip(raw_results)
            .map(|((handle, status), raw_result)| RequestReport {
                request_id: handle.request_id,
                submission_height: handle.submission_height,
                assets: handle.chunk.assets,
                status: status.unwrap_or(RequestStatus::Error {
                    message: "session deadline exceeded".to_string(),
                }),
                raw_result,
            })
            .collect();

        let report = SessionReport {
            session_id,
            requested_assets: requested,
            requests,
            prices: aggregator.into_prices(),
        };
        tracing::info!(
            session = %session_id,
            resolved = report.resolved_count(),
            total = report.requests.len(),
            prices = report.prices.len(),
            "price pull finished"
        );
        Ok(report)
    }
}
