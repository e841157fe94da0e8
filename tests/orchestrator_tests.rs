//! End-to-end orchestrator tests against an in-process fake network.
//!
//! The fake scripts one behavior per chunk (keyed by the sequence number the
//! submitter issues), which lets each scenario mix healthy, failing and
//! stalled requests in a single session.

use async_trait::async_trait;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pricepull::config::{GasConfig, NetworkConfig, PullConfig, ResolveConfig, SubmitConfig};
use pricepull::error::{QueryError, SubmitError};
use pricepull::network::{
    AssignmentRecord, BatchRecord, ExecutionResult, OracleNetworkClient, RequestDescriptor,
    SubmissionReceipt,
};
use pricepull::orchestrator::Orchestrator;
use pricepull::types::{AssetId, RequestStatus};

/// Scripted behavior for the chunk submitted under a given sequence number.
#[derive(Clone)]
enum Behavior {
    /// Accept and resolve with this payload.
    Resolve(String),
    /// Reject every submission attempt.
    RejectSubmission,
    /// Accept but resolve with a nonzero program exit code.
    ExitCode(u32),
    /// Accept but never assign the request to a batch.
    NeverAssigned,
}

struct FakeNetwork {
    behaviors: Vec<Behavior>,
    submit_calls: AtomicU32,
}

impl FakeNetwork {
    fn new(behaviors: Vec<Behavior>) -> Arc<Self> {
        Arc::new(Self {
            behaviors,
            submit_calls: AtomicU32::new(0),
        })
    }

    fn behavior_for(&self, request_id: &str) -> Behavior {
        let idx: usize = request_id
            .strip_prefix("dr-")
            .and_then(|s| s.parse().ok())
            .expect("fake request id");
        self.behaviors[idx].clone()
    }
}

#[async_trait]
impl OracleNetworkClient for FakeNetwork {
    async fn submit(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<SubmissionReceipt, SubmitError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        match &self.behaviors[descriptor.sequence as usize] {
            Behavior::RejectSubmission => {
                Err(SubmitError::Rejected("account sequence mismatch".to_string()))
            }
            _ => Ok(SubmissionReceipt {
                request_id: format!("dr-{}", descriptor.sequence),
                height: Some(1000 + descriptor.sequence),
            }),
        }
    }

    async fn query_assignment(
        &self,
        request_id: &str,
        _height: u64,
    ) -> Result<Option<AssignmentRecord>, QueryError> {
        match self.behavior_for(request_id) {
            Behavior::NeverAssigned => Ok(None),
            _ => Ok(Some(AssignmentRecord { batch_number: 7 })),
        }
    }

    async fn query_batch(&self, batch_number: u64) -> Result<Option<BatchRecord>, QueryError> {
        Ok(Some(BatchRecord {
            batch_number,
            block_height: 5000,
            signature_count: 2,
        }))
    }

    async fn await_result(
        &self,
        request_id: &str,
        _height: u64,
        _timeout: Duration,
        _poll_interval: Duration,
    ) -> Result<ExecutionResult, QueryError> {
        match self.behavior_for(request_id) {
            Behavior::Resolve(payload) => Ok(ExecutionResult {
                exit_code: 0,
                payload,
            }),
            Behavior::ExitCode(code) => Ok(ExecutionResult {
                exit_code: code,
                payload: String::new(),
            }),
            _ => Err(QueryError::ResultTimeout),
        }
    }
}

/// Two assets per chunk, short delays, generous poll budget.
fn test_config() -> PullConfig {
    PullConfig {
        network: NetworkConfig {
            rpc_url: "http://fake".to_string(),
            program_id: "prog-1".to_string(),
        },
        gas: GasConfig {
            per_asset: 100,
            max_per_request: 200,
            price: 10_000,
        },
        submit: SubmitConfig {
            max_retries: 3,
            backoff_base_ms: 100,
            inter_submit_delay_ms: 100,
        },
        resolve: ResolveConfig {
            poll_interval_ms: 100,
            max_poll_attempts: 10,
            result_timeout_secs: 5,
            session_deadline_secs: 60,
        },
    }
}

fn ids(raw: &[&str]) -> Vec<AssetId> {
    raw.iter().map(|s| AssetId::parse(s).unwrap()).collect()
}

#[tokio::test(start_paused = true)]
async fn multi_chunk_pull_merges_all_results() {
    let network = FakeNetwork::new(vec![
        Behavior::Resolve(
            r#"[{"symbol":"AAPL","price":189.84},{"symbol":"MSFT","price":415.1}]"#.to_string(),
        ),
        Behavior::Resolve(r#"[{"symbol":"EUR/USD","price":"1.0842"}]"#.to_string()),
    ]);
    let orchestrator = Orchestrator::new(network.clone(), test_config());

    let report = orchestrator
        .pull_prices(ids(&["equity:AAPL", "equity:MSFT", "fx:EUR"]))
        .await
        .unwrap();

    assert_eq!(report.requests.len(), 2);
    assert_eq!(report.requests[0].assets, ids(&["equity:AAPL", "equity:MSFT"]));
    assert_eq!(report.requests[1].assets, ids(&["fx:EUR"]));
    assert!(report.requests.iter().all(|r| r.status.is_success()));

    assert_eq!(report.prices.len(), 3);
    assert_eq!(report.prices["equity:AAPL"].price, dec!(189.84));
    assert_eq!(report.prices["equity:MSFT"].price, dec!(415.1));
    assert_eq!(report.prices["fx:EUR"].price, dec!(1.0842));
}

#[tokio::test(start_paused = true)]
async fn failed_chunk_does_not_abort_the_batch() {
    let network = FakeNetwork::new(vec![
        Behavior::RejectSubmission,
        Behavior::Resolve(r#"[{"symbol":"EUR/USD","price":1.08}]"#.to_string()),
    ]);
    let orchestrator = Orchestrator::new(network.clone(), test_config());

    let report = orchestrator
        .pull_prices(ids(&["equity:AAPL", "equity:MSFT", "fx:EUR"]))
        .await
        .unwrap();

    assert_eq!(report.requests[0].request_id, "failed");
    assert!(matches!(
        report.requests[0].status,
        RequestStatus::SubmitFailed { .. }
    ));
    assert_eq!(
        report.requests[1].status,
        RequestStatus::Resolved { result_count: 1 }
    );
    assert_eq!(report.prices.len(), 1);
    assert_eq!(report.prices["fx:EUR"].price, dec!(1.08));

    // Rejected chunk burned all three attempts, resolved one took a single call.
    assert_eq!(network.submit_calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn execution_failure_is_isolated_per_handle() {
    let network = FakeNetwork::new(vec![
        Behavior::ExitCode(1),
        Behavior::Resolve(r#"[{"symbol":"EUR/USD","price":1.08}]"#.to_string()),
    ]);
    let orchestrator = Orchestrator::new(network, test_config());

    let report = orchestrator
        .pull_prices(ids(&["equity:AAPL", "equity:MSFT", "fx:EUR"]))
        .await
        .unwrap();

    assert_eq!(
        report.requests[0].status,
        RequestStatus::ExecutionFailed { exit_code: 1 }
    );
    // The failing handle contributes nothing; the aggregate is untouched.
    assert_eq!(report.prices.len(), 1);
    assert!(report.prices.contains_key("fx:EUR"));
}

#[tokio::test(start_paused = true)]
async fn unassigned_request_times_out_without_blocking_others() {
    let network = FakeNetwork::new(vec![
        Behavior::NeverAssigned,
        Behavior::Resolve(r#"[{"symbol":"EUR/USD","price":1.08}]"#.to_string()),
    ]);
    let orchestrator = Orchestrator::new(network, test_config());

    let report = orchestrator
        .pull_prices(ids(&["equity:AAPL", "equity:MSFT", "fx:EUR"]))
        .await
        .unwrap();

    assert_eq!(report.requests[0].status, RequestStatus::NotFoundTimeout);
    assert_eq!(
        report.requests[1].status,
        RequestStatus::Resolved { result_count: 1 }
    );
    assert_eq!(report.prices.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn session_deadline_reports_pending_handles_as_errors() {
    let mut config = test_config();
    // A stalled request would poll for ~100s; the session gives up first.
    config.resolve.max_poll_attempts = 1000;
    config.resolve.session_deadline_secs = 5;

    let network = FakeNetwork::new(vec![
        Behavior::Resolve(r#"[{"symbol":"AAPL","price":189.84},{"symbol":"MSFT","price":415.1}]"#.to_string()),
        Behavior::NeverAssigned,
    ]);
    let orchestrator = Orchestrator::new(network, config);

    let report = orchestrator
        .pull_prices(ids(&["equity:AAPL", "equity:MSFT", "fx:EUR"]))
        .await
        .unwrap();

    assert!(report.requests[0].status.is_success());
    match &report.requests[1].status {
        RequestStatus::Error { message } => {
            assert!(message.contains("session deadline"));
        }
        other => panic!("expected deadline error, got {:?}", other),
    }
    // Results that did finish are still in the partial report.
    assert_eq!(report.prices.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn empty_request_is_rejected() {
    let network = FakeNetwork::new(vec![]);
    let orchestrator = Orchestrator::new(network, test_config());
    assert!(orchestrator.pull_prices(Vec::new()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn overlapping_symbols_follow_last_write_wins() {
    // Both chunks report AAPL; the merge applied last keeps its price.
    let network = FakeNetwork::new(vec![
        Behavior::Resolve(r#"[{"symbol":"AAPL","price":189.0}]"#.to_string()),
        Behavior::Resolve(r#"[{"symbol":"AAPL","price":190.5}]"#.to_string()),
    ]);
    let orchestrator = Orchestrator::new(network, test_config());

    let report = orchestrator
        .pull_prices(ids(&["equity:AAPL", "equity:MSFT", "fx:EUR"]))
        .await
        .unwrap();

    assert_eq!(report.prices.len(), 1);
    let price = report.prices["equity:AAPL"].price;
    assert!(price == dec!(189.0) || price == dec!(190.5));
}
