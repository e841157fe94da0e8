//! HTTP gateway client for the oracle network.
//!
//! Talks to a JSON gateway that fronts the chain's query service: one POST
//! to submit a data request, GETs for the assignment/batch records, and a
//! result endpoint that is polled here under its own deadline. Absence of a
//! record (404) is mapped to `Ok(None)` — "not yet", not a failure.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::{QueryError, SubmitError};
use crate::network::{
    AssignmentRecord, BatchRecord, ExecutionResult, OracleNetworkClient, RequestDescriptor,
    SubmissionReceipt,
};

/// reqwest-backed implementation of [`OracleNetworkClient`].
pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> Result<Self, SubmitError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()
            .map_err(|e| SubmitError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET a record endpoint, mapping 404 to `Ok(None)`.
    async fn get_optional<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<Option<T>, QueryError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| QueryError::Network(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(QueryError::Network(format!(
                "gateway returned {} for {}",
                response.status(),
                url
            )));
        }

        let record: T = response
            .json()
            .await
            .map_err(|e| QueryError::Malformed(e.to_string()))?;
        Ok(Some(record))
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    request_id: String,
    height: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ResultResponse {
    exit_code: u32,
    payload: String,
    /// The gateway sets this while the result is still being settled.
    #[serde(default)]
    pending: bool,
}

#[async_trait]
impl OracleNetworkClient for GatewayClient {
    async fn submit(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<SubmissionReceipt, SubmitError> {
        let url = format!("{}/data-requests", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(descriptor)
            .send()
            .await
            .map_err(|e| SubmitError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SubmitError::Rejected(format!("{} - {}", status, body)));
        }

        let resp: SubmitResponse = response
            .json()
            .await
            .map_err(|e| SubmitError::Network(format!("bad submit response: {}", e)))?;

        Ok(SubmissionReceipt {
            request_id: resp.request_id,
            height: resp.height,
        })
    }

    async fn query_assignment(
        &self,
        request_id: &str,
        height: u64,
    ) -> Result<Option<AssignmentRecord>, QueryError> {
        let url = format!(
            "{}/data-results/{}?height={}",
            self.base_url, request_id, height
        );
        self.get_optional(&url).await
    }

    async fn query_batch(&self, batch_number: u64) -> Result<Option<BatchRecord>, QueryError> {
        let url = format!("{}/batches/{}", self.base_url, batch_number);
        self.get_optional(&url).await
    }

    async fn await_result(
        &self,
        request_id: &str,
        height: u64,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<ExecutionResult, QueryError> {
        let url = format!(
            "{}/data-results/{}/result?height={}",
            self.base_url, request_id, height
        );
        let deadline = Instant::now() + timeout;

        loop {
            match self.get_optional::<ResultResponse>(&url).await? {
                Some(resp) if !resp.pending => {
                    return Ok(ExecutionResult {
                        exit_code: resp.exit_code,
                        payload: resp.payload,
                    });
                }
                _ => {}
            }

            if Instant::now() + poll_interval > deadline {
                return Err(QueryError::ResultTimeout);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}
