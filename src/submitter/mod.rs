//! Sequenced chunk submission with bounded retry.
//!
//! Turns one planned chunk into a request descriptor and posts it under the
//! session's signing identity. Failed attempts back off exponentially; a
//! chunk that exhausts its attempts is downgraded to a failed handle so the
//! rest of the batch keeps going.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use crate::network::{OracleNetworkClient, RequestDescriptor};
use crate::sequence::SequenceManager;
use crate::types::{Chunk, PendingRequestHandle};

#[derive(Debug, Clone)]
pub struct SubmitterSettings {
    pub program_id: String,
    pub gas_price: u128,
    pub max_retries: u32,
    pub backoff_base: Duration,
}

pub struct RequestSubmitter<C> {
    client: Arc<C>,
    sequences: Arc<SequenceManager>,
    settings: SubmitterSettings,
}

impl<C: OracleNetworkClient> RequestSubmitter<C> {
    pub fn new(client: Arc<C>, sequences: Arc<SequenceManager>, settings: SubmitterSettings) -> Self {
        Self {
            client,
            sequences,
            settings,
        }
    }

    /// Post one chunk, retrying failed submission calls with exponential
    /// backoff. Always returns a handle; exhausted retries produce the
    /// failed sentinel rather than an error.
    pub async fn submit(&self, chunk: &Chunk) -> PendingRequestHandle {
        let sequence = self.sequences.issue();
        let descriptor = self.build_descriptor(chunk, sequence);

        let mut delay = self.settings.backoff_base;
        let mut last_error = String::new();

        for attempt in 1..=self.settings.max_retries {
            match self.client.submit(&descriptor).await {
                Ok(receipt) => {
                    self.sequences.complete(sequence);
                    tracing::info!(
                        chunk = chunk.index,
                        request_id = %receipt.request_id,
                        height = ?receipt.height,
                        sequence,
                        attempt,
                        "data request submitted"
                    );
                    return PendingRequestHandle::accepted(
                        receipt.request_id,
                        receipt.height,
                        chunk.clone(),
                    );
                }
                Err(e) => {
                    last_error = e.to_string();
                    tracing::warn!(
                        chunk = chunk.index,
                        attempt,
                        max_retries = self.settings.max_retries,
                        error = %last_error,
                        "submission attempt failed"
                    );
                    if attempt < self.settings.max_retries {
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    }
                }
            }
        }

        self.sequences.fail(sequence);
        tracing::error!(
            chunk = chunk.index,
            error = %last_error,
            "chunk submission exhausted retries"
        );
        PendingRequestHandle::failed(chunk.clone(), last_error)
    }

    fn build_descriptor(&self, chunk: &Chunk, sequence: u64) -> RequestDescriptor {
        // The memo keys the submission: timestamp plus chunk index, so two
        // pulls of the same asset list never look identical to the network.
        let memo = format!("{}#chunk-{}", Utc::now().to_rfc3339(), chunk.index);
        RequestDescriptor {
            program_id: self.settings.program_id.clone(),
            encoded_input: chunk.encoded_input(),
            consensus_method: "none".to_string(),
            memo,
            gas_price: self.settings.gas_price,
            sequence,
        }
    }
}
