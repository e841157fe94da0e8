//! Per-identity submission sequencing.
//!
//! One signing identity must not race itself: every submission takes the
//! next number from this counter and the orchestrator posts chunks strictly
//! in that order. The counter is process-local and starts at zero for the
//! session; it does not consult the chain's authoritative account sequence,
//! so a restart mid-session or a second process signing with the same key
//! can still collide.

use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct Inner {
    next: u64,
    in_flight: HashSet<u64>,
}

/// Monotonic sequence counter tracking which numbers are still in flight.
#[derive(Debug, Default)]
pub struct SequenceManager {
    inner: Mutex<Inner>,
}

impl SequenceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next sequence number and mark it in flight.
    pub fn issue(&self) -> u64 {
        let mut inner = self.inner.lock().expect("sequence lock poisoned");
        let seq = inner.next;
        inner.next += 1;
        inner.in_flight.insert(seq);
        seq
    }

    /// Release a sequence whose submission was accepted.
    pub fn complete(&self, seq: u64) {
        let mut inner = self.inner.lock().expect("sequence lock poisoned");
        inner.in_flight.remove(&seq);
    }

    /// Release a sequence whose submission exhausted its retries.
    pub fn fail(&self, seq: u64) {
        let mut inner = self.inner.lock().expect("sequence lock poisoned");
        inner.in_flight.remove(&seq);
    }

    /// Number of issued sequences not yet completed or failed.
    pub fn in_flight(&self) -> usize {
        let inner = self.inner.lock().expect("sequence lock poisoned");
        inner.in_flight.len()
    }
}
