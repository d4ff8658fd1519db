use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// What a single fetch attempt ended with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Price parsed and written to the store
    Stored,
    /// Price field absent or unparsable, observation dropped
    Discarded,
    /// Steam answered 429, slot held for the backoff period
    RateLimited,
    /// Timeout, refused connection, proxy failure
    TransportError,
    /// Any other non-200 status
    UnexpectedStatus,
    /// Price parsed but the write failed
    StoreError,
    /// The limiter was closed before a slot became free
    Cancelled,
}

/// Running counters of fetch outcomes, shared by every worker
#[derive(Debug, Default)]
pub struct FetchStats {
    stored: AtomicU64,
    discarded: AtomicU64,
    rate_limited: AtomicU64,
    transport_errors: AtomicU64,
    unexpected_status: AtomicU64,
    store_errors: AtomicU64,
    cancelled: AtomicU64,
}

/// Point-in-time copy of [`FetchStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FetchStatsSnapshot {
    pub stored: u64,
    pub discarded: u64,
    pub rate_limited: u64,
    pub transport_errors: u64,
    pub unexpected_status: u64,
    pub store_errors: u64,
    pub cancelled: u64,
}

impl FetchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: FetchOutcome) {
        let counter = match outcome {
            FetchOutcome::Stored => &self.stored,
            FetchOutcome::Discarded => &self.discarded,
            FetchOutcome::RateLimited => &self.rate_limited,
            FetchOutcome::TransportError => &self.transport_errors,
            FetchOutcome::UnexpectedStatus => &self.unexpected_status,
            FetchOutcome::StoreError => &self.store_errors,
            FetchOutcome::Cancelled => &self.cancelled,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> FetchStatsSnapshot {
        FetchStatsSnapshot {
            stored: self.stored.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            unexpected_status: self.unexpected_status.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }
}

impl FetchStatsSnapshot {
    pub fn total(&self) -> u64 {
        self.stored
            + self.discarded
            + self.rate_limited
            + self.transport_errors
            + self.unexpected_status
            + self.store_errors
            + self.cancelled
    }
}
