use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::models::Bucket;
use crate::workers::price_fetcher::PriceFetchWorker;
use crate::workers::stats::FetchStatsSnapshot;

pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_BATCH_PAUSE: Duration = Duration::from_secs(1);

/// Summary of one pass over a bucket
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle: u64,
    pub items: usize,
    pub batches: usize,
    pub duration: Duration,
    /// Fetch counters across all loops at the end of the cycle
    pub stats: FetchStatsSnapshot,
}

/// Worker that rescans one bucket of items forever
pub struct ScanLoopWorker {
    bucket: Bucket,
    items: Vec<String>,
    fetcher: Arc<PriceFetchWorker>,
    refresh_interval: Duration,
    batch_size: usize,
    batch_pause: Duration,
}

impl ScanLoopWorker {
    /// Create a new scan loop worker
    pub fn new(
        bucket: Bucket,
        items: Vec<String>,
        fetcher: Arc<PriceFetchWorker>,
        refresh_interval_secs: u64,
    ) -> Self {
        Self {
            bucket,
            items,
            fetcher,
            refresh_interval: Duration::from_secs(refresh_interval_secs),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pause: DEFAULT_BATCH_PAUSE,
        }
    }

    /// Override how many fetch tasks run per batch and the pause between batches
    pub fn with_batching(mut self, batch_size: usize, batch_pause: Duration) -> Self {
        self.batch_size = batch_size.max(1);
        self.batch_pause = batch_pause;
        self
    }

    /// Run the worker loop
    pub async fn run(&self) {
        info!(
            "[{}] Scan loop started ({} items, interval: {:?})",
            self.bucket,
            self.items.len(),
            self.refresh_interval
        );

        let mut cycle = 0;
        loop {
            cycle += 1;
            let report = self.run_cycle(cycle).await;

            info!(
                "[{}] Cycle {} finished in {:.1}s, waiting {:?} | stored: {}, discarded: {}, rate limited: {}, network errors: {}",
                self.bucket,
                report.cycle,
                report.duration.as_secs_f64(),
                self.refresh_interval,
                report.stats.stored,
                report.stats.discarded,
                report.stats.rate_limited,
                report.stats.transport_errors,
            );

            sleep(self.refresh_interval).await;
        }
    }

    /// Fetch every item once, one batch at a time.
    ///
    /// A batch must fully complete before the next one is dispatched.
    pub async fn run_cycle(&self, cycle: u64) -> CycleReport {
        let start = Instant::now();
        info!(
            "[{}] Starting scan cycle {} ({} items)",
            self.bucket,
            cycle,
            self.items.len()
        );

        let mut batches = 0;

        for batch in self.items.chunks(self.batch_size) {
            let mut tasks = JoinSet::new();

            for name in batch {
                let fetcher = Arc::clone(&self.fetcher);
                let name = name.clone();
                tasks.spawn(async move { fetcher.fetch(&name).await });
            }

            while let Some(result) = tasks.join_next().await {
                if let Err(e) = result {
                    warn!("[{}] Fetch task failed: {}", self.bucket, e);
                }
            }

            batches += 1;
            sleep(self.batch_pause).await;
        }

        CycleReport {
            cycle,
            items: self.items.len(),
            batches,
            duration: start.elapsed(),
            stats: self.fetcher.stats().snapshot(),
        }
    }
}
