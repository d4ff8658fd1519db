use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::api::{FetchError, PriceLookup};
use crate::db::PriceSink;
use crate::models::PriceSide;
use crate::proxy::ProxyPool;
use crate::workers::limiter::RequestLimiter;
use crate::workers::stats::{FetchOutcome, FetchStats};

/// Timing policy applied to every lookup
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    /// Delay before each request is drawn from `[jitter_min, jitter_max)`
    pub jitter_min: Duration,
    pub jitter_max: Duration,
    /// Extra time the slot stays held after a 429
    pub rate_limit_backoff: Duration,
}

impl Pacing {
    pub fn new(rate_limit_backoff_secs: u64) -> Self {
        Self {
            rate_limit_backoff: Duration::from_secs(rate_limit_backoff_secs),
            ..Self::default()
        }
    }

    fn jitter(&self) -> Duration {
        if self.jitter_max <= self.jitter_min {
            return self.jitter_min;
        }
        rand::thread_rng().gen_range(self.jitter_min..self.jitter_max)
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            jitter_min: Duration::from_secs(1),
            jitter_max: Duration::from_secs(3),
            rate_limit_backoff: Duration::from_secs(10),
        }
    }
}

/// Looks up the Steam price of one item at a time and stores it.
///
/// A single instance is shared by both scan loops so that they draw from the
/// same limiter and proxy pool.
pub struct PriceFetchWorker {
    lookup: Arc<dyn PriceLookup>,
    sink: Arc<dyn PriceSink>,
    proxies: Arc<ProxyPool>,
    limiter: RequestLimiter,
    pacing: Pacing,
    stats: Arc<FetchStats>,
}

impl PriceFetchWorker {
    /// Create a new price fetch worker
    pub fn new(
        lookup: Arc<dyn PriceLookup>,
        sink: Arc<dyn PriceSink>,
        proxies: Arc<ProxyPool>,
        limiter: RequestLimiter,
        pacing: Pacing,
        stats: Arc<FetchStats>,
    ) -> Self {
        Self {
            lookup,
            sink,
            proxies,
            limiter,
            pacing,
            stats,
        }
    }

    pub fn stats(&self) -> &FetchStats {
        &self.stats
    }

    /// Fetch and store the sell-side price of `item_name`.
    ///
    /// Never fails: every problem is logged, counted and left for the next
    /// scan cycle. The limiter slot is held until this returns.
    pub async fn fetch(&self, item_name: &str) -> FetchOutcome {
        let _permit = match self.limiter.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                error!("Request limiter closed: {}", e);
                return FetchOutcome::Cancelled;
            }
        };

        sleep(self.pacing.jitter()).await;

        let proxy = self.proxies.pick_random();

        let outcome = match self.lookup.lowest_price(item_name, proxy).await {
            Ok(price) => match self.sink.upsert(item_name, price, PriceSide::Sell).await {
                Ok(()) => FetchOutcome::Stored,
                Err(e) => {
                    warn!("Failed to store Steam price for {}: {:#}", item_name, e);
                    FetchOutcome::StoreError
                }
            },
            Err(FetchError::RateLimited) => {
                let via = proxy
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "direct".to_string());
                warn!("429 Rate limit (proxy: {}), backing off", via);
                sleep(self.pacing.rate_limit_backoff).await;
                FetchOutcome::RateLimited
            }
            Err(FetchError::MalformedPrice) => {
                debug!("No usable price for {}", item_name);
                FetchOutcome::Discarded
            }
            Err(FetchError::Status(status)) => {
                debug!("Steam returned {} for {}", status, item_name);
                FetchOutcome::UnexpectedStatus
            }
            Err(FetchError::Transport(e)) => {
                debug!("Network error for {}: {}", item_name, e);
                FetchOutcome::TransportError
            }
        };

        self.stats.record(outcome);
        outcome
    }
}
