pub mod limiter;
pub mod price_fetcher;
pub mod scan_loop;
pub mod seeder;
pub mod stats;

#[cfg(test)]
pub(crate) mod fakes;

pub use limiter::{RequestLimiter, RequestPermit};
pub use price_fetcher::{Pacing, PriceFetchWorker};
pub use scan_loop::{CycleReport, ScanLoopWorker};
pub use seeder::seed_buy_side_prices;
pub use stats::{FetchOutcome, FetchStats, FetchStatsSnapshot};
