pub mod items;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::PriceSide;

pub use items::ItemStore;

/// Destination for price observations.
///
/// Calls for different item names must never affect each other. Calls for the
/// same name may race, in which case the last write wins.
#[async_trait]
pub trait PriceSink: Send + Sync {
    /// Record `price` for `item_name`, creating the row on first sight
    async fn upsert(&self, item_name: &str, price: f64, side: PriceSide) -> Result<()>;
}
