use std::collections::BTreeMap;

use anyhow::{Context, Result};
use tracing::info;

use crate::db::PriceSink;
use crate::models::PriceSide;

const PROGRESS_INTERVAL: usize = 1000;

/// Write the catalog's Skinport prices to the store, one at a time.
///
/// Returns the number of prices written. A store failure aborts the load.
pub async fn seed_buy_side_prices(
    sink: &dyn PriceSink,
    prices: &BTreeMap<String, f64>,
) -> Result<usize> {
    info!("Saving {} Skinport prices...", prices.len());

    let mut written = 0;

    for (name, price) in prices {
        if *price <= 0.0 {
            continue;
        }

        sink.upsert(name, *price, PriceSide::Buy)
            .await
            .with_context(|| format!("Failed to save Skinport price for {}", name))?;
        written += 1;

        if written % PROGRESS_INTERVAL == 0 {
            info!("Progress: {}/{} Skinport prices saved", written, prices.len());
        }
    }

    info!("Skinport prices saved: {}", written);
    Ok(written)
}
