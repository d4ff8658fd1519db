use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skin_arb::api::{Classifier, SkinportClient, SteamClient};
use skin_arb::api::skinport::HOT_KEYWORDS;
use skin_arb::config::Config;
use skin_arb::db::ItemStore;
use skin_arb::models::Bucket;
use skin_arb::proxy::ProxyPool;
use skin_arb::workers::{
    seed_buy_side_prices, FetchStats, Pacing, PriceFetchWorker, RequestLimiter, ScanLoopWorker,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skin_arb=info,scanner=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting skin-arb scanner");

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded");

    // Initialize database
    let item_store = Arc::new(ItemStore::new(&config.database_url).await?);
    info!("Database initialized");

    // Load proxies (an empty pool means direct requests)
    let proxies = Arc::new(ProxyPool::load(Path::new(&config.proxy_file)));

    // Fetch and classify the catalog
    let skinport_client = SkinportClient::new(&config.skinport_api_url, config.request_timeout())?;
    let classifier = Classifier::new(config.hot_price_threshold, HOT_KEYWORDS);
    let catalog = skinport_client.fetch_catalog(&classifier).await;

    if catalog.hot.is_empty() {
        error!("No hot items in the catalog, stopping");
        anyhow::bail!("catalog fetch returned no hot items");
    }

    // Initial Skinport prices
    seed_buy_side_prices(item_store.as_ref(), &catalog.buy_prices).await?;

    // Shared by both scan loops
    let steam_client = SteamClient::new(&config.steam_api_url, &proxies, config.request_timeout())?;
    let limiter = RequestLimiter::new(config.max_concurrent_requests);
    let fetcher = Arc::new(PriceFetchWorker::new(
        Arc::new(steam_client),
        item_store,
        Arc::clone(&proxies),
        limiter,
        Pacing::new(config.rate_limit_backoff),
        Arc::new(FetchStats::new()),
    ));
    info!(
        "Fetch worker ready ({} proxies, {} concurrent requests)",
        proxies.len(),
        config.max_concurrent_requests
    );

    // Create workers
    let hot_loop = ScanLoopWorker::new(
        Bucket::Hot,
        catalog.worklist(Bucket::Hot).to_vec(),
        Arc::clone(&fetcher),
        config.hot_refresh_interval,
    )
    .with_batching(config.scan_batch_size, config.batch_pause());

    let cold_loop = ScanLoopWorker::new(
        Bucket::Cold,
        catalog.worklist(Bucket::Cold).to_vec(),
        Arc::clone(&fetcher),
        config.cold_refresh_interval,
    )
    .with_batching(config.scan_batch_size, config.batch_pause());

    info!("Workers created, starting...");

    // Spawn workers
    let hot_handle = tokio::spawn(async move {
        hot_loop.run().await;
    });

    let cold_handle = tokio::spawn(async move {
        cold_loop.run().await;
    });

    info!("All scan loops started");

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        result = hot_handle => {
            error!("Hot scan loop exited unexpectedly: {:?}", result);
        }
        result = cold_handle => {
            error!("Cold scan loop exited unexpectedly: {:?}", result);
        }
    }

    info!("Shutting down skin-arb scanner");
    Ok(())
}
