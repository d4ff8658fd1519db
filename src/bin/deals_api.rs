use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skin_arb::config::Config;
use skin_arb::db::ItemStore;
use skin_arb::server::{build_router, ApiState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deals_api=info,skin_arb=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store = ItemStore::new(&config.database_url).await?;
    let state = ApiState {
        store: Arc::new(store),
    };

    let listener = tokio::net::TcpListener::bind(&config.api_bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.api_bind_addr))?;

    info!("Deals API listening on http://{}", config.api_bind_addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
        })
        .await
        .context("Deals API server error")?;

    info!("Deals API stopped");
    Ok(())
}
