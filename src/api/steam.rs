use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::PriceLookup;
use crate::proxy::{ProxyEndpoint, ProxyPool};

/// CS2 app id on Steam
pub const STEAM_APP_ID: &str = "730";

/// Steam currency code for USD
const STEAM_CURRENCY_USD: &str = "1";

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Why a single price lookup produced no price
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("rate limited by Steam (429)")]
    RateLimited,

    #[error("unexpected Steam status: {0}")]
    Status(StatusCode),

    #[error("lowest_price missing or unparsable")]
    MalformedPrice,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Client for the Steam Community Market price overview endpoint
pub struct SteamClient {
    base_url: String,
    direct: Client,
    /// One client per proxy, keyed by proxy URL
    routed: HashMap<String, Client>,
}

/// Price overview response
#[derive(Debug, Deserialize)]
struct PriceOverview {
    #[serde(default)]
    success: bool,
    lowest_price: Option<String>,
}

impl SteamClient {
    /// Create a new Steam client with a pre-built HTTP client for every proxy
    pub fn new(base_url: &str, proxies: &ProxyPool, timeout: Duration) -> Result<Self> {
        let direct = build_client(None, timeout).context("Failed to build direct HTTP client")?;

        let mut routed = HashMap::new();
        for endpoint in proxies.endpoints() {
            match build_client(Some(endpoint), timeout) {
                Ok(client) => {
                    routed.insert(endpoint.url(), client);
                }
                Err(e) => warn!("Skipping proxy {}: {}", endpoint, e),
            }
        }

        Ok(Self {
            base_url: base_url.to_string(),
            direct,
            routed,
        })
    }

    fn client_for(&self, proxy: Option<&ProxyEndpoint>) -> &Client {
        proxy
            .and_then(|p| self.routed.get(&p.url()))
            .unwrap_or(&self.direct)
    }
}

#[async_trait]
impl PriceLookup for SteamClient {
    async fn lowest_price(
        &self,
        item_name: &str,
        proxy: Option<&ProxyEndpoint>,
    ) -> Result<f64, FetchError> {
        let response = self
            .client_for(proxy)
            .get(&self.base_url)
            .query(&[
                ("country", "US"),
                ("currency", STEAM_CURRENCY_USD),
                ("appid", STEAM_APP_ID),
                ("market_hash_name", item_name),
            ])
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::TOO_MANY_REQUESTS => return Err(FetchError::RateLimited),
            status => return Err(FetchError::Status(status)),
        }

        let overview: PriceOverview = response.json().await.map_err(|e| {
            if e.is_decode() {
                FetchError::MalformedPrice
            } else {
                FetchError::Transport(e)
            }
        })?;

        if !overview.success {
            debug!("Steam returned success=false for {}", item_name);
        }

        overview
            .lowest_price
            .as_deref()
            .and_then(parse_price)
            .ok_or(FetchError::MalformedPrice)
    }
}

fn build_client(proxy: Option<&ProxyEndpoint>, timeout: Duration) -> reqwest::Result<Client> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_static(BROWSER_USER_AGENT),
    );

    let mut builder = Client::builder().default_headers(headers).timeout(timeout);

    builder = match proxy {
        Some(endpoint) => builder.proxy(reqwest::Proxy::all(endpoint.url())?),
        // Direct means direct, ignore HTTP_PROXY and friends
        None => builder.no_proxy(),
    };

    builder.build()
}

/// Parse a currency string such as "$1,234.56" into a positive price.
///
/// Only a leading `$` and thousands separators are removed; anything else
/// makes the string unparsable.
pub fn parse_price(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let amount = trimmed.strip_prefix('$').unwrap_or(trimmed).replace(',', "");

    let price: f64 = amount.parse().ok()?;
    (price.is_finite() && price > 0.0).then_some(price)
}
