use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::api::steam::BROWSER_USER_AGENT;
use crate::models::Bucket;

/// Weapons whose skins trade often enough to deserve the short cadence
pub const HOT_KEYWORDS: &[&str] = &[
    "AK-47",
    "M4A4",
    "M4A1-S",
    "AWP",
    "USP-S",
    "Glock-18",
    "Desert Eagle",
];

pub const DEFAULT_HOT_PRICE_THRESHOLD: f64 = 200.0;

/// Client for the Skinport public items API
pub struct SkinportClient {
    client: Client,
    base_url: String,
}

/// One entry of the Skinport items listing
#[derive(Debug, Clone, Deserialize)]
pub struct SkinportListing {
    pub market_hash_name: String,
    pub min_price: Option<f64>,
}

/// Hot/cold split of an item catalog
#[derive(Debug, Clone)]
pub struct Classifier {
    threshold: f64,
    keywords: Vec<String>,
}

impl Classifier {
    pub fn new(threshold: f64, keywords: &[&str]) -> Self {
        Self {
            threshold,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Hot iff the price is known and under the threshold and the name
    /// contains one of the keywords (case-sensitive)
    pub fn classify(&self, name: &str, price: Option<f64>) -> Bucket {
        let cheap_enough = matches!(price, Some(p) if p > 0.0 && p < self.threshold);

        if cheap_enough && self.keywords.iter().any(|k| name.contains(k.as_str())) {
            Bucket::Hot
        } else {
            Bucket::Cold
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_HOT_PRICE_THRESHOLD, HOT_KEYWORDS)
    }
}

/// Item names split into scan buckets, plus the Skinport prices seen
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub hot: Vec<String>,
    pub cold: Vec<String>,
    /// Known (non-zero) buy-side prices
    pub buy_prices: BTreeMap<String, f64>,
}

impl Catalog {
    /// Classify a raw listing. Duplicate names keep their first entry.
    pub fn from_listings(listings: Vec<SkinportListing>, classifier: &Classifier) -> Self {
        let mut catalog = Catalog::default();
        let mut seen = HashSet::new();

        for listing in listings {
            if !seen.insert(listing.market_hash_name.clone()) {
                debug!("Duplicate listing for {}", listing.market_hash_name);
                continue;
            }

            if let Some(price) = listing.min_price.filter(|p| *p > 0.0) {
                catalog
                    .buy_prices
                    .insert(listing.market_hash_name.clone(), price);
            }

            match classifier.classify(&listing.market_hash_name, listing.min_price) {
                Bucket::Hot => catalog.hot.push(listing.market_hash_name),
                Bucket::Cold => catalog.cold.push(listing.market_hash_name),
            }
        }

        catalog
    }

    pub fn worklist(&self, bucket: Bucket) -> &[String] {
        match bucket {
            Bucket::Hot => &self.hot,
            Bucket::Cold => &self.cold,
        }
    }

    pub fn len(&self) -> usize {
        self.hot.len() + self.cold.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SkinportClient {
    /// Create a new Skinport client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .context("Failed to build Skinport HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Fetch and classify the full catalog. Any failure yields an empty catalog.
    pub async fn fetch_catalog(&self, classifier: &Classifier) -> Catalog {
        info!("Loading item catalog from Skinport...");

        let listings = match self.fetch_listings().await {
            Ok(listings) => listings,
            Err(e) => {
                error!("Skinport catalog fetch failed: {:#}", e);
                return Catalog::default();
            }
        };

        let catalog = Catalog::from_listings(listings, classifier);
        info!(
            "Catalog classified: {} hot / {} cold items ({} with a Skinport price)",
            catalog.hot.len(),
            catalog.cold.len(),
            catalog.buy_prices.len()
        );

        catalog
    }

    async fn fetch_listings(&self) -> Result<Vec<SkinportListing>> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("app_id", "730"), ("currency", "USD"), ("tradable", "0")])
            .header(header::USER_AGENT, BROWSER_USER_AGENT)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .context("Failed to connect to Skinport")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Skinport API error: {} - {}", status, text);
        }

        let listings: Vec<SkinportListing> = response
            .json()
            .await
            .context("Failed to parse Skinport items response")?;

        Ok(listings)
    }
}
