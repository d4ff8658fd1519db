#[cfg(test)]
pub(crate) mod canned;
pub mod skinport;
pub mod steam;

use async_trait::async_trait;

use crate::proxy::ProxyEndpoint;

pub use skinport::{Catalog, Classifier, SkinportClient};
pub use steam::{FetchError, SteamClient};

/// Sell-side price lookup for a single item
#[async_trait]
pub trait PriceLookup: Send + Sync {
    /// Lowest current listing price for `item_name`, routed through `proxy` if given
    async fn lowest_price(
        &self,
        item_name: &str,
        proxy: Option<&ProxyEndpoint>,
    ) -> Result<f64, FetchError>;
}
