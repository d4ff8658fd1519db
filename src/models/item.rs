use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tradable item with the latest price seen on each marketplace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Row identifier assigned by the store
    pub id: Option<i64>,

    /// Canonical market hash name (e.g., "AK-47 | Redline (Field-Tested)")
    pub name: String,

    /// Lowest Steam listing price, 0.0 until observed
    pub sell_side_price: f64,

    /// Skinport minimum price, 0.0 until observed
    pub buy_side_price: f64,

    /// Time of the last write to this row
    pub last_updated: DateTime<Utc>,
}

impl Item {
    /// Both prices have been observed at least once
    pub fn has_both_prices(&self) -> bool {
        self.sell_side_price > 0.0 && self.buy_side_price > 0.0
    }
}

/// Which marketplace a price observation came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PriceSide {
    /// Steam Community Market, where items are sold
    Sell,
    /// Skinport, where items are bought
    Buy,
}

impl PriceSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceSide::Sell => "steam",
            PriceSide::Buy => "skinport",
        }
    }
}

/// Refresh cadence bucket assigned at catalog time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Hot,
    Cold,
}

impl Bucket {
    pub fn label(&self) -> &'static str {
        match self {
            Bucket::Hot => "HOT",
            Bucket::Cold => "COLD",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
