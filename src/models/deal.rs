use serde::{Deserialize, Serialize};

use crate::models::Item;

/// Steam keeps roughly 15% of every sale (13% fee plus fixed part)
pub const STEAM_FEE_DIVISOR: f64 = 1.15;

/// Default minimum profit for the deals endpoint
pub const DEFAULT_MIN_PROFIT: f64 = 1.0;

/// A buy-on-Skinport, sell-on-Steam opportunity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub name: String,

    /// Skinport price
    pub buy_at: f64,

    /// Steam price before fees
    pub sell_at: f64,

    /// Net profit per unit after the Steam fee, rounded to cents
    pub profit: f64,

    /// Return on investment in percent, one decimal
    pub roi: f64,
}

impl Deal {
    /// Evaluate one item. Returns `None` when either price is unknown.
    pub fn evaluate(item: &Item) -> Option<Self> {
        if !item.has_both_prices() {
            return None;
        }

        let profit = item.sell_side_price / STEAM_FEE_DIVISOR - item.buy_side_price;
        let roi = profit / item.buy_side_price * 100.0;

        Some(Deal {
            name: item.name.clone(),
            buy_at: item.buy_side_price,
            sell_at: item.sell_side_price,
            profit: round_to(profit, 2),
            roi: round_to(roi, 1),
        })
    }
}

/// Rank every item with `profit >= min_profit`, best first
pub fn compute_deals(items: &[Item], min_profit: f64) -> Vec<Deal> {
    let mut deals: Vec<Deal> = items
        .iter()
        .filter_map(Deal::evaluate)
        .filter(|deal| deal.profit >= min_profit)
        .collect();

    deals.sort_by(|a, b| b.profit.total_cmp(&a.profit));
    deals
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
