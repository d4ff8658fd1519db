pub mod deal;
pub mod item;

pub use deal::{compute_deals, Deal};
pub use item::{Bucket, Item, PriceSide};
