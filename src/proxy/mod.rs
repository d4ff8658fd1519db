pub mod pool;

pub use pool::{ProxyEndpoint, ProxyPool};
