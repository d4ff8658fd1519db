use std::fmt;
use std::path::Path;

use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

/// A single egress proxy (`host:port:user:password` in the proxy file)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl ProxyEndpoint {
    /// Parse one proxy file line. Returns `None` for anything malformed.
    pub fn parse_line(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.trim().split(':').collect();
        if parts.len() != 4 || parts.iter().any(|p| p.is_empty()) {
            return None;
        }

        let port = parts[1].parse().ok()?;

        Some(Self {
            host: parts[0].to_string(),
            port,
            username: parts[2].to_string(),
            password: parts[3].to_string(),
        })
    }

    /// Proxy URL with credentials, suitable for `reqwest::Proxy::all`
    pub fn url(&self) -> String {
        format!(
            "http://{}:{}@{}:{}",
            urlencoding::encode(&self.username),
            urlencoding::encode(&self.password),
            self.host,
            self.port
        )
    }
}

/// Credentials are never printed
impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Immutable set of proxies loaded at startup
#[derive(Debug, Clone, Default)]
pub struct ProxyPool {
    endpoints: Vec<ProxyEndpoint>,
}

impl ProxyPool {
    /// Create an empty pool (requests go out directly)
    pub fn new() -> Self {
        Self::default()
    }

    /// Load proxies from a file. A missing or unreadable file yields an empty pool.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    "Proxy file {} not available ({}), requests will go out directly",
                    path.display(),
                    e
                );
                return Self::new();
            }
        };

        let pool = Self::from_lines(&content);
        info!("Loaded {} proxies from {}", pool.len(), path.display());
        pool
    }

    /// Build a pool from proxy file content, skipping malformed lines
    pub fn from_lines(content: &str) -> Self {
        let mut endpoints = Vec::new();

        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            match ProxyEndpoint::parse_line(line) {
                Some(endpoint) => endpoints.push(endpoint),
                None => debug!("Skipping malformed proxy line {}", index + 1),
            }
        }

        Self { endpoints }
    }

    /// Uniformly random proxy, or `None` when the pool is empty
    pub fn pick_random(&self) -> Option<&ProxyEndpoint> {
        self.endpoints.choose(&mut rand::thread_rng())
    }

    pub fn endpoints(&self) -> &[ProxyEndpoint] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
