use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::time::{sleep, Instant};

use crate::api::{FetchError, PriceLookup};
use crate::db::PriceSink;
use crate::models::PriceSide;
use crate::proxy::ProxyEndpoint;

/// Canned answer for one item
#[derive(Debug, Clone, Copy)]
pub enum Scripted {
    Price(f64),
    RateLimited,
    Malformed,
    Status(u16),
    Transport,
}

#[derive(Debug, Clone)]
pub struct LookupCall {
    pub item: String,
    pub proxy: Option<ProxyEndpoint>,
    pub started: Instant,
    pub finished: Option<Instant>,
}

/// Lookup that answers from a script and records every call
pub struct FakeLookup {
    default: Scripted,
    scripts: HashMap<String, Scripted>,
    latency: Duration,
    calls: Mutex<Vec<LookupCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeLookup {
    pub fn new(default: Scripted) -> Self {
        Self {
            default,
            scripts: HashMap::new(),
            latency: Duration::from_millis(50),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, item: &str, answer: Scripted) -> Self {
        self.scripts.insert(item.to_string(), answer);
        self
    }

    pub fn calls(&self) -> Vec<LookupCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceLookup for FakeLookup {
    async fn lowest_price(
        &self,
        item_name: &str,
        proxy: Option<&ProxyEndpoint>,
    ) -> Result<f64, FetchError> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(LookupCall {
                item: item_name.to_string(),
                proxy: proxy.cloned(),
                started: Instant::now(),
                finished: None,
            });
            calls.len() - 1
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        sleep(self.latency).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.calls.lock().unwrap()[index].finished = Some(Instant::now());

        match self.scripts.get(item_name).copied().unwrap_or(self.default) {
            Scripted::Price(price) => Ok(price),
            Scripted::RateLimited => Err(FetchError::RateLimited),
            Scripted::Malformed => Err(FetchError::MalformedPrice),
            Scripted::Status(code) => Err(FetchError::Status(StatusCode::from_u16(code).unwrap())),
            Scripted::Transport => {
                let err = reqwest::Client::new()
                    .get("not a url")
                    .send()
                    .await
                    .unwrap_err();
                Err(FetchError::Transport(err))
            }
        }
    }
}

/// Sink that keeps writes in memory
pub struct MemorySink {
    writes: Mutex<Vec<(String, f64, PriceSide)>>,
    fail: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            writes: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            writes: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn writes(&self) -> Vec<(String, f64, PriceSide)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceSink for MemorySink {
    async fn upsert(&self, item_name: &str, price: f64, side: PriceSide) -> Result<()> {
        if self.fail {
            anyhow::bail!("store unavailable");
        }
        self.writes
            .lock()
            .unwrap()
            .push((item_name.to_string(), price, side));
        Ok(())
    }
}
