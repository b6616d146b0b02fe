//! Ingest Service
//!
//! Rate-limited HTTP fetcher for single catalogue entries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use reqwest::StatusCode;

use crate::config::IngestConfig;
use crate::error::{ItemDbError, Result};
use crate::item::Item;

use super::limiter::RateLimiter;
use super::transform::transform_with_report;

/// Fetches catalogue entries one at a time under a shared rate limit
pub struct IngestService {
    config: IngestConfig,
    client: Client,
    limiter: Arc<RateLimiter>,
    /// Prices that fell back to 0 across all fetches
    price_fallbacks: AtomicU64,
}

impl IngestService {
    /// Create a service with its own limiter built from `config`
    pub fn new(config: IngestConfig) -> Result<Self> {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit_interval));
        Self::with_limiter(config, limiter)
    }

    /// Create a service that shares an existing limiter
    pub fn with_limiter(config: IngestConfig, limiter: Arc<RateLimiter>) -> Result<Self> {
        if !config.endpoint_template.contains(crate::config::ID_PLACEHOLDER) {
            return Err(ItemDbError::Config(format!(
                "endpoint template {:?} has no {} placeholder",
                config.endpoint_template,
                crate::config::ID_PLACEHOLDER
            )));
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ItemDbError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            limiter,
            price_fallbacks: AtomicU64::new(0),
        })
    }

    /// Fetch and normalize one item
    ///
    /// Blocks until the rate limiter admits the call.
    pub fn fetch_item(&self, id: i64) -> Result<Item> {
        self.limiter.admit()?;

        let url = self.config.url_for(id);
        tracing::debug!(id, %url, "fetching item");

        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, &self.config.user_agent)
            .send()
            .map_err(|e| ItemDbError::Network(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!(id, status = status.as_u16(), "upstream rejected request");
            return Err(ItemDbError::HttpStatus {
                code: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .map_err(|e| ItemDbError::Read(e.to_string()))?;

        let (item, report) = transform_with_report(&body)?;
        if report.fallbacks() > 0 {
            self.price_fallbacks
                .fetch_add(report.fallbacks(), Ordering::Relaxed);
        }

        tracing::info!(id, name = %item.name, price = item.current_price, "fetched item");
        Ok(item)
    }

    /// Stop the rate limiter; blocked and future fetches fail with `Shutdown`
    pub fn shutdown(&self) {
        self.limiter.stop();
    }

    /// Prices that fell back to 0 across all fetches
    pub fn price_fallbacks(&self) -> u64 {
        self.price_fallbacks.load(Ordering::Relaxed)
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }
}
