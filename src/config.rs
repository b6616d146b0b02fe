//! Configuration for itemdb
//!
//! Centralized configuration with sensible defaults, split into the store
//! side (`Config`) and the ingestion side (`IngestConfig`).

use std::path::PathBuf;
use std::time::Duration;

/// Default catalogue endpoint; `{id}` is replaced with the item id
pub const DEFAULT_ENDPOINT: &str =
    "https://services.runescape.com/m=itemdb_rs/api/catalogue/detail.json?item={id}";

/// User-Agent the upstream service expects on every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (RS Item Database; Local Project)";

/// Placeholder substituted in `IngestConfig::endpoint_template`
pub const ID_PLACEHOLDER: &str = "{id}";

/// Main configuration for a store instance
#[derive(Debug, Clone)]
pub struct Config {
    /// Store root; the `items` bucket lives in `{data_dir}/items/`
    pub data_dir: PathBuf,

    /// When the WAL is fsynced
    pub wal_sync_strategy: WalSyncStrategy,

    /// Memtable bytes that trigger a flush
    pub memtable_size_limit: usize,

    /// Result cap used by the coordinator's `search` entry point
    pub search_limit: usize,
}

/// WAL fsync policy
#[derive(Debug, Clone, Copy)]
pub enum WalSyncStrategy {
    /// Every acknowledged save is on disk
    EveryWrite,

    /// Up to `count - 1` acknowledged saves can be lost on power failure
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./items.db"),
            wal_sync_strategy: WalSyncStrategy::EveryWrite,
            memtable_size_limit: 4 * 1024 * 1024, // 4 MB
            search_limit: 50,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    pub fn memtable_size_limit(mut self, size: usize) -> Self {
        self.config.memtable_size_limit = size;
        self
    }

    /// Set the coordinator search cap
    pub fn search_limit(mut self, limit: usize) -> Self {
        self.config.search_limit = limit;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

// =============================================================================
// Ingestion
// =============================================================================

/// Configuration for the ingestion pipeline
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// URL template containing `{id}`
    pub endpoint_template: String,

    /// Value of the User-Agent header
    pub user_agent: String,

    /// Timeout for a single HTTP request
    pub request_timeout: Duration,

    /// Minimum spacing between two admitted fetches
    pub rate_limit_interval: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            endpoint_template: DEFAULT_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(10),
            rate_limit_interval: Duration::from_secs(5),
        }
    }
}

impl IngestConfig {
    /// Create a new ingest config builder
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder::default()
    }

    /// Render the endpoint URL for one item id
    pub fn url_for(&self, id: i64) -> String {
        self.endpoint_template
            .replace(ID_PLACEHOLDER, &id.to_string())
    }
}

/// Builder for IngestConfig
#[derive(Default)]
pub struct IngestConfigBuilder {
    config: IngestConfig,
}

impl IngestConfigBuilder {
    /// Set the endpoint URL template (must contain `{id}`)
    pub fn endpoint_template(mut self, template: impl Into<String>) -> Self {
        self.config.endpoint_template = template.into();
        self
    }

    /// Set the User-Agent header value
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Set the per-request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the rate limit interval
    pub fn rate_limit_interval(mut self, interval: Duration) -> Self {
        self.config.rate_limit_interval = interval;
        self
    }

    pub fn build(self) -> IngestConfig {
        self.config
    }
}
