//! Item Store
//!
//! Persistent mapping from normalized item name to encoded [`Item`], with
//! prefix search for autocomplete-style lookup.
//!
//! ## Guarantees
//! - Key is always `lowercase(name)`; same-name writes are last-write-wins
//! - A failed save leaves the prior value of the key untouched
//! - Search never fails: a scan that cannot start yields nothing, records
//!   that cannot be decoded are skipped and counted

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{ItemDbError, Result};
use crate::item::{normalize_key, Item};

/// Name of the single bucket holding item records
pub const BUCKET_NAME: &str = "items";

/// Result of a best-effort prefix scan
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Decoded records in key order
    pub items: Vec<Item>,
    /// Entries matched by the scan but dropped because they failed to decode
    pub skipped: usize,
}

/// Embedded item store
pub struct ItemStore {
    root: PathBuf,
    engine: Engine,
    /// Cumulative count of records skipped by searches
    skipped: AtomicU64,
}

impl ItemStore {
    /// Open or create a store at `path` with default settings
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(Config::builder().data_dir(path.as_ref()).build())
    }

    /// Open or create a store described by `config`
    ///
    /// Creates the item bucket on first open. Any failure to initialize the
    /// underlying storage is reported as `ItemDbError::Open`.
    pub fn open_with(config: Config) -> Result<Self> {
        let root = config.data_dir.clone();
        let bucket_dir = root.join(BUCKET_NAME);

        let engine = Self::ensure_bucket(&root, &bucket_dir)
            .and_then(|_| {
                let mut engine_config = config.clone();
                engine_config.data_dir = bucket_dir.clone();
                Engine::open(engine_config)
            })
            .map_err(|e| ItemDbError::Open(format!("{}: {}", root.display(), e)))?;

        tracing::info!(
            path = %root.display(),
            sstables = engine.sstable_count(),
            "item store opened"
        );

        Ok(Self {
            root,
            engine,
            skipped: AtomicU64::new(0),
        })
    }

    fn ensure_bucket(root: &Path, bucket_dir: &Path) -> Result<()> {
        fs::create_dir_all(root)?;
        if !bucket_dir.is_dir() {
            tracing::info!(bucket = BUCKET_NAME, "creating bucket");
            fs::create_dir(bucket_dir)?;
        }
        Ok(())
    }

    /// Upsert `item` under `lowercase(item.name)`
    pub fn save_item(&self, item: &Item) -> Result<()> {
        let value = item.encode()?;
        let key = item.key();

        self.engine
            .put(&key, &value)
            .map_err(|e| ItemDbError::Write(format!("{:?}: {}", item.name, e)))?;

        tracing::debug!(name = %item.name, bytes = value.len(), "saved item");
        Ok(())
    }

    /// Look up an item by name, any casing
    pub fn get_item(&self, name: &str) -> Result<Item> {
        match self.engine.get(&normalize_key(name))? {
            Some(bytes) => Item::decode(&bytes),
            None => Err(ItemDbError::NotFound(name.to_string())),
        }
    }

    /// Up to `limit` items whose normalized name starts with `lowercase(prefix)`
    pub fn search_items(&self, prefix: &str, limit: usize) -> Vec<Item> {
        self.search(prefix, limit).items
    }

    /// Like [`ItemStore::search_items`], also reporting skipped entries
    pub fn search(&self, prefix: &str, limit: usize) -> SearchOutcome {
        let entries = match self.engine.scan_prefix(&normalize_key(prefix), limit) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(prefix, error = %e, "prefix scan failed; returning no results");
                return SearchOutcome::default();
            }
        };

        let outcome = entries
            .into_iter()
            .fold(SearchOutcome::default(), |mut acc, (key, value)| {
                match Item::decode(&value) {
                    Ok(item) => acc.items.push(item),
                    Err(e) => {
                        tracing::warn!(
                            key = %String::from_utf8_lossy(&key),
                            error = %e,
                            "skipping undecodable record"
                        );
                        acc.skipped += 1;
                    }
                }
                acc
            });

        if outcome.skipped > 0 {
            self.skipped.fetch_add(outcome.skipped as u64, Ordering::Relaxed);
        }

        outcome
    }

    /// Total records skipped by searches since this handle was opened
    pub fn skipped_records(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Force buffered writes into an SSTable
    pub fn flush(&self) -> Result<()> {
        self.engine.flush()
    }

    /// Root directory of this store
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Flush and release the store; the handle cannot be used afterwards
    pub fn close(self) -> Result<()> {
        tracing::info!(path = %self.root.display(), "closing item store");
        self.engine.close()
    }
}
