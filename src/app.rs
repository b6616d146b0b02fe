//! Catalog coordinator
//!
//! Thin adapter exposing the two entry points a front end calls: prefix
//! search and ingest-by-id. Errors cross this boundary as plain text.

use crate::config::{Config, IngestConfig};
use crate::error::Result;
use crate::ingest::IngestService;
use crate::item::Item;
use crate::store::ItemStore;

/// Store + ingestion service, wired together
pub struct Catalog {
    store: ItemStore,
    ingest: IngestService,
    search_limit: usize,
}

impl Catalog {
    /// Open the store and start the ingestion service
    ///
    /// A store that cannot be opened is fatal to the caller.
    pub fn open(config: Config, ingest_config: IngestConfig) -> Result<Self> {
        let search_limit = config.search_limit;
        let store = ItemStore::open_with(config)?;
        let ingest = IngestService::new(ingest_config)?;

        Ok(Self {
            store,
            ingest,
            search_limit,
        })
    }

    /// Build from already constructed parts
    pub fn from_parts(store: ItemStore, ingest: IngestService, search_limit: usize) -> Self {
        Self {
            store,
            ingest,
            search_limit,
        }
    }

    /// Items whose name starts with `query`, capped at the configured limit
    pub fn search(&self, query: &str) -> Vec<Item> {
        self.store.search_items(query, self.search_limit)
    }

    /// Fetch item `id` upstream and save it; returns a status line
    pub fn ingest_item(&self, id: i64) -> String {
        let item = match self.ingest.fetch_item(id) {
            Ok(item) => item,
            Err(e) => return format!("Error fetching: {}", e),
        };

        if let Err(e) = self.store.save_item(&item) {
            return format!("Error saving: {}", e);
        }

        format!("Saved: {}", item.name)
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn ingest(&self) -> &IngestService {
        &self.ingest
    }

    /// Stop ingestion and close the store
    pub fn shutdown(self) -> Result<()> {
        self.ingest.shutdown();
        self.store.close()
    }
}
