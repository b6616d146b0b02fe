//! # itemdb
//!
//! A local catalog of game-item prices:
//! - Rate-limited ingestion from the upstream pricing API
//! - Tolerant normalization of humanized price strings
//! - Embedded WAL-backed store keyed by lowercased item name
//! - Prefix search for autocomplete-style lookup
//!
//! ## Layers
//!
//! ```text
//!  Catalog ── search(query) ───────────────┐
//!     │                                    ▼
//!     └─ ingest_item(id) ── IngestService ─► ItemStore  (bucket "items",
//!                           │                  │          key = lowercase name)
//!                 RateLimiter ► GET ► transform  Engine
//!                                              ├── wal.log      append before apply
//!                                              ├── MemTable     sorted write buffer
//!                                              └── sstables/    immutable, newest wins
//! ```
//!
//! Reads and prefix scans merge the memtable over the SSTables; the WAL is
//! only read at open.

pub mod error;
pub mod config;

pub mod wal;
pub mod memtable;
pub mod storage;
pub mod engine;

pub mod item;
pub mod store;
pub mod ingest;
pub mod app;

pub use error::{ItemDbError, Result};
pub use config::{Config, IngestConfig};
pub use engine::Engine;
pub use item::Item;
pub use store::{ItemStore, SearchOutcome};
pub use ingest::{transform, IngestService, RateLimiter};
pub use app::Catalog;

/// Current version of itemdb
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
