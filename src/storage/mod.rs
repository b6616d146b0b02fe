//! On-disk half of the engine: immutable SSTables and the manager that
//! flushes, discovers and merges them.

mod sstable;
mod manager;

pub use sstable::{SSTable, SSTableBuilder, SSTableReader};
pub use manager::StorageManager;
