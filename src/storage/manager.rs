//! SSTable set for one bucket
//!
//! Tables are named `sstable_{id:06}.sst` and ids only grow, so the highest
//! id holds the newest version of any key. A flush writes
//! `sstable_{id}.sst.tmp` and renames it into place; a `.tmp` found at open
//! belongs to a flush that never finished (its entries are still in the WAL)
//! and is deleted.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::error::{ItemDbError, Result};
use crate::memtable::MemTable;

use super::{SSTable, SSTableBuilder, SSTableReader};

const TABLE_PREFIX: &str = "sstable_";
const TABLE_EXT: &str = "sst";

/// Open readers for every table in a directory, newest first
///
/// Readers move their file cursor on every lookup, so reads take the write
/// side of `tables` as well; the lock is only held for in-memory index work
/// and a few small reads.
pub struct StorageManager {
    dir: PathBuf,
    tables: RwLock<Vec<SSTableReader>>,
    next_id: AtomicU64,
}

impl StorageManager {
    /// Open `dir` (created if missing) and validate every table in it
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;

        let mut ids = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }

            if path.extension().is_some_and(|ext| ext == "tmp") {
                tracing::warn!(path = %path.display(), "removing unfinished SSTable");
                fs::remove_file(&path)?;
            } else if let Some(id) = table_id(&path) {
                ids.push(id);
            }
        }
        ids.sort_unstable_by(|a, b| b.cmp(a));

        let tables = ids
            .iter()
            .map(|&id| SSTableReader::open(&table_path(dir, id)))
            .collect::<Result<Vec<_>>>()?;

        let next_id = ids.first().map_or(1, |&newest| newest + 1);
        tracing::debug!(dir = %dir.display(), tables = tables.len(), next_id, "storage opened");

        Ok(Self {
            dir: dir.to_path_buf(),
            tables: RwLock::new(tables),
            next_id: AtomicU64::new(next_id),
        })
    }

    /// Newest stored value for `key`
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let mut tables = self.tables.write();

        for table in tables.iter_mut().filter(|t| t.might_contain(key)) {
            if let Some(value) = table.get(key)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Newest value of each key under `prefix`, first `limit` keys per table
    ///
    /// The `limit` smallest matching keys overall are always present in the
    /// result; callers truncate after merging with newer data.
    pub fn scan_prefix(&self, prefix: &[u8], limit: usize) -> Result<BTreeMap<Vec<u8>, Vec<u8>>> {
        let mut merged = BTreeMap::new();
        if limit == 0 {
            return Ok(merged);
        }

        let mut tables = self.tables.write();
        for table in tables.iter_mut().filter(|t| t.might_contain_prefix(prefix)) {
            for (key, value) in table.scan_prefix(prefix, limit)? {
                merged.entry(key).or_insert(value);
            }
        }
        Ok(merged)
    }

    /// Write `memtable` out as the new newest table
    pub fn flush(&self, memtable: &MemTable) -> Result<SSTable> {
        if memtable.is_empty() {
            return Err(ItemDbError::Storage("refusing to flush an empty memtable".to_string()));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let final_path = table_path(&self.dir, id);
        let tmp_path = final_path.with_extension("sst.tmp");

        let mut builder = SSTableBuilder::new(&tmp_path)?;
        for (key, value) in memtable.iter() {
            builder.add(&key, &value)?;
        }
        let mut table = builder.finish()?;

        fs::rename(&tmp_path, &final_path)?;
        table.path = final_path;

        let reader = SSTableReader::open(&table.path)?;
        self.tables.write().insert(0, reader);

        tracing::info!(id, entries = table.entry_count, bytes = table.file_size, "flushed memtable");
        Ok(table)
    }

    pub fn sstable_count(&self) -> usize {
        self.tables.read().len()
    }

    /// Id the next flush will use
    pub fn next_sstable_id(&self) -> u64 {
        self.next_id.load(Ordering::SeqCst)
    }
}

fn table_path(dir: &Path, id: u64) -> PathBuf {
    dir.join(format!("{}{:06}.{}", TABLE_PREFIX, id, TABLE_EXT))
}

/// `sstable_000042.sst` → `Some(42)`
fn table_id(path: &Path) -> Option<u64> {
    if path.extension()? != TABLE_EXT {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .strip_prefix(TABLE_PREFIX)?
        .parse()
        .ok()
}
