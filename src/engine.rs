//! Ordered key-value engine
//!
//! One engine backs one bucket directory:
//!
//! ```text
//! {dir}/wal.log       every acknowledged write not yet in an SSTable
//! {dir}/sstables/     immutable sorted tables, newest wins
//! ```
//!
//! Writers are serialized; readers never take the writer lock. A flush
//! publishes its SSTable before the memtable is cleared, so a read that
//! misses the memtable during a flush still finds the value on disk.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::Result;
use crate::memtable::MemTable;
use crate::storage::StorageManager;
use crate::wal::{Operation, WalRecovery, WalWriter};

const WAL_FILE: &str = "wal.log";
const SSTABLE_DIR: &str = "sstables";

/// WAL + memtable + SSTables behind a put/get/scan API
pub struct Engine {
    config: Config,
    storage_dir: PathBuf,
    wal: Mutex<WalWriter>,
    memtable: MemTable,
    storage: StorageManager,
    /// Held for the whole of a put or flush
    writer: Mutex<()>,
}

impl Engine {
    /// Open the engine rooted at `config.data_dir`, creating it if needed
    ///
    /// Whatever the WAL still holds is replayed and flushed into a fresh
    /// SSTable before the log is reset, so the engine always starts with an
    /// empty memtable and an empty log.
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let storage_dir = config.data_dir.join(SSTABLE_DIR);
        let wal_path = config.data_dir.join(WAL_FILE);

        let storage = StorageManager::open(&storage_dir)?;
        let memtable = MemTable::new();

        if wal_path.exists() {
            Self::replay(&wal_path, &memtable)?;
            if !memtable.is_empty() {
                tracing::info!(entries = memtable.entry_count(), "flushing replayed WAL entries");
                storage.flush(&memtable)?;
                memtable.clear();
            }
        }

        let mut wal = WalWriter::open(&wal_path, config.wal_sync_strategy)?;
        wal.truncate()?;

        Ok(Self {
            config,
            storage_dir,
            wal: Mutex::new(wal),
            memtable,
            storage,
            writer: Mutex::new(()),
        })
    }

    fn replay(wal_path: &Path, memtable: &MemTable) -> Result<()> {
        let (entries, stats) = WalRecovery::recover(wal_path)?;

        if stats.entries_recovered > 0 || stats.entries_corrupted > 0 {
            tracing::info!(
                recovered = stats.entries_recovered,
                corrupted = stats.entries_corrupted,
                last_lsn = stats.last_lsn,
                "replayed WAL"
            );
        }

        for entry in entries {
            let Operation::Put { key, value } = entry.operation;
            memtable.put(key, value);
        }
        Ok(())
    }

    /// Current value for `key`, memtable first
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.memtable.get(key) {
            Some(value) => Ok(Some(value)),
            None => self.storage.get(key),
        }
    }

    /// Log then apply one write; flushes once the memtable reaches its limit
    ///
    /// The write is committed once the WAL append and memtable insert have
    /// both succeeded. A failed WAL append leaves the memtable untouched. A
    /// failed size-triggered flush is only logged: the entries stay in the
    /// memtable and WAL, and the next put, flush or close retries.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let _writer = self.writer.lock();

        self.wal.lock().append(Operation::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        })?;
        self.memtable.put(key.to_vec(), value.to_vec());

        if self.memtable.should_flush(self.config.memtable_size_limit) {
            if let Err(e) = self.flush_locked() {
                tracing::warn!(
                    error = %e,
                    entries = self.memtable.entry_count(),
                    "size-triggered flush failed, keeping entries in memtable"
                );
            }
        }
        Ok(())
    }

    /// Up to `limit` entries whose key starts with `prefix`, in key order
    pub fn scan_prefix(&self, prefix: &[u8], limit: usize) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        // Memtable is read first; anything flushed after this point is also on disk
        let recent = self.memtable.scan_prefix(prefix, limit);
        let mut merged = self.storage.scan_prefix(prefix, limit)?;
        merged.extend(recent);

        Ok(merged.into_iter().take(limit).collect())
    }

    /// Move the memtable into a new SSTable regardless of its size
    pub fn flush(&self) -> Result<()> {
        let _writer = self.writer.lock();
        self.flush_locked()
    }

    fn flush_locked(&self) -> Result<()> {
        if self.memtable.is_empty() {
            return Ok(());
        }

        self.storage.flush(&self.memtable)?;
        self.memtable.clear();
        self.wal.lock().truncate()
    }

    /// Flush and sync, consuming the engine
    pub fn close(self) -> Result<()> {
        self.flush()?;
        self.wal.lock().sync()
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn memtable_size(&self) -> usize {
        self.memtable.size()
    }

    pub fn memtable_entry_count(&self) -> usize {
        self.memtable.entry_count()
    }

    pub fn sstable_count(&self) -> usize {
        self.storage.sstable_count()
    }
}
