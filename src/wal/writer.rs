//! WAL Writer
//!
//! Handles appending entries to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::Result;
use super::{Operation, WalEntry, WalReader};

/// Writes entries to the WAL file
pub struct WalWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    /// LSN that the next append will receive
    next_lsn: u64,
    sync_strategy: WalSyncStrategy,
    /// Entries appended since the last fsync
    uncommitted: usize,
}

impl WalWriter {
    /// Open or create a WAL file
    ///
    /// Existing entries are kept; LSNs continue after the last readable one.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        let last_lsn = WalReader::open(path)?
            .entries()
            .map_while(Result::ok)
            .last()
            .map_or(0, |entry| entry.lsn);

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            next_lsn: last_lsn + 1,
            sync_strategy,
            uncommitted: 0,
        })
    }

    /// Append an operation to the WAL, returning the LSN it was given
    pub fn append(&mut self, operation: Operation) -> Result<u64> {
        let lsn = self.next_lsn;
        let bytes = WalEntry::new(lsn, operation).serialize()?;

        self.writer.write_all(&bytes)?;
        self.next_lsn += 1;
        self.uncommitted += 1;

        match self.sync_strategy {
            WalSyncStrategy::EveryWrite => self.sync()?,
            WalSyncStrategy::EveryNEntries { count } => {
                if self.uncommitted >= count {
                    self.sync()?;
                }
            }
        }

        Ok(lsn)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        self.uncommitted = 0;
        Ok(())
    }

    /// Discard every entry (called once their data is durable elsewhere)
    pub fn truncate(&mut self) -> Result<()> {
        self.writer.flush()?;
        let file = self.writer.get_ref();
        file.set_len(0)?;
        file.sync_all()?;

        self.next_lsn = 1;
        self.uncommitted = 0;
        Ok(())
    }

    /// Get the LSN the next append will use
    pub fn current_lsn(&self) -> u64 {
        self.next_lsn
    }

    /// Entries appended but not yet fsynced
    pub fn uncommitted_count(&self) -> usize {
        self.uncommitted
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
