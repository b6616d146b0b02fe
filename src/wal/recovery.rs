//! Startup scan of the WAL: keep the intact prefix, cut off the rest.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::{ItemDbError, Result};
use super::{WalEntry, WalReader};

/// Recovery entry points
pub struct WalRecovery;

/// What a recovery scan found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    pub entries_recovered: u64,

    /// 1 when the scan stopped on a checksum failure, else 0
    pub entries_corrupted: u64,

    /// LSN of the last intact record, 0 for an empty log
    pub last_lsn: u64,

    /// Bytes past the intact prefix exist (and are cut by `recover`)
    pub was_truncated: bool,
}

impl WalRecovery {
    /// Return the intact records of `path`
    ///
    /// Reads entries until the first torn or corrupted one, then cuts the
    /// file back to the end of the last good entry.
    pub fn recover(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let (entries, result, good_len) = Self::scan(path)?;

        if result.was_truncated {
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(good_len)?;
            file.sync_all()?;
            tracing::warn!(
                path = %path.display(),
                kept_bytes = good_len,
                corrupted = result.entries_corrupted,
                "truncated damaged WAL tail"
            );
        }

        Ok((entries, result))
    }

    fn scan(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult, u64)> {
        let mut reader = WalReader::open(path)?;
        let mut entries = Vec::new();
        let mut result = RecoveryResult {
            entries_recovered: 0,
            entries_corrupted: 0,
            last_lsn: 0,
            was_truncated: false,
        };

        loop {
            match reader.next_entry() {
                Ok(Some(entry)) => {
                    result.entries_recovered += 1;
                    result.last_lsn = entry.lsn;
                    entries.push(entry);
                }
                Ok(None) => {
                    // Leftover bytes after the last entry are a torn append
                    result.was_truncated = reader.position() < reader.file_len();
                    break;
                }
                Err(ItemDbError::WalCorruption(reason)) => {
                    tracing::warn!(lsn = result.last_lsn + 1, %reason, "corrupted WAL entry");
                    result.entries_corrupted += 1;
                    result.was_truncated = true;
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        Ok((entries, result, reader.position()))
    }
}
