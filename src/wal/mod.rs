//! Write-ahead log
//!
//! Every item write is appended here before it touches the memtable, so a
//! crash loses nothing that `put` acknowledged. Once a flush has made the
//! memtable durable in an SSTable the log is truncated and LSNs restart at 1.
//!
//! ```text
//! ┌──────────┬───────────┬───────────┬──────────────────────────────┐
//! │ lsn u64  │ crc32 u32 │ len u32   │ bincode(WalEntry), len bytes │  × N
//! └──────────┴───────────┴───────────┴──────────────────────────────┘
//! ```
//!
//! A record cut short at the end of the file is a torn append and ends the
//! log. A record whose checksum does not match is corruption; recovery keeps
//! everything before it and cuts the file there.

mod entry;
mod reader;
mod recovery;
mod writer;

pub use entry::{Operation, WalEntry, HEADER_SIZE};
pub use reader::{WalIterator, WalReader};
pub use recovery::{RecoveryResult, WalRecovery};
pub use writer::WalWriter;
