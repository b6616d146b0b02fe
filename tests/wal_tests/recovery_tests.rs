//! Tests for WAL Recovery
//!
//! These tests verify:
//! - Clean and empty logs recover everything
//! - Torn tails are cut back to the last good entry
//! - A CRC mismatch ends recovery at the damaged entry

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use itemdb::config::WalSyncStrategy;
use itemdb::wal::{Operation, WalEntry, WalReader, WalRecovery, WalWriter};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    (temp_dir, wal_path)
}

fn record(lsn: u64, name: &str) -> WalEntry {
    WalEntry::new(
        lsn,
        Operation::Put {
            key: name.to_lowercase().into_bytes(),
            value: format!("record for {}", name).into_bytes(),
        },
    )
}

fn write_via_writer(path: &PathBuf, names: &[&str]) {
    let mut writer = WalWriter::open(path, WalSyncStrategy::EveryWrite).unwrap();
    for name in names {
        writer
            .append(Operation::Put {
                key: name.to_lowercase().into_bytes(),
                value: name.as_bytes().to_vec(),
            })
            .unwrap();
    }
}

fn write_bytes(path: &PathBuf, chunks: &[Vec<u8>]) {
    let mut file = File::create(path).unwrap();
    for chunk in chunks {
        file.write_all(chunk).unwrap();
    }
    file.sync_all().unwrap();
}

fn file_len(path: &PathBuf) -> u64 {
    fs::metadata(path).unwrap().len()
}

// =============================================================================
// Clean Logs
// =============================================================================

#[test]
fn test_recover_empty_file() {
    let (_temp, wal_path) = setup_temp_wal();
    File::create(&wal_path).unwrap();

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert!(entries.is_empty());
    assert_eq!(result.entries_recovered, 0);
    assert_eq!(result.entries_corrupted, 0);
    assert_eq!(result.last_lsn, 0);
    assert!(!result.was_truncated);
}

#[test]
fn test_recover_clean_log() {
    let (_temp, wal_path) = setup_temp_wal();
    write_via_writer(&wal_path, &["Abyssal whip", "Dragon bones", "Rune platebody"]);
    let before = file_len(&wal_path);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(entries.len(), 3);
    assert_eq!(result.entries_recovered, 3);
    assert_eq!(result.last_lsn, 3);
    assert!(!result.was_truncated);
    assert_eq!(file_len(&wal_path), before);

    let Operation::Put { key, value } = &entries[1].operation;
    assert_eq!(key, b"dragon bones");
    assert_eq!(value, b"Dragon bones");
}

// =============================================================================
// Torn Tails
// =============================================================================

#[test]
fn test_recover_truncates_partial_header() {
    let (_temp, wal_path) = setup_temp_wal();
    let first = record(1, "Abyssal whip").serialize().unwrap();
    let good_len = first.len() as u64;
    write_bytes(&wal_path, &[first, vec![0xAB; 5]]);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(result.entries_corrupted, 0);
    assert!(result.was_truncated);
    assert_eq!(file_len(&wal_path), good_len);
}

#[test]
fn test_recover_truncates_partial_payload() {
    let (_temp, wal_path) = setup_temp_wal();
    let first = record(1, "Abyssal whip").serialize().unwrap();
    let second = record(2, "Dragon bones").serialize().unwrap();
    let good_len = first.len() as u64;
    let torn = second[..second.len() - 3].to_vec();
    write_bytes(&wal_path, &[first, torn]);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(result.last_lsn, 1);
    assert!(result.was_truncated);
    assert_eq!(file_len(&wal_path), good_len);
}

// =============================================================================
// Corruption
// =============================================================================

#[test]
fn test_recover_stops_at_crc_mismatch() {
    let (_temp, wal_path) = setup_temp_wal();
    let first = record(1, "Abyssal whip").serialize().unwrap();
    let mut second = record(2, "Dragon bones").serialize().unwrap();
    let third = record(3, "Rune platebody").serialize().unwrap();
    let good_len = first.len() as u64;
    let last = second.len() - 1;
    second[last] ^= 0x55;
    write_bytes(&wal_path, &[first, second, third]);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(result.entries_recovered, 1);
    assert_eq!(result.entries_corrupted, 1);
    assert_eq!(result.last_lsn, 1);
    assert!(result.was_truncated);
    assert_eq!(file_len(&wal_path), good_len);
}

#[test]
fn test_recover_corrupt_first_entry_empties_log() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut first = record(1, "Abyssal whip").serialize().unwrap();
    first[20] ^= 0xFF;
    write_bytes(&wal_path, &[first]);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert!(entries.is_empty());
    assert_eq!(result.entries_corrupted, 1);
    assert_eq!(file_len(&wal_path), 0);
}

#[test]
fn test_writer_resumes_after_recovery() {
    let (_temp, wal_path) = setup_temp_wal();
    let first = record(1, "Abyssal whip").serialize().unwrap();
    write_bytes(&wal_path, &[first, vec![0u8; 7]]);

    WalRecovery::recover(&wal_path).unwrap();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    assert_eq!(
        writer
            .append(Operation::Put { key: b"k".to_vec(), value: b"v".to_vec() })
            .unwrap(),
        2
    );
    drop(writer);

    let reader = WalReader::open(&wal_path).unwrap();
    let lsns: Vec<u64> = reader.entries().map(|e| e.unwrap().lsn).collect();
    assert_eq!(lsns, vec![1, 2]);
}
