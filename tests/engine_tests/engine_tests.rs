//! Engine Tests
//!
//! Tests verify:
//! - Put/get through the MemTable and after flushes
//! - Prefix scans merging MemTable and SSTables
//! - Size-triggered flushing, and writes surviving a failed flush
//! - Crash recovery from the WAL
//! - Concurrent readers and writers

use std::fs;
use std::sync::Arc;
use std::thread;
use itemdb::config::{Config, WalSyncStrategy};
use itemdb::Engine;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn open_engine(temp: &TempDir, memtable_limit: usize) -> Engine {
    let config = Config::builder()
        .data_dir(temp.path())
        .wal_sync_strategy(WalSyncStrategy::EveryWrite)
        .memtable_size_limit(memtable_limit)
        .build();
    Engine::open(config).unwrap()
}

fn keys(entries: &[(Vec<u8>, Vec<u8>)]) -> Vec<String> {
    entries
        .iter()
        .map(|(k, _)| String::from_utf8(k.clone()).unwrap())
        .collect()
}

// =============================================================================
// Basic Operations
// =============================================================================

#[test]
fn test_open_creates_layout() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(&temp, 1024 * 1024);

    assert!(temp.path().join("wal.log").exists());
    assert!(engine.storage_dir().is_dir());
    assert_eq!(engine.data_dir(), temp.path());
    assert_eq!(engine.sstable_count(), 0);
}

#[test]
fn test_put_get() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(&temp, 1024 * 1024);

    engine.put(b"abyssal whip", b"whip").unwrap();

    assert_eq!(engine.get(b"abyssal whip").unwrap(), Some(b"whip".to_vec()));
    assert_eq!(engine.get(b"missing").unwrap(), None);
    assert_eq!(engine.memtable_entry_count(), 1);
}

#[test]
fn test_put_overwrites() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(&temp, 1024 * 1024);

    engine.put(b"key", b"v1").unwrap();
    engine.flush().unwrap();
    engine.put(b"key", b"v2").unwrap();

    assert_eq!(engine.get(b"key").unwrap(), Some(b"v2".to_vec()));

    engine.flush().unwrap();
    assert_eq!(engine.get(b"key").unwrap(), Some(b"v2".to_vec()));
}

// =============================================================================
// Flush
// =============================================================================

#[test]
fn test_manual_flush() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(&temp, 1024 * 1024);

    engine.put(b"a", b"1").unwrap();
    engine.put(b"b", b"2").unwrap();
    engine.flush().unwrap();

    assert_eq!(engine.sstable_count(), 1);
    assert_eq!(engine.memtable_entry_count(), 0);
    assert_eq!(engine.memtable_size(), 0);
    assert_eq!(engine.get(b"a").unwrap(), Some(b"1".to_vec()));
}

#[test]
fn test_flush_empty_is_noop() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(&temp, 1024 * 1024);

    engine.flush().unwrap();
    assert_eq!(engine.sstable_count(), 0);
}

#[test]
fn test_size_triggered_flush() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(&temp, 64);

    for i in 0..10 {
        engine
            .put(format!("key{:02}", i).as_bytes(), &[b'x'; 20])
            .unwrap();
    }

    assert!(engine.sstable_count() >= 2);
    for i in 0..10 {
        assert!(engine.get(format!("key{:02}", i).as_bytes()).unwrap().is_some());
    }
}

#[test]
fn test_failed_size_triggered_flush_keeps_write() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(&temp, 1);
    let sstables = temp.path().join("sstables");

    engine.put(b"abyssal whip", b"v1").unwrap();
    assert_eq!(engine.sstable_count(), 1);

    fs::remove_dir_all(&sstables).unwrap();
    engine.put(b"dragon bones", b"v2").unwrap();

    assert_eq!(engine.get(b"dragon bones").unwrap(), Some(b"v2".to_vec()));
    assert_eq!(engine.memtable_entry_count(), 1);
    assert!(engine.flush().is_err());
    assert_eq!(engine.memtable_entry_count(), 1);

    fs::create_dir_all(&sstables).unwrap();
    engine.flush().unwrap();
    assert_eq!(engine.memtable_entry_count(), 0);
    assert_eq!(engine.get(b"dragon bones").unwrap(), Some(b"v2".to_vec()));
}

// =============================================================================
// Prefix Scan
// =============================================================================

#[test]
fn test_scan_prefix_across_memtable_and_sstables() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(&temp, 1024 * 1024);

    engine.put(b"abyssal dagger", b"old").unwrap();
    engine.put(b"abyssal whip", b"whip").unwrap();
    engine.flush().unwrap();
    engine.put(b"abyssal dagger", b"new").unwrap();
    engine.put(b"abyssal wand", b"wand").unwrap();
    engine.put(b"dragon bones", b"bones").unwrap();

    let hits = engine.scan_prefix(b"abyssal", 10).unwrap();

    assert_eq!(keys(&hits), vec!["abyssal dagger", "abyssal wand", "abyssal whip"]);
    assert_eq!(hits[0].1, b"new".to_vec());
}

#[test]
fn test_scan_prefix_limit() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(&temp, 1024 * 1024);

    for i in 0..10 {
        engine.put(format!("item {}", i).as_bytes(), b"v").unwrap();
        if i == 4 {
            engine.flush().unwrap();
        }
    }

    let hits = engine.scan_prefix(b"item", 3).unwrap();
    assert_eq!(keys(&hits), vec!["item 0", "item 1", "item 2"]);

    assert!(engine.scan_prefix(b"item", 0).unwrap().is_empty());
    assert_eq!(engine.scan_prefix(b"", 100).unwrap().len(), 10);
}

// =============================================================================
// Recovery
// =============================================================================

#[test]
fn test_recovery_after_crash() {
    let temp = TempDir::new().unwrap();

    {
        let engine = open_engine(&temp, 1024 * 1024);
        engine.put(b"abyssal whip", b"whip").unwrap();
        engine.put(b"dragon bones", b"bones").unwrap();
        // Dropped without close: data only lives in the WAL
    }

    let engine = open_engine(&temp, 1024 * 1024);

    assert_eq!(engine.get(b"abyssal whip").unwrap(), Some(b"whip".to_vec()));
    assert_eq!(engine.get(b"dragon bones").unwrap(), Some(b"bones".to_vec()));
    assert_eq!(engine.sstable_count(), 1);
    assert_eq!(engine.memtable_entry_count(), 0);
}

#[test]
fn test_close_then_reopen() {
    let temp = TempDir::new().unwrap();

    {
        let engine = open_engine(&temp, 1024 * 1024);
        engine.put(b"key", b"value").unwrap();
        engine.close().unwrap();
    }

    let engine = open_engine(&temp, 1024 * 1024);
    assert_eq!(engine.get(b"key").unwrap(), Some(b"value".to_vec()));
    assert_eq!(engine.scan_prefix(b"k", 10).unwrap().len(), 1);
}

#[test]
fn test_recovery_ignores_torn_wal_tail() {
    let temp = TempDir::new().unwrap();

    {
        let engine = open_engine(&temp, 1024 * 1024);
        engine.put(b"good", b"value").unwrap();
    }

    {
        use std::io::Write;
        let mut wal = std::fs::OpenOptions::new()
            .append(true)
            .open(temp.path().join("wal.log"))
            .unwrap();
        wal.write_all(&[0xFF; 6]).unwrap();
    }

    let engine = open_engine(&temp, 1024 * 1024);
    assert_eq!(engine.get(b"good").unwrap(), Some(b"value".to_vec()));
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_concurrent_writers_and_readers() {
    let temp = TempDir::new().unwrap();
    let engine = Arc::new(open_engine(&temp, 4 * 1024));
    let mut handles = vec![];

    for t in 0..4 {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            for i in 0..100 {
                let key = format!("t{}-{:03}", t, i);
                engine.put(key.as_bytes(), key.as_bytes()).unwrap();
                assert_eq!(engine.get(key.as_bytes()).unwrap(), Some(key.into_bytes()));
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(engine.scan_prefix(b"t", 1000).unwrap().len(), 400);
    assert_eq!(engine.scan_prefix(b"t3-", 1000).unwrap().len(), 100);
}
