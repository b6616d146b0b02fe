//! Write buffer in front of the SSTables.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

/// Sorted map of the writes since the last flush
pub struct MemTable {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    /// Approximate size in bytes (keys + values)
    size: AtomicUsize,
    entry_count: AtomicUsize,
}

impl MemTable {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            size: AtomicUsize::new(0),
            entry_count: AtomicUsize::new(0),
        }
    }

    /// Latest value for `key`
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.read().get(key).cloned()
    }

    /// Insert or replace a value (write lock)
    ///
    /// Returns the approximate table size after the write.
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) -> usize {
        let mut data = self.data.write();
        let value_len = value.len();
        let added = key.len() + value_len;

        match data.insert(key, value) {
            Some(old) => {
                // Key bytes are unchanged; only the value size moves
                self.size.fetch_sub(old.len(), Ordering::SeqCst);
                self.size.fetch_add(value_len, Ordering::SeqCst);
            }
            None => {
                self.entry_count.fetch_add(1, Ordering::SeqCst);
                self.size.fetch_add(added, Ordering::SeqCst);
            }
        }

        self.size.load(Ordering::SeqCst)
    }

    /// Entries whose key starts with `prefix`, in key order, at most `limit`
    pub fn scan_prefix(&self, prefix: &[u8], limit: usize) -> Vec<(Vec<u8>, Vec<u8>)> {
        let data = self.data.read();
        data.range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .take(limit)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Sum of key and value lengths
    pub fn size(&self) -> usize {
        self.size.load(Ordering::SeqCst)
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }

    /// Check if should flush (size >= limit)
    pub fn should_flush(&self, size_limit: usize) -> bool {
        self.size() >= size_limit
    }

    /// Snapshot of all entries in sorted key order (for flush)
    pub fn iter(&self) -> MemTableIterator {
        let snapshot: Vec<_> = self
            .data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        MemTableIterator {
            inner: snapshot.into_iter(),
        }
    }

    /// Drop everything; only called once a flush has been published
    pub fn clear(&self) {
        let mut data = self.data.write();
        data.clear();
        self.size.store(0, Ordering::SeqCst);
        self.entry_count.store(0, Ordering::SeqCst);
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a MemTable snapshot
pub struct MemTableIterator {
    inner: std::vec::IntoIter<(Vec<u8>, Vec<u8>)>,
}

impl Iterator for MemTableIterator {
    type Item = (Vec<u8>, Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}
