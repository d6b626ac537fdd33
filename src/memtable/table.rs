//! MemTable implementation
//!
//! BTreeMap-based memtable with RwLock for concurrency.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

/// In-memory table of the live key/value pairs
pub struct MemTable {
    data: RwLock<BTreeMap<String, String>>,

    /// Approximate size in bytes (keys + values)
    size: AtomicUsize,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            size: AtomicUsize::new(0),
        }
    }

    /// Get a value by key (read lock)
    pub fn get(&self, key: &str) -> Option<String> {
        self.data.read().get(key).cloned()
    }

    /// Put a key-value pair (write lock), returning the new approximate size
    pub fn put(&self, key: String, value: String) -> usize {
        let mut data = self.data.write();
        let added = key.len() + value.len();

        match data.insert(key.clone(), value) {
            Some(old) => {
                let removed = key.len() + old.len();
                self.adjust_size(added, removed)
            }
            None => self.adjust_size(added, 0),
        }
    }

    /// Remove a key (write lock); returns whether it was present
    pub fn remove(&self, key: &str) -> bool {
        let mut data = self.data.write();
        match data.remove(key) {
            Some(old) => {
                self.adjust_size(0, key.len() + old.len());
                true
            }
            None => false,
        }
    }

    /// Check whether a key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Acquire)
    }

    /// Get entry count
    pub fn entry_count(&self) -> usize {
        self.data.read().len()
    }

    /// Check if the memtable holds no keys
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Copy out all entries in sorted key order
    pub fn snapshot(&self) -> Vec<(String, String)> {
        self.data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// All keys in sorted order
    pub fn keys(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }

    /// Clear all entries
    pub fn clear(&self) {
        let mut data = self.data.write();
        data.clear();
        self.size.store(0, Ordering::Release);
    }

    // Called with the write lock held, so the two steps cannot interleave.
    fn adjust_size(&self, added: usize, removed: usize) -> usize {
        let current = self.size.load(Ordering::Acquire);
        let next = current.saturating_add(added).saturating_sub(removed);
        self.size.store(next, Ordering::Release);
        next
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}
