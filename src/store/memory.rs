//! In-memory store

use crate::error::Result;
use crate::memtable::MemTable;

use super::KvStore;

/// Volatile store backed by a single memtable
#[derive(Default)]
pub struct MemoryStore {
    table: MemTable,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys held
    pub fn len(&self) -> usize {
        self.table.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.table.get(key))
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        self.table.put(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.table.remove(key))
    }
}
