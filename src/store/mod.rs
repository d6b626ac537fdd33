//! Store Module
//!
//! The persistence substrate: a string key-value store whose values are
//! JSON documents.
//!
//! ## Implementations
//! - [`MemoryStore`]: volatile, for tests and throwaway sessions
//! - [`LogStore`]: file-backed; every write goes through the WAL first and
//!   the live state is rebuilt from the log on open
//!
//! ## Semantics
//! - Absent key reads as `None`
//! - Last write wins; there are no multi-key transactions

mod log;
mod memory;

pub use log::{CompactionResult, LogStore};
pub use memory::MemoryStore;

use crate::error::Result;
use crate::wal::RecoveryResult;

/// A key-value substrate holding serialized record lists
pub trait KvStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    fn set(&self, key: &str, value: String) -> Result<()>;

    /// Drop `key`; returns whether it was present
    fn remove(&self, key: &str) -> Result<bool>;

    /// Rewrite backing storage down to the live state
    fn compact(&self) -> Result<CompactionResult> {
        Ok(CompactionResult::default())
    }

    /// Integrity report for the backing storage, if it has one
    fn verify(&self) -> Result<Option<RecoveryResult>> {
        Ok(None)
    }

    /// Flush pending writes to durable storage
    fn sync(&self) -> Result<()> {
        Ok(())
    }
}
