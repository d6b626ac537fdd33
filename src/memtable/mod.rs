//! MemTable Module
//!
//! In-memory view of the record store, rebuilt from the WAL on open.
//!
//! ## Responsibilities
//! - Fast reads and writes in memory
//! - Single-writer/multi-reader access pattern
//! - Track approximate size
//! - Ordered iteration for log compaction
//!
//! ## Data Structure Choice
//! BTreeMap wrapped in RwLock: ordered keys make compacted logs
//! deterministic, and the store holds a handful of keys.

mod table;

pub use table::MemTable;
