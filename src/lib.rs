//! # ShelfKV
//!
//! Library circulation records on a small crash-safe key-value store:
//! - Books, members and loan transactions as keyed JSON record lists
//! - A circulation manager that keeps book status and open loans in step
//! - Write-Ahead Logging (WAL) with CRC32 framing and torn-write recovery
//! - Dashboard counters (issued, available, overdue)
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  CLI (shelfkv-cli)                          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     Library                                 │
//! │        (books / members / issue / return / stats)           │
//! └──────────┬──────────────────────────────┬───────────────────┘
//!            │                              │
//!            ▼                              ▼
//!   ┌──────────────────┐          ┌──────────────────┐
//!   │ Circulation      │─────────▶│  Collection<T>   │
//!   │ Manager          │          │  (JSON arrays)   │
//!   └──────────────────┘          └────────┬─────────┘
//!                                          │ KvStore
//!                       ┌──────────────────┴──────────┐
//!                       ▼                             ▼
//!               ┌─────────────┐               ┌─────────────┐
//!               │  LogStore   │               │ MemoryStore │
//!               │ WAL+MemTable│               │  MemTable   │
//!               └─────────────┘               └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod memtable;
pub mod store;

pub mod model;
pub mod repository;
pub mod ids;
pub mod clock;
pub mod circulation;
pub mod dashboard;
pub mod library;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ShelfError, Result};
pub use config::Config;
pub use library::Library;
pub use circulation::{CirculationManager, IssueRequest};
pub use model::{Book, BookStatus, Member, Transaction, TransactionStatus};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of ShelfKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
