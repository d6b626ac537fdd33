//! Configuration for ShelfKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a ShelfKV library instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     └── store.wal        (record log)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync WAL
    pub wal_sync_strategy: WalSyncStrategy,

    /// Log size in bytes past which a write compacts the log (0 disables)
    ///
    /// Compaction also waits until the log is at least twice the live data,
    /// so a large live set does not compact on every write.
    pub compaction_threshold: u64,

    // -------------------------------------------------------------------------
    // Circulation Configuration
    // -------------------------------------------------------------------------
    /// Days between issue date and due date
    pub loan_period_days: u32,

    /// Refuse to issue a book that already has an open transaction
    pub reject_double_issue: bool,

    /// Refuse to issue unless both the book and the member exist
    pub verify_references: bool,

    /// Refuse to delete books on loan and members with open loans
    pub guard_deletes: bool,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./shelfkv_data"),
            wal_sync_strategy: WalSyncStrategy::EveryWrite,
            compaction_threshold: 4 * 1024 * 1024, // 4 MB
            loan_period_days: 14,
            reject_double_issue: true,
            verify_references: false,
            guard_deletes: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the log size that triggers automatic compaction (0 disables)
    pub fn compaction_threshold(mut self, bytes: u64) -> Self {
        self.config.compaction_threshold = bytes;
        self
    }

    /// Set the loan period (in days)
    pub fn loan_period_days(mut self, days: u32) -> Self {
        self.config.loan_period_days = days;
        self
    }

    /// Reject or allow issuing a book that is already out
    pub fn reject_double_issue(mut self, reject: bool) -> Self {
        self.config.reject_double_issue = reject;
        self
    }

    /// Require the book and member to exist before issuing
    pub fn verify_references(mut self, verify: bool) -> Self {
        self.config.verify_references = verify;
        self
    }

    /// Guard book/member deletion against open loans
    pub fn guard_deletes(mut self, guard: bool) -> Self {
        self.config.guard_deletes = guard;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
