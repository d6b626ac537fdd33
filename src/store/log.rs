//! Log-structured store
//!
//! A WAL-backed key-value store: the log is the only file, and the
//! memtable is its materialized view.
//!
//! ## Write path
//! 1. Acquire the WAL lock (serializes writers)
//! 2. Append the operation to the WAL (fsync per strategy)
//! 3. Apply it to the memtable
//! 4. Compact if the log has outgrown the threshold
//!
//! ## Open path
//! 1. Recover the WAL, truncating a torn or corrupted tail
//! 2. Replay entries in LSN order into the memtable
//! 3. Reopen the WAL for append at `last_lsn + 1`

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::config::{Config, WalSyncStrategy};
use crate::error::Result;
use crate::memtable::MemTable;
use crate::wal::{Operation, RecoveryResult, WalEntry, WalRecovery, WalWriter};

use super::KvStore;

/// Outcome of a log compaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactionResult {
    /// Entries in the log before compaction
    pub entries_before: u64,

    /// Entries in the rewritten log (one per live key)
    pub entries_after: u64,
}

/// File-backed store built on the WAL
pub struct LogStore {
    /// Directory holding the log
    data_dir: PathBuf,

    /// Path of the log file
    wal_path: PathBuf,

    /// Append handle; its lock also serializes writers
    wal: Mutex<WalWriter>,

    /// Live key/value state
    memtable: MemTable,

    sync_strategy: WalSyncStrategy,

    /// Log size that triggers compaction on write (0 disables)
    compaction_threshold: u64,
}

impl LogStore {
    const WAL_FILENAME: &'static str = "store.wal";
    const COMPACT_SUFFIX: &'static str = "compact";

    /// The log must be at least this many times the live data to compact
    const LIVE_RATIO: u64 = 2;

    /// Open or create a store in `data_dir`
    ///
    /// Automatic compaction is off; see [`LogStore::with_compaction_threshold`].
    pub fn open(data_dir: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        fs::create_dir_all(data_dir)?;
        let wal_path = data_dir.join(Self::WAL_FILENAME);

        let memtable = MemTable::new();
        let next_lsn = if wal_path.exists() {
            let (entries, recovery) = WalRecovery::recover(&wal_path)?;

            if recovery.entries_recovered > 0 || recovery.entries_corrupted > 0 {
                tracing::info!(
                    recovered = recovery.entries_recovered,
                    corrupted = recovery.entries_corrupted,
                    last_lsn = recovery.last_lsn,
                    truncated = recovery.was_truncated,
                    "WAL recovery complete"
                );
            }

            for entry in entries {
                tracing::trace!(lsn = entry.lsn, key = entry.operation.key(), "replay");
                match entry.operation {
                    Operation::Set { key, value } => {
                        memtable.put(key, value);
                    }
                    Operation::Remove { key } => {
                        memtable.remove(&key);
                    }
                }
            }

            recovery.last_lsn + 1
        } else {
            1
        };

        let wal = WalWriter::open_at(&wal_path, sync_strategy, next_lsn)?;

        tracing::debug!(
            path = %wal_path.display(),
            keys = memtable.entry_count(),
            log_bytes = wal.len(),
            next_lsn,
            "opened log store"
        );

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            wal_path,
            wal: Mutex::new(wal),
            memtable,
            sync_strategy,
            compaction_threshold: 0,
        })
    }

    /// Open with the storage settings of `config`
    pub fn open_with_config(config: &Config) -> Result<Self> {
        Ok(Self::open(&config.data_dir, config.wal_sync_strategy)?
            .with_compaction_threshold(config.compaction_threshold))
    }

    /// Compact on write once the log reaches `bytes` (0 disables)
    pub fn with_compaction_threshold(mut self, bytes: u64) -> Self {
        self.compaction_threshold = bytes;
        self
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get the WAL file path
    pub fn wal_path(&self) -> &Path {
        &self.wal_path
    }

    /// LSN the next write will receive
    pub fn current_lsn(&self) -> u64 {
        self.wal.lock().current_lsn()
    }

    /// Size of the log in bytes
    pub fn log_len(&self) -> u64 {
        self.wal.lock().len()
    }

    /// Number of live keys
    pub fn key_count(&self) -> usize {
        self.memtable.entry_count()
    }

    /// Sync and close the store
    pub fn close(self) -> Result<()> {
        self.wal.lock().sync()
    }

    fn compact_path(&self) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", Self::WAL_FILENAME, Self::COMPACT_SUFFIX))
    }

    fn should_compact(&self, log_len: u64, live_bytes: usize) -> bool {
        self.compaction_threshold > 0
            && log_len >= self.compaction_threshold
            && log_len >= (live_bytes as u64).saturating_mul(Self::LIVE_RATIO)
    }

    /// Compact if the log has outgrown the threshold; the WAL lock is held
    fn maybe_compact(&self, wal: &mut WalWriter, live_bytes: usize) -> Result<()> {
        let log_len = wal.len();
        if self.should_compact(log_len, live_bytes) {
            tracing::info!(
                log_bytes = log_len,
                live_bytes,
                threshold = self.compaction_threshold,
                "log over threshold, compacting"
            );
            self.compact_locked(wal)?;
        }
        Ok(())
    }

    /// Rewrite the log as one `Set` per live key
    ///
    /// The new log is written beside the old one, fsynced, then renamed
    /// over it, so a crash leaves either the old or the new log intact.
    fn compact_locked(&self, wal: &mut WalWriter) -> Result<CompactionResult> {
        wal.sync()?;

        let entries_before = wal.current_lsn().saturating_sub(1);
        let bytes_before = wal.len();
        let live = self.memtable.snapshot();
        let tmp_path = self.compact_path();

        {
            let mut out = BufWriter::new(File::create(&tmp_path)?);
            for (lsn, (key, value)) in (1u64..).zip(live.iter()) {
                let entry = WalEntry::new(
                    lsn,
                    Operation::Set {
                        key: key.clone(),
                        value: value.clone(),
                    },
                );
                out.write_all(&entry.serialize()?)?;
            }
            out.flush()?;
            out.get_ref().sync_all()?;
        }

        fs::rename(&tmp_path, &self.wal_path)?;

        let entries_after = live.len() as u64;
        *wal = WalWriter::open_at(&self.wal_path, self.sync_strategy, entries_after + 1)?;

        tracing::info!(
            entries_before,
            entries_after,
            bytes_before,
            bytes_after = wal.len(),
            "compacted log"
        );

        Ok(CompactionResult {
            entries_before,
            entries_after,
        })
    }
}

impl KvStore for LogStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.memtable.get(key))
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        let mut wal = self.wal.lock();

        let lsn = wal.append(Operation::Set {
            key: key.to_string(),
            value: value.clone(),
        })?;
        tracing::debug!(key, lsn, bytes = value.len(), "set");

        let live_bytes = self.memtable.put(key.to_string(), value);
        self.maybe_compact(&mut wal, live_bytes)
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let mut wal = self.wal.lock();

        if !self.memtable.contains_key(key) {
            return Ok(false);
        }

        let lsn = wal.append(Operation::Remove {
            key: key.to_string(),
        })?;
        tracing::debug!(key, lsn, "remove");

        let removed = self.memtable.remove(key);
        self.maybe_compact(&mut wal, self.memtable.size())?;
        Ok(removed)
    }

    fn compact(&self) -> Result<CompactionResult> {
        let mut wal = self.wal.lock();
        self.compact_locked(&mut wal)
    }

    fn verify(&self) -> Result<Option<RecoveryResult>> {
        let mut wal = self.wal.lock();
        wal.sync()?;
        Ok(Some(WalRecovery::verify(&self.wal_path)?))
    }

    fn sync(&self) -> Result<()> {
        self.wal.lock().sync()
    }
}
