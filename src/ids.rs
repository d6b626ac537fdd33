//! Identifier generation
//!
//! - Transactions get time-based ids: milliseconds since the Unix epoch as
//!   a decimal string, bumped so that ids from one generator are strictly
//!   increasing even within the same millisecond.
//! - Books and members get prefixed sequential ids (`B001`, `M002`).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Result, ShelfError};

/// Produces unique transaction ids
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Wall-clock millisecond ids
///
/// Ids are strictly increasing per generator only. Two generators in the
/// same process can hand out the same millisecond, so a store should have
/// one writer; [`ClockIdGenerator::resuming_after`] keeps a reopened store
/// from reusing ids issued by an earlier run with a faster clock.
#[derive(Debug, Default)]
pub struct ClockIdGenerator {
    last: AtomicU64,
}

impl ClockIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A generator whose next id is greater than `last`
    pub fn resuming_after(last: u64) -> Self {
        Self {
            last: AtomicU64::new(last),
        }
    }

    fn now_millis() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

impl IdGenerator for ClockIdGenerator {
    fn next_id(&self) -> String {
        let now = Self::now_millis();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(prev.saturating_add(1));
            match self
                .last
                .compare_exchange_weak(prev, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return candidate.to_string(),
                Err(actual) => prev = actual,
            }
        }
    }
}

/// Counter-based ids, for reproducible runs
#[derive(Debug)]
pub struct SequenceIdGenerator {
    next: AtomicU64,
}

impl SequenceIdGenerator {
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequenceIdGenerator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdGenerator for SequenceIdGenerator {
    fn next_id(&self) -> String {
        self.next.fetch_add(1, Ordering::Relaxed).to_string()
    }
}

/// Next `{prefix}{NNN}` id after the highest numeric suffix among `ids`
///
/// Ids that do not carry `prefix` followed by digits are ignored.
///
/// # Errors
/// `IdSpaceExhausted` when the highest suffix is already `u64::MAX`.
///
/// ```
/// use shelfkv::ids::next_prefixed_id;
///
/// assert_eq!(next_prefixed_id("B", Vec::<&str>::new()).unwrap(), "B001");
/// assert_eq!(next_prefixed_id("B", ["B001", "B007", "X99"]).unwrap(), "B008");
/// ```
pub fn next_prefixed_id<I, S>(prefix: &str, ids: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let max = highest_suffix(prefix, ids).unwrap_or(0);
    let next = max
        .checked_add(1)
        .ok_or_else(|| ShelfError::IdSpaceExhausted(prefix.to_string()))?;

    Ok(format!("{}{:03}", prefix, next))
}

/// Largest numeric suffix among ids of the form `{prefix}{digits}`
///
/// Plain decimal ids (such as transaction ids) use an empty prefix.
pub fn highest_suffix<I, S>(prefix: &str, ids: I) -> Option<u64>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ids.into_iter()
        .filter_map(|id| {
            let digits = id.as_ref().strip_prefix(prefix)?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            digits.parse::<u64>().ok()
        })
        .max()
}
