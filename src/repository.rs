//! Repository Module
//!
//! One keyed collection per record type, persisted as a single JSON array
//! under the record's store key.
//!
//! ## Access pattern
//! Every operation is a full read-modify-write of the array: load, change,
//! store. Order is preserved; upserts replace in place and inserts append.

use std::marker::PhantomData;

use crate::error::{Result, ShelfError};
use crate::model::Record;
use crate::store::KvStore;

/// Typed view of one record list in a store
pub struct Collection<'a, T> {
    store: &'a dyn KvStore,
    _record: PhantomData<T>,
}

impl<'a, T: Record> Collection<'a, T> {
    pub fn new(store: &'a dyn KvStore) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    /// Load every record; an absent key reads as an empty list
    pub fn load(&self) -> Result<Vec<T>> {
        match self.store.get(T::STORE_KEY)? {
            Some(json) => serde_json::from_str(&json).map_err(|source| ShelfError::MalformedRecords {
                key: T::STORE_KEY.to_string(),
                source,
            }),
            None => Ok(Vec::new()),
        }
    }

    /// Replace the whole list
    pub fn save(&self, records: &[T]) -> Result<()> {
        let json = serde_json::to_string(records)?;
        tracing::debug!(key = T::STORE_KEY, records = records.len(), "saving collection");
        self.store.set(T::STORE_KEY, json)
    }

    /// Find a record by id
    pub fn find(&self, id: &str) -> Result<Option<T>> {
        Ok(self.load()?.into_iter().find(|r| r.id() == id))
    }

    /// Whether a record with `id` exists
    pub fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.load()?.iter().any(|r| r.id() == id))
    }

    /// Replace the record with the same id in place, or append it
    pub fn upsert(&self, record: T) -> Result<()> {
        let mut records = self.load()?;
        match records.iter().position(|r| r.id() == record.id()) {
            Some(idx) => records[idx] = record,
            None => records.push(record),
        }
        self.save(&records)
    }

    /// Append without checking for an existing id
    pub fn append(&self, record: T) -> Result<()> {
        let mut records = self.load()?;
        records.push(record);
        self.save(&records)
    }

    /// Remove the record(s) with `id`; returns whether anything was removed
    ///
    /// The store is not written when nothing matches.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut records = self.load()?;
        let before = records.len();
        records.retain(|r| r.id() != id);

        if records.len() == before {
            return Ok(false);
        }
        self.save(&records)?;
        Ok(true)
    }

    /// Apply `f` to the first record with `id` and store the result
    ///
    /// Returns the updated record, or `None` (no write) if absent.
    pub fn update<F>(&self, id: &str, f: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut T),
    {
        let mut records = self.load()?;
        let Some(record) = records.iter_mut().find(|r| r.id() == id) else {
            return Ok(None);
        };
        f(record);
        let updated = record.clone();
        self.save(&records)?;
        Ok(Some(updated))
    }

    /// Number of records
    pub fn count(&self) -> Result<usize> {
        Ok(self.load()?.len())
    }

    /// Drop the whole collection from the store
    pub fn clear(&self) -> Result<bool> {
        self.store.remove(T::STORE_KEY)
    }

    /// Ids in storage order
    pub fn ids(&self) -> Result<Vec<String>> {
        Ok(self.load()?.iter().map(|r| r.id().to_string()).collect())
    }
}
