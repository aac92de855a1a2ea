//! In-memory catalog of fetched records.
//!
//! The store is a cheap-to-clone handle around a mutex-guarded `Vec`. Every
//! mutation (append, toggle) takes the lock; readers receive cloned
//! snapshots, so nothing outside this module ever holds the guard.

use crate::error::CatalogError;
use shared::Record;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Ordered, session-lived collection of records
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    records: Arc<Mutex<Vec<Record>>>,
}

impl CatalogStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking holder cannot leave the Vec half-updated, so a poisoned
    // lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Vec<Record>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a record at the end, in arrival order
    ///
    /// Duplicate ids are not rejected; both copies are kept.
    pub fn append(&self, record: Record) {
        let mut records = self.lock();
        debug!(id = record.id, position = records.len(), "Appending record");
        records.push(record);
    }

    /// Flip the `selected` flag of the record with `id`, returning the new value
    pub fn toggle_selected(&self, id: u32) -> Result<bool, CatalogError> {
        let mut records = self.lock();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(CatalogError::NotFound(id))?;
        let selected = record.toggle();
        debug!(id = id, selected = selected, "Toggled selection");
        Ok(selected)
    }

    /// Snapshot of the current contents
    pub fn all(&self) -> Vec<Record> {
        self.lock().clone()
    }

    /// Snapshot of a single record
    pub fn get(&self, id: u32) -> Option<Record> {
        self.lock().iter().find(|r| r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
