//! In-memory scan store.
//!
//! Holds records in a `BTreeMap` keyed by identifier, so reverse iteration is
//! already newest-first. Used by tests and by the binary's `memory` mode.

use std::{collections::BTreeMap, ops::Bound, sync::RwLock};

use async_trait::async_trait;
use harbor_core::{ScanId, ScanRecord};

use crate::{ScanQuery, ScanStore, StoreError};

/// Thread-safe, append-only map of scan records.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<ScanId, ScanRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `records`. Later duplicates are dropped.
    pub fn from_records(records: impl IntoIterator<Item = ScanRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Append a record. Returns `false` and keeps the existing record if the
    /// identifier is already present.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    pub fn insert(&self, record: ScanRecord) -> bool {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let mut records = self.records.write().expect("scan store write lock poisoned");
        if records.contains_key(&record.id) {
            return false;
        }
        records.insert(record.id, record);
        true
    }

    /// Number of stored records.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let records = self.records.read().expect("scan store read lock poisoned");
        records.len()
    }

    /// Returns `true` if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ScanStore for MemoryStore {
    async fn find(&self, query: &ScanQuery) -> Result<Vec<ScanRecord>, StoreError> {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let records = self.records.read().expect("scan store read lock poisoned");

        let upper = query.upper_bound().map_or(Bound::Unbounded, Bound::Excluded);

        Ok(records
            .range((Bound::Unbounded, upper))
            .rev()
            .map(|(_, r)| r)
            .filter(|r| query.matches(r))
            .take(query.limit())
            .cloned()
            .collect())
    }

    async fn get(&self, id: ScanId) -> Result<Option<ScanRecord>, StoreError> {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let records = self.records.read().expect("scan store read lock poisoned");
        Ok(records.get(&id).cloned())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
