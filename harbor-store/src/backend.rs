//! Scan store abstraction trait.
//!
//! Lets the history service run against MongoDB in production and an
//! in-memory map in tests without changing the query path.

use async_trait::async_trait;
use harbor_core::{ScanId, ScanRecord};

use crate::{ScanQuery, StoreError};

/// Read-only access to the scan record collection.
///
/// Implementations must be `Send + Sync` so one handle can be shared by every
/// request task.
///
/// # Cancel Safety
/// All methods are cancel safe. They only read, so dropping the future at any
/// await point leaves nothing behind.
#[async_trait]
pub trait ScanStore: Send + Sync {
    /// Return the records matching every filter of `query`, newest first,
    /// at most `query.limit()` of them.
    ///
    /// # Errors
    /// Returns [`StoreError::Unavailable`] if the store cannot be reached.
    /// Returns [`StoreError::Query`] or [`StoreError::MalformedDocument`] if
    /// the query fails or a result cannot be decoded.
    async fn find(&self, query: &ScanQuery) -> Result<Vec<ScanRecord>, StoreError>;

    /// Look up a single record.
    ///
    /// # Errors
    /// Same as [`ScanStore::find`]. A missing record is `Ok(None)`.
    async fn get(&self, id: ScanId) -> Result<Option<ScanRecord>, StoreError>;

    /// Check that the store is reachable.
    ///
    /// # Errors
    /// Returns [`StoreError::Unavailable`] if it is not.
    async fn health_check(&self) -> Result<(), StoreError>;
}
