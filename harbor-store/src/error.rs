//! Error types for the store crate.

use harbor_core::ScanId;

/// Errors that can occur while reading scan records.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The backing store cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store was reached but the operation failed.
    #[error("store query failed: {0}")]
    Query(String),

    /// A stored document could not be mapped into a scan record.
    #[error("malformed scan document {id}: {reason}")]
    MalformedDocument { id: String, reason: String },
}

impl StoreError {
    /// Build a [`StoreError::MalformedDocument`] for a known identifier.
    pub fn malformed(id: ScanId, reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if the store could not be reached at all.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
