use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::ScanId;

/// A stored result of a single URL or file security scan.
///
/// Records are written by the scanning pipeline and are immutable from the
/// history service's point of view. Fields the service does not interpret are
/// carried through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    /// Unique identifier; also encodes insertion order.
    pub id: ScanId,
    /// Scan category, e.g. `"url"` or `"file"`.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Classification produced by the scanning backend.
    #[serde(default)]
    pub result: ScanResult,
    /// When the scan was stored. Display only; ordering uses `id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Remaining top-level fields (`user_id`, `input`, ...) in document order.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl ScanRecord {
    /// Creates a record with an empty result and no extra fields.
    pub fn new(id: ScanId, kind: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
            result: ScanResult::default(),
            created_at: None,
            extra: IndexMap::new(),
        }
    }

    /// Sets the risk level of the result.
    #[must_use]
    pub fn with_risk_level(mut self, risk_level: impl Into<String>) -> Self {
        self.result.risk_level = Some(risk_level.into());
        self
    }

    /// Returns the risk level, if the backend reported one.
    #[must_use]
    pub fn risk_level(&self) -> Option<&str> {
        self.result.risk_level.as_deref()
    }
}

/// Threat classification attached to a scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Severity label such as `"low"` or `"high"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<String>,
    /// Backend-specific fields: phishing/malicious flags, confidence,
    /// vendor-detection counts.
    #[serde(flatten)]
    pub details: IndexMap<String, Value>,
}
