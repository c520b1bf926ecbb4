//! Filter conjunction over the scan collection.
//!
//! A [`ScanQuery`] is a list of [`Filter`]s that must all hold, plus a page
//! size. Results are always ordered by identifier, newest first. Backends
//! either evaluate [`ScanQuery::matches`] directly or translate each filter
//! into their own query language.

use harbor_core::{ScanId, ScanRecord};

/// One predicate over a scan record.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Filter {
    /// `type` equals the value.
    Kind(String),
    /// `result.risk_level` equals the value.
    RiskLevel(String),
    /// Identifier is strictly less than the value.
    Before(ScanId),
}

impl Filter {
    /// Evaluate this predicate against a record.
    #[must_use]
    pub fn matches(&self, record: &ScanRecord) -> bool {
        match self {
            Filter::Kind(kind) => record.kind == *kind,
            Filter::RiskLevel(level) => record.risk_level() == Some(level.as_str()),
            Filter::Before(id) => record.id < *id,
        }
    }
}

/// A page request: conjoined filters plus a limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanQuery {
    limit: usize,
    filters: Vec<Filter>,
}

impl ScanQuery {
    /// Create an unfiltered query returning at most `limit` records.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self { limit, filters: Vec::new() }
    }

    /// Add a filter to the conjunction.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Restrict to one scan category, if given.
    #[must_use]
    pub fn kind(self, kind: Option<String>) -> Self {
        match kind {
            Some(kind) => self.filter(Filter::Kind(kind)),
            None => self,
        }
    }

    /// Restrict to one risk level, if given.
    #[must_use]
    pub fn risk_level(self, level: Option<String>) -> Self {
        match level {
            Some(level) => self.filter(Filter::RiskLevel(level)),
            None => self,
        }
    }

    /// Restrict to records older than `id`, if given.
    #[must_use]
    pub fn before(self, id: Option<ScanId>) -> Self {
        match id {
            Some(id) => self.filter(Filter::Before(id)),
            None => self,
        }
    }

    /// Maximum number of records to return.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// The conjoined filters, in the order they were added.
    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// The tightest `Before` bound, if any.
    #[must_use]
    pub fn upper_bound(&self) -> Option<ScanId> {
        self.filters
            .iter()
            .filter_map(|f| match f {
                Filter::Before(id) => Some(*id),
                _ => None,
            })
            .min()
    }

    /// Evaluate the whole conjunction against a record.
    #[must_use]
    pub fn matches(&self, record: &ScanRecord) -> bool {
        self.filters.iter().all(|f| f.matches(record))
    }
}
