//! The history query service: paginated listing and lookup by identifier.
//!
//! Pages are ordered newest first. Each page's `next_cursor` encodes the
//! identifier of its last record; feeding it back returns the records strictly
//! older than that one. On an append-only collection this visits every record
//! exactly once, and an empty page with a `null` cursor marks the end.

use std::num::IntErrorKind;
use std::sync::Arc;

use harbor_core::{Cursor, ScanId, ScanRecord};
use harbor_store::{ScanQuery, ScanStore, StoreError};
use serde::{Deserialize, Serialize};

use crate::{config::HistoryConfig, error::HistoryError};

/// Page size used when the caller gives none.
pub const DEFAULT_LIMIT: usize = 20;

/// Largest page size served; larger requests are clamped.
pub const MAX_LIMIT: usize = 100;

/// Raw `GET /history` query parameters, exactly as received.
///
/// Kept as strings so malformed values produce this service's own
/// [`HistoryError::InvalidArgument`] rather than an extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<String>,
    pub cursor: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub risk: Option<String>,
}

impl HistoryParams {
    /// Build from raw query-string pairs. Unknown keys are ignored.
    ///
    /// A repeated `cursor` is treated as no cursor at all, the same as any
    /// other cursor that does not decode.
    ///
    /// # Errors
    /// Returns [`HistoryError::InvalidArgument`] if `limit`, `type` or `risk`
    /// is given more than once.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, HistoryError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        let mut cursor_seen = false;

        for (key, value) in pairs {
            let slot = match key.as_str() {
                "limit" => &mut params.limit,
                "type" => &mut params.kind,
                "risk" => &mut params.risk,
                "cursor" => {
                    if cursor_seen {
                        tracing::debug!("ignoring repeated cursor");
                        params.cursor = None;
                    } else {
                        cursor_seen = true;
                        params.cursor = Some(value);
                    }
                    continue;
                }
                _ => continue,
            };
            if slot.replace(value).is_some() {
                return Err(HistoryError::InvalidArgument(format!(
                    "parameter '{key}' given more than once"
                )));
            }
        }
        Ok(params)
    }
}

/// One page of scan history.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryPage {
    /// Records, newest first.
    pub items: Vec<ScanRecord>,
    /// Cursor for the next page; `null` once the page is empty.
    pub next_cursor: Option<Cursor>,
}

/// Read-only query service over a [`ScanStore`].
#[derive(Clone)]
pub struct HistoryService {
    store: Arc<dyn ScanStore>,
    default_limit: usize,
    max_limit: usize,
}

impl std::fmt::Debug for HistoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryService")
            .field("default_limit", &self.default_limit)
            .field("max_limit", &self.max_limit)
            .finish_non_exhaustive()
    }
}

impl HistoryService {
    /// Create a service with the default page limits.
    #[must_use]
    pub fn new(store: Arc<dyn ScanStore>) -> Self {
        Self::with_limits(store, DEFAULT_LIMIT, MAX_LIMIT)
    }

    /// Create a service with explicit page limits.
    ///
    /// `max_limit` is raised to at least 1 and `default_limit` is kept within
    /// `1..=max_limit`.
    #[must_use]
    pub fn with_limits(store: Arc<dyn ScanStore>, default_limit: usize, max_limit: usize) -> Self {
        let max_limit = max_limit.max(1);
        Self {
            store,
            default_limit: default_limit.clamp(1, max_limit),
            max_limit,
        }
    }

    /// Create a service using the limits from `config`.
    #[must_use]
    pub fn from_config(store: Arc<dyn ScanStore>, config: &HistoryConfig) -> Self {
        Self::with_limits(store, config.default_limit, config.max_limit)
    }

    /// Resolve the `limit` parameter.
    ///
    /// Absent or empty means the default; values above the maximum are
    /// clamped, including ones too large to represent.
    ///
    /// # Errors
    /// Returns [`HistoryError::InvalidArgument`] for non-numeric, negative or
    /// zero values.
    pub fn resolve_limit(&self, raw: Option<&str>) -> Result<usize, HistoryError> {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(self.default_limit);
        };
        match raw.parse::<u64>() {
            Ok(0) => Err(HistoryError::InvalidArgument("limit must be at least 1".to_owned())),
            Ok(n) => Ok(usize::try_from(n).map_or(self.max_limit, |n| n.min(self.max_limit))),
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(self.max_limit),
            Err(_) => Err(HistoryError::InvalidArgument(format!(
                "limit must be a positive integer, got '{raw}'"
            ))),
        }
    }

    /// `List`: one page of history matching the optional filters.
    ///
    /// A cursor that does not decode is ignored and the page starts from the
    /// newest record.
    ///
    /// # Errors
    /// Returns [`HistoryError::InvalidArgument`] for a malformed `limit`, or
    /// [`HistoryError::Store`] if the store fails. Never returns a partial
    /// page.
    pub async fn list(&self, params: &HistoryParams) -> Result<HistoryPage, HistoryError> {
        let limit = self.resolve_limit(params.limit.as_deref())?;
        let before = non_empty(params.cursor.as_deref()).and_then(|raw| match Cursor::decode(raw) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::debug!(cursor = %raw, error = %e, "ignoring undecodable cursor");
                None
            }
        });

        let query = ScanQuery::new(limit)
            .kind(non_empty(params.kind.as_deref()).map(str::to_owned))
            .risk_level(non_empty(params.risk.as_deref()).map(str::to_owned))
            .before(before);

        let mut items = self.store.find(&query).await?;
        items.truncate(limit);
        let next_cursor = items.last().map(|record| Cursor::encode(record.id));

        tracing::debug!(
            limit,
            filters = query.filters().len(),
            returned = items.len(),
            "history page served"
        );

        Ok(HistoryPage { items, next_cursor })
    }

    /// `Get`: a single record by its external identifier.
    ///
    /// # Errors
    /// Returns [`HistoryError::InvalidArgument`] if `raw_id` is not an
    /// identifier, [`HistoryError::NotFound`] if no record has it, or
    /// [`HistoryError::Store`] if the store fails.
    pub async fn get(&self, raw_id: &str) -> Result<ScanRecord, HistoryError> {
        let id = ScanId::parse(raw_id).map_err(|e| HistoryError::InvalidArgument(e.to_string()))?;
        self.store.get(id).await?.ok_or(HistoryError::NotFound)
    }

    /// Check that the backing store is reachable.
    ///
    /// # Errors
    /// Propagates the store's health-check failure.
    pub async fn health(&self) -> Result<(), StoreError> {
        self.store.health_check().await
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use harbor_core::SCAN_ID_LEN;
    use harbor_store::MemoryStore;

    use super::*;

    fn id(n: u8) -> ScanId {
        let mut bytes = [0u8; SCAN_ID_LEN];
        bytes[SCAN_ID_LEN - 1] = n;
        ScanId::from_bytes(bytes)
    }

    fn ids(page: &HistoryPage) -> Vec<ScanId> {
        page.items.iter().map(|r| r.id).collect()
    }

    fn service_with(records: Vec<ScanRecord>) -> HistoryService {
        HistoryService::new(Arc::new(MemoryStore::from_records(records)))
    }

    fn numbered(n: u8) -> HistoryService {
        service_with((1..=n).map(|i| ScanRecord::new(id(i), "url")).collect())
    }

    fn params(limit: Option<&str>, cursor: Option<&str>) -> HistoryParams {
        HistoryParams {
            limit: limit.map(str::to_owned),
            cursor: cursor.map(str::to_owned),
            ..HistoryParams::default()
        }
    }

    async fn list_ok(service: &HistoryService, params: &HistoryParams) -> HistoryPage {
        match service.list(params).await {
            Ok(page) => page,
            Err(e) => panic!("list failed: {e}"),
        }
    }

    struct UnreachableStore;

    #[async_trait]
    impl ScanStore for UnreachableStore {
        async fn find(&self, _query: &ScanQuery) -> Result<Vec<ScanRecord>, StoreError> {
            Err(StoreError::Unavailable("mock always fails".to_owned()))
        }

        async fn get(&self, _id: ScanId) -> Result<Option<ScanRecord>, StoreError> {
            Err(StoreError::Unavailable("mock always fails".to_owned()))
        }

        async fn health_check(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("mock always fails".to_owned()))
        }
    }

    #[tokio::test]
    async fn list_walks_five_records_two_at_a_time() {
        let service = numbered(5);

        let first = list_ok(&service, &params(Some("2"), None)).await;
        assert_eq!(ids(&first), vec![id(5), id(4)]);
        assert_eq!(first.next_cursor, Some(Cursor::encode(id(4))));

        let cursor = first.next_cursor.map(|c| c.to_string());
        let second = list_ok(&service, &params(Some("2"), cursor.as_deref())).await;
        assert_eq!(ids(&second), vec![id(3), id(2)]);
        assert_eq!(second.next_cursor, Some(Cursor::encode(id(2))));

        let cursor = second.next_cursor.map(|c| c.to_string());
        let third = list_ok(&service, &params(Some("2"), cursor.as_deref())).await;
        assert_eq!(ids(&third), vec![id(1)]);
        assert_eq!(third.next_cursor, Some(Cursor::encode(id(1))));

        let cursor = third.next_cursor.map(|c| c.to_string());
        let last = list_ok(&service, &params(Some("2"), cursor.as_deref())).await;
        assert!(last.items.is_empty(), "page after the oldest record must be empty");
        assert_eq!(last.next_cursor, None);
    }

    #[tokio::test]
    async fn list_empty_collection_has_null_cursor() {
        let service = service_with(Vec::new());
        let page = list_ok(&service, &HistoryParams::default()).await;
        assert!(page.items.is_empty());
        assert_eq!(page.next_cursor, None);
    }

    #[tokio::test]
    async fn list_tampered_cursor_behaves_like_no_cursor() {
        let service = numbered(5);
        let baseline = list_ok(&service, &params(Some("3"), None)).await;

        for tampered in ["not-a-cursor", "%%%", "aGVsbG8gd29ybGQ", ""] {
            let page = list_ok(&service, &params(Some("3"), Some(tampered))).await;
            assert_eq!(ids(&page), ids(&baseline), "cursor {tampered:?} must be ignored");
            assert_eq!(page.next_cursor, baseline.next_cursor);
        }
    }

    #[tokio::test]
    async fn list_conjoins_type_and_risk() {
        let service = service_with(vec![
            ScanRecord::new(id(1), "url").with_risk_level("high"),
            ScanRecord::new(id(2), "file").with_risk_level("high"),
            ScanRecord::new(id(3), "url").with_risk_level("low"),
            ScanRecord::new(id(4), "url").with_risk_level("high"),
        ]);
        let filtered = HistoryParams {
            kind: Some("url".to_owned()),
            risk: Some("high".to_owned()),
            ..HistoryParams::default()
        };
        let page = list_ok(&service, &filtered).await;
        assert_eq!(ids(&page), vec![id(4), id(1)]);

        let nothing = HistoryParams {
            kind: Some("file".to_owned()),
            risk: Some("low".to_owned()),
            ..HistoryParams::default()
        };
        let page = list_ok(&service, &nothing).await;
        assert!(page.items.is_empty(), "no match is an empty page, not an error");
        assert_eq!(page.next_cursor, None);
    }

    #[tokio::test]
    async fn list_empty_filters_are_ignored() {
        let service = numbered(3);
        let blank = HistoryParams {
            kind: Some(String::new()),
            risk: Some(String::new()),
            ..HistoryParams::default()
        };
        assert_eq!(list_ok(&service, &blank).await.items.len(), 3);
    }

    #[tokio::test]
    async fn list_cursor_respects_filters_across_pages() {
        let service = service_with(
            (1..=10)
                .map(|i| ScanRecord::new(id(i), if i % 2 == 0 { "file" } else { "url" }))
                .collect(),
        );
        let mut seen = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let request = HistoryParams {
                limit: Some("2".to_owned()),
                cursor: cursor.clone(),
                kind: Some("file".to_owned()),
                risk: None,
            };
            let page = list_ok(&service, &request).await;
            seen.extend(ids(&page));
            match page.next_cursor {
                Some(next) => cursor = Some(next.to_string()),
                None => break,
            }
        }
        assert_eq!(seen, vec![id(10), id(8), id(6), id(4), id(2)]);
    }

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
    }

    #[test]
    fn from_pairs_maps_known_keys_and_skips_unknown() {
        let params = match HistoryParams::from_pairs(pairs(&[
            ("limit", "5"),
            ("type", "url"),
            ("risk", "high"),
            ("cursor", "abc"),
            ("utm_source", "mail"),
        ])) {
            Ok(p) => p,
            Err(e) => panic!("unexpected error: {e}"),
        };
        assert_eq!(params.limit.as_deref(), Some("5"));
        assert_eq!(params.kind.as_deref(), Some("url"));
        assert_eq!(params.risk.as_deref(), Some("high"));
        assert_eq!(params.cursor.as_deref(), Some("abc"));
    }

    #[test]
    fn from_pairs_drops_repeated_cursor() {
        let first = Cursor::encode(id(4)).to_string();
        let second = Cursor::encode(id(2)).to_string();
        for raw in [
            pairs(&[("cursor", "a"), ("cursor", "b")]),
            pairs(&[("cursor", first.as_str()), ("cursor", second.as_str()), ("cursor", first.as_str())]),
        ] {
            match HistoryParams::from_pairs(raw) {
                Ok(params) => assert_eq!(params.cursor, None),
                Err(e) => panic!("repeated cursor must not fail: {e}"),
            }
        }
    }

    #[test]
    fn from_pairs_rejects_repeated_limit_or_filter() {
        for key in ["limit", "type", "risk"] {
            let result = HistoryParams::from_pairs(pairs(&[(key, "1"), (key, "2")]));
            assert!(
                matches!(result, Err(HistoryError::InvalidArgument(_))),
                "repeated {key} must be rejected"
            );
        }
    }

    #[tokio::test]
    async fn list_with_repeated_cursor_serves_first_page() {
        let service = numbered(5);
        let baseline = list_ok(&service, &params(Some("2"), None)).await;
        let cursor = Cursor::encode(id(4)).to_string();
        let repeated = match HistoryParams::from_pairs(pairs(&[
            ("limit", "2"),
            ("cursor", cursor.as_str()),
            ("cursor", cursor.as_str()),
        ])) {
            Ok(p) => p,
            Err(e) => panic!("unexpected error: {e}"),
        };
        let page = list_ok(&service, &repeated).await;
        assert_eq!(ids(&page), ids(&baseline));
    }

    #[test]
    fn resolve_limit_defaults_and_clamps() {
        let service = numbered(0);
        let resolve = |raw| match service.resolve_limit(raw) {
            Ok(n) => n,
            Err(e) => panic!("unexpected error for {raw:?}: {e}"),
        };
        assert_eq!(resolve(None), DEFAULT_LIMIT);
        assert_eq!(resolve(Some("")), DEFAULT_LIMIT);
        assert_eq!(resolve(Some("7")), 7);
        assert_eq!(resolve(Some(" 7 ")), 7);
        assert_eq!(resolve(Some("1000")), MAX_LIMIT);
        assert_eq!(resolve(Some("99999999999999999999999999")), MAX_LIMIT);
    }

    #[test]
    fn resolve_limit_rejects_malformed() {
        let service = numbered(0);
        for raw in ["0", "-3", "abc", "2.5", "ten"] {
            assert!(
                matches!(service.resolve_limit(Some(raw)), Err(HistoryError::InvalidArgument(_))),
                "limit {raw:?} must be rejected"
            );
        }
    }

    #[test]
    fn with_limits_keeps_default_within_max() {
        let service = HistoryService::with_limits(Arc::new(MemoryStore::new()), 500, 50);
        assert!(matches!(service.resolve_limit(None), Ok(50)));
    }

    #[tokio::test]
    async fn get_returns_exact_record() {
        let record = ScanRecord::new(id(3), "file").with_risk_level("medium");
        let service = service_with(vec![ScanRecord::new(id(1), "url"), record.clone()]);
        match service.get(&id(3).to_string()).await {
            Ok(found) => assert_eq!(found, record),
            Err(e) => panic!("get failed: {e}"),
        }
    }

    #[tokio::test]
    async fn get_absent_is_not_found() {
        let service = numbered(2);
        let result = service.get(&id(9).to_string()).await;
        assert!(matches!(result, Err(HistoryError::NotFound)));
    }

    #[tokio::test]
    async fn get_malformed_is_invalid_argument() {
        let service = numbered(2);
        for raw in ["", "123", "zzzzzzzzzzzzzzzzzzzzzzzz"] {
            let result = service.get(raw).await;
            assert!(
                matches!(result, Err(HistoryError::InvalidArgument(_))),
                "id {raw:?} must be rejected"
            );
        }
    }

    #[tokio::test]
    async fn store_failure_propagates_without_partial_page() {
        let service = HistoryService::new(Arc::new(UnreachableStore));
        let result = service.list(&HistoryParams::default()).await;
        assert!(matches!(result, Err(HistoryError::Store(StoreError::Unavailable(_)))));

        let result = service.get(&id(1).to_string()).await;
        assert!(matches!(result, Err(HistoryError::Store(_))));

        assert!(service.health().await.is_err());
    }

    proptest::proptest! {
        #[test]
        fn proptest_pagination_visits_every_record_once(
            raw_ids in proptest::collection::btree_set(proptest::prelude::any::<[u8; SCAN_ID_LEN]>(), 0..60usize),
            limit in 1usize..12,
        ) {
            let runtime = match tokio::runtime::Builder::new_current_thread().build() {
                Ok(rt) => rt,
                Err(e) => panic!("failed to build runtime: {e}"),
            };
            let service = service_with(
                raw_ids.iter().map(|b| ScanRecord::new(ScanId::from_bytes(*b), "url")).collect(),
            );

            let mut seen: Vec<ScanId> = Vec::new();
            let mut cursor: Option<String> = None;
            let limit_param = limit.to_string();
            loop {
                let request = params(Some(&limit_param), cursor.as_deref());
                let page = runtime.block_on(list_ok(&service, &request));
                proptest::prop_assert!(page.items.len() <= limit);
                seen.extend(ids(&page));
                match page.next_cursor {
                    Some(next) => cursor = Some(next.to_string()),
                    None => break,
                }
            }

            let expected: Vec<ScanId> = raw_ids.iter().rev().map(|b| ScanId::from_bytes(*b)).collect();
            proptest::prop_assert_eq!(seen, expected);
        }
    }
}
