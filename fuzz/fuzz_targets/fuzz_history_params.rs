//! Fuzz target: `GET /history` query parameters.
//!
//! Arbitrary bytes are read as a JSON object of parameters; limit
//! resolution must either succeed within bounds or reject, never panic.

#![no_main]

use std::sync::Arc;

use harbor_history::service::{HistoryParams, HistoryService, MAX_LIMIT};
use harbor_store::MemoryStore;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(params) = serde_json::from_slice::<HistoryParams>(data) else {
        return;
    };
    let service = HistoryService::new(Arc::new(MemoryStore::new()));
    if let Ok(limit) = service.resolve_limit(params.limit.as_deref()) {
        assert!((1..=MAX_LIMIT).contains(&limit), "limit {limit} out of range");
    }
});
