//! Fuzz target: `ScanId::parse` on arbitrary path segments.

#![no_main]

use harbor_core::ScanId;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(id) = ScanId::parse(raw) {
        // Display is canonical lowercase hex of the same bytes.
        let hex = id.to_string();
        assert_eq!(hex.len(), 24);
        assert_eq!(hex, raw.to_ascii_lowercase());
        assert_eq!(ScanId::parse(&hex).ok(), Some(id));
    }
});
