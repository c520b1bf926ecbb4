//! Fuzz target: `Cursor::decode` on arbitrary client input.
//!
//! Cursors arrive straight from the query string, so decoding must never
//! panic. Anything that does decode must re-encode to a cursor that decodes
//! to the same identifier.

#![no_main]

use harbor_core::Cursor;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(id) = Cursor::decode(raw) {
        let again = Cursor::decode(Cursor::encode(id).as_str())
            .expect("re-encoded cursor must decode");
        assert_eq!(id, again);
    }
});
