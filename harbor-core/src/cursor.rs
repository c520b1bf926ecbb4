//! Opaque pagination cursors.
//!
//! A cursor is the URL-safe, unpadded base64 of a scan identifier's canonical
//! hex form. Hex text never produces `+`, `/` or padding, so the output is
//! also identical to standard base64 of the same text. Callers must treat it
//! as opaque; only this module knows how it is built, so the store's
//! identifier scheme can change without breaking cursors already handed out.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::CursorError;
use crate::id::ScanId;

/// Continuation token pointing just past the last record of a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Encodes the position after `id`.
    #[must_use]
    pub fn encode(id: ScanId) -> Self {
        Self(URL_SAFE_NO_PAD.encode(id.to_string()))
    }

    /// Decodes a cursor string back into the identifier it was built from.
    ///
    /// # Errors
    /// Returns a [`CursorError`] for anything that is not a cursor. Never
    /// panics, whatever the input.
    pub fn decode(raw: &str) -> Result<ScanId, CursorError> {
        let bytes = URL_SAFE_NO_PAD.decode(raw).map_err(|_| CursorError::Encoding)?;
        let text = std::str::from_utf8(&bytes).map_err(|_| CursorError::Utf8)?;
        Ok(ScanId::parse(text)?)
    }

    /// Returns the encoded form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
