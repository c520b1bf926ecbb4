/// Errors produced by the `harbor-core` crate.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CoreError {
    /// A scan identifier could not be parsed from its external form.
    #[error("invalid scan id '{input}': {reason}")]
    InvalidScanId { input: String, reason: String },
}

/// A pagination cursor could not be decoded back into a scan identifier.
///
/// Never reaches an HTTP caller: the history service treats an undecodable
/// cursor as an absent one.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CursorError {
    /// The cursor is not URL-safe base64.
    #[error("cursor is not valid base64")]
    Encoding,

    /// The decoded bytes are not UTF-8.
    #[error("cursor payload is not UTF-8")]
    Utf8,

    /// The decoded text is not a scan identifier.
    #[error("cursor payload is not a scan id: {0}")]
    Id(#[from] CoreError),
}
