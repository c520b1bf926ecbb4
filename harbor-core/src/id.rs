use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// Length of a scan identifier in raw bytes.
pub const SCAN_ID_LEN: usize = 12;

/// Unique identifier of a stored scan.
///
/// Byte-compatible with a MongoDB ObjectId: a big-endian seconds timestamp
/// followed by eight process-unique bytes. Ordering is lexicographic over the
/// bytes, so identifiers minted by the scanning pipeline sort by insertion
/// time.
///
/// The external form is 24 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScanId([u8; SCAN_ID_LEN]);

impl ScanId {
    /// Creates a `ScanId` from its raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; SCAN_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; SCAN_ID_LEN] {
        self.0
    }

    /// Parses the 24-character hex form. Upper-case digits are accepted.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidScanId`] on a wrong length or a non-hex
    /// character.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let invalid = |reason: String| CoreError::InvalidScanId {
            input: input.to_owned(),
            reason,
        };

        if input.len() != SCAN_ID_LEN * 2 {
            return Err(invalid(format!(
                "expected {} hex characters, got {}",
                SCAN_ID_LEN * 2,
                input.len()
            )));
        }

        let mut bytes = [0u8; SCAN_ID_LEN];
        for (slot, pair) in bytes.iter_mut().zip(input.as_bytes().chunks_exact(2)) {
            let hi = hex_value(pair[0]);
            let lo = hex_value(pair[1]);
            match (hi, lo) {
                (Some(hi), Some(lo)) => *slot = (hi << 4) | lo,
                _ => return Err(invalid("contains a non-hex character".to_owned())),
            }
        }
        Ok(Self(bytes))
    }
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for ScanId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<[u8; SCAN_ID_LEN]> for ScanId {
    fn from(bytes: [u8; SCAN_ID_LEN]) -> Self {
        Self(bytes)
    }
}

impl Serialize for ScanId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ScanId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
