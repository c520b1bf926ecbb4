//! Core types for the ForgeHarbor scan history service.
//!
//! Defines scan identifiers, stored scan records and the opaque cursor used
//! to page through them. Nothing here performs I/O.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod cursor;
pub mod error;
pub mod id;
pub mod record;

pub use cursor::Cursor;
pub use error::{CoreError, CursorError};
pub use id::{ScanId, SCAN_ID_LEN};
pub use record::{ScanRecord, ScanResult};
