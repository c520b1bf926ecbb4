//! Scan record storage for the ForgeHarbor history service.
//!
//! The [`ScanStore`] trait is the seam between the query path and whatever
//! holds the records: [`MongoStore`] in production, [`MemoryStore`] in tests
//! and local runs. Queries are expressed as a [`ScanQuery`] conjunction.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod backend;
pub mod error;
pub mod memory;
pub mod mongo;
pub mod query;

pub use backend::ScanStore;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use query::{Filter, ScanQuery};
