//! Read-only scan history service for the ForgeHarbor dashboard.
//!
//! Serves cursor-paginated, filtered scan history and single-scan lookup
//! over HTTP. Records are written by the scanning pipeline; this crate only
//! reads them through a [`harbor_store::ScanStore`].

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod error;
pub mod routes;
pub mod service;
