//! GeoServer REST API access.
//!
//! This module provides a `RestApi` trait for issuing requests against a
//! GeoServer REST root, the reqwest-backed `GeoServerClient`, and the XML
//! payloads used to create resources.

mod client;
pub mod payload;
mod types;

pub use client::GeoServerClient;
pub use types::*;
