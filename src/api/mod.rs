//! Remote source integration.
//!
//! This module defines the client contracts the sync engine depends on and
//! provides two implementations: an HTTP client for the mock REST service and
//! an in-process remote with the same semantics.

mod client;
mod converter;
mod memory;
mod traits;

pub use client::{ApiClient, ApiClientBuilder};
pub use converter::DataConverter;
pub use memory::InMemoryRemote;
pub use traits::{CatalogClient, QuoteClient};

#[cfg(test)]
pub use traits::{MockCatalogClient, MockQuoteClient};
