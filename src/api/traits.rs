//! Client contracts for the remote source.

use crate::error::Result;
use crate::state::{CatalogListing, Quote};
use async_trait::async_trait;

/// Fetches the universal list of trackable entities.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// `GET /stocks`.
    async fn fetch_catalog(&self) -> Result<Vec<CatalogListing>>;
}

/// Quote reads and tracked-set writes against the remote source.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteClient: Send + Sync {
    /// `GET /stocks/:symbol`. Unknown symbols are rejected with 404.
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote>;

    /// `GET /stocks/batch/:symbols`. Unknown symbols are omitted.
    async fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>>;

    /// `GET /tracked-stocks`, in remote tracking order.
    async fn fetch_tracked(&self) -> Result<Vec<Quote>>;

    /// `POST /tracked-stocks`. Returns the quote of the newly tracked symbol.
    async fn track(&self, symbol: &str) -> Result<Quote>;

    /// `DELETE /tracked-stocks/:symbol`. Returns the removed symbol.
    async fn untrack(&self, symbol: &str) -> Result<String>;
}
