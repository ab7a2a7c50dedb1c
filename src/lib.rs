//! # ticker-sync
//!
//! Keeps a user's tracked stock symbols, their quotes and the stock catalog in
//! sync with a remote REST source, and keeps working on local data when that
//! source is unreachable.
//!
//! ## Architecture
//!
//! - **API**: remote catalog and quote clients (HTTP and in-process)
//! - **Storage**: persisted mirror of the tracked set
//! - **State**: catalog, quotes, tracked set and the sync mode reducer
//! - **Pricing**: local quote synthesis around catalog base prices
//! - **Sync**: tracked-set store, quote poller, poll schedule and the engine
//! - **Config**: configuration management

pub mod api;
pub mod config;
pub mod error;
pub mod pricing;
pub mod state;
pub mod storage;
pub mod sync;

pub use config::Config;
pub use error::{Error, Result};
pub use state::{Advisory, CatalogEntry, CatalogListing, Quote, QuoteMap, SyncMode, TrackedSet};
pub use sync::{SyncEngine, SyncEngineBuilder};
