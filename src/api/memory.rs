//! In-process remote with the mock REST service's semantics.

use super::{CatalogClient, QuoteClient};
use crate::error::{Error, Result};
use crate::pricing::generate_quote;
use crate::state::{
    CatalogEntry, CatalogListing, Quote, find_entry, normalize_symbol, reference_catalog,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Debug, Default)]
struct RemoteData {
    catalog: Vec<CatalogEntry>,
    tracked: Vec<String>,
}

/// Call counters, for asserting which requests were issued.
#[derive(Debug, Default)]
struct CallCounters {
    catalog: AtomicUsize,
    quotes: AtomicUsize,
    tracked: AtomicUsize,
    writes: AtomicUsize,
}

/// Implements [`CatalogClient`] and [`QuoteClient`] in memory.
///
/// While offline every call fails with [`Error::NetworkUnavailable`].
#[derive(Debug)]
pub struct InMemoryRemote {
    data: Mutex<RemoteData>,
    online: AtomicBool,
    calls: CallCounters,
}

impl Default for InMemoryRemote {
    fn default() -> Self {
        Self::with_catalog(reference_catalog())
    }
}

impl InMemoryRemote {
    /// Create a remote serving the reference catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a remote serving `catalog`.
    pub fn with_catalog(catalog: Vec<CatalogEntry>) -> Self {
        Self {
            data: Mutex::new(RemoteData {
                catalog,
                tracked: Vec::new(),
            }),
            online: AtomicBool::new(true),
            calls: CallCounters::default(),
        }
    }

    /// Simulate the remote going away or coming back.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Symbols tracked on the remote side, in order.
    pub fn tracked_symbols(&self) -> Vec<String> {
        self.data().tracked.clone()
    }

    /// Add a stock to the catalog. Rejects duplicates with 409.
    pub fn list_stock(&self, entry: CatalogEntry) -> Result<()> {
        let mut data = self.data();
        if find_entry(&data.catalog, &entry.symbol).is_some() {
            return Err(Error::rejected(409, "Stock symbol already exists"));
        }
        data.catalog.push(entry);
        Ok(())
    }

    /// Remove a stock from the catalog. Unknown symbols are rejected with 404.
    pub fn delist_stock(&self, symbol: &str) -> Result<CatalogEntry> {
        let mut data = self.data();
        let index = data
            .catalog
            .iter()
            .position(|e| e.symbol == symbol)
            .ok_or_else(|| Error::rejected(404, "Stock not found"))?;
        Ok(data.catalog.remove(index))
    }

    /// Number of catalog requests received.
    pub fn catalog_calls(&self) -> usize {
        self.calls.catalog.load(Ordering::SeqCst)
    }

    /// Number of single and batch quote requests received.
    pub fn quote_calls(&self) -> usize {
        self.calls.quotes.load(Ordering::SeqCst)
    }

    /// Number of tracked-list requests received.
    pub fn tracked_calls(&self) -> usize {
        self.calls.tracked.load(Ordering::SeqCst)
    }

    /// Number of track/untrack writes received.
    pub fn write_calls(&self) -> usize {
        self.calls.writes.load(Ordering::SeqCst)
    }

    fn data(&self) -> MutexGuard<'_, RemoteData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_online(&self, counter: &AtomicUsize) -> Result<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        if self.is_online() {
            Ok(())
        } else {
            Err(Error::network("remote unreachable"))
        }
    }

    fn quote(entry: &CatalogEntry) -> Quote {
        generate_quote(entry, &mut rand::rng())
    }
}

#[async_trait]
impl CatalogClient for InMemoryRemote {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogListing>> {
        self.ensure_online(&self.calls.catalog)?;
        Ok(self
            .data()
            .catalog
            .iter()
            .map(|entry| CatalogListing {
                entry: entry.clone(),
                quote: Self::quote(entry),
            })
            .collect())
    }
}

#[async_trait]
impl QuoteClient for InMemoryRemote {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        self.ensure_online(&self.calls.quotes)?;
        let data = self.data();
        find_entry(&data.catalog, symbol)
            .map(Self::quote)
            .ok_or_else(|| Error::rejected(404, "Stock not found"))
    }

    async fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>> {
        self.ensure_online(&self.calls.quotes)?;
        let data = self.data();
        Ok(symbols
            .iter()
            .filter_map(|symbol| find_entry(&data.catalog, symbol.trim()))
            .map(Self::quote)
            .collect())
    }

    async fn fetch_tracked(&self) -> Result<Vec<Quote>> {
        self.ensure_online(&self.calls.tracked)?;
        let data = self.data();
        Ok(data
            .tracked
            .iter()
            .filter_map(|symbol| find_entry(&data.catalog, symbol))
            .map(Self::quote)
            .collect())
    }

    async fn track(&self, symbol: &str) -> Result<Quote> {
        self.ensure_online(&self.calls.writes)?;
        let symbol = normalize_symbol(symbol)
            .ok_or_else(|| Error::rejected(400, "symbol is required"))?;

        let mut data = self.data();
        let entry = find_entry(&data.catalog, &symbol)
            .cloned()
            .ok_or_else(|| Error::rejected(404, "Stock not found"))?;
        if data.tracked.contains(&entry.symbol) {
            return Err(Error::rejected(409, "Stock already tracked"));
        }

        debug!("remote tracked {}", entry.symbol);
        data.tracked.push(entry.symbol.clone());
        Ok(Self::quote(&entry))
    }

    async fn untrack(&self, symbol: &str) -> Result<String> {
        self.ensure_online(&self.calls.writes)?;
        let symbol = symbol.to_uppercase();

        let mut data = self.data();
        let index = data
            .tracked
            .iter()
            .position(|s| *s == symbol)
            .ok_or_else(|| Error::rejected(404, "Stock not tracked"))?;
        data.tracked.remove(index);

        debug!("remote untracked {}", symbol);
        Ok(symbol)
    }
}
