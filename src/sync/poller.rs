//! Quote cache refresh.
//!
//! Every write to the cache carries a generation number. A refresh takes a new
//! generation when it is issued and may only commit if no newer generation was
//! taken while it was in flight, so a slow response can never overwrite data
//! from a faster, later one.

use crate::api::QuoteClient;
use crate::error::Error;
use crate::pricing::synthesize_quotes;
use crate::state::{CatalogEntry, Quote, QuoteMap, SyncMode, index_quotes};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Where the quotes of a refresh came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteSource {
    /// Nothing was requested (empty tracked set).
    Idle,
    /// Batched remote request.
    Remote,
    /// Synthesized from catalog base prices.
    Synthesized,
}

/// Result of [`QuotePoller::refresh`].
#[derive(Debug)]
pub struct RefreshOutcome {
    /// Generation this refresh was issued with (0 when idle).
    pub generation: u64,
    /// Quotes produced by this refresh, or the current cache when idle.
    pub quotes: QuoteMap,
    /// Where the quotes came from.
    pub source: QuoteSource,
    /// Whether the quotes were written to the cache.
    pub committed: bool,
    /// The remote failure that forced synthesis, if any.
    pub failure: Option<Error>,
}

/// Owns the quote cache and refreshes it from the remote source or from
/// local synthesis.
pub struct QuotePoller {
    remote: Arc<dyn QuoteClient>,
    cache: RwLock<QuoteMap>,
    generation: AtomicU64,
}

impl QuotePoller {
    /// Create a poller with an empty cache.
    pub fn new(remote: Arc<dyn QuoteClient>) -> Self {
        Self {
            remote,
            cache: RwLock::new(QuoteMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Latest generation taken.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Read-only copy of the cache.
    pub async fn snapshot(&self) -> QuoteMap {
        self.cache.read().await.clone()
    }

    /// Cached quotes for `symbols`, in the given order. Symbols without a
    /// cached quote are skipped.
    pub async fn quotes_for(&self, symbols: &[String]) -> Vec<Quote> {
        let cache = self.cache.read().await;
        symbols
            .iter()
            .filter_map(|symbol| cache.get(symbol).cloned())
            .collect()
    }

    /// Refresh quotes for `symbols`.
    ///
    /// In [`SyncMode::Fallback`] quotes are synthesized from `catalog` without
    /// any remote call. In [`SyncMode::Live`] one batched request is issued;
    /// if it fails the same cycle is served by synthesis and the failure is
    /// reported in the outcome.
    pub async fn refresh(
        &self,
        symbols: &[String],
        mode: SyncMode,
        catalog: &[CatalogEntry],
    ) -> RefreshOutcome {
        if symbols.is_empty() {
            return RefreshOutcome {
                generation: 0,
                quotes: self.snapshot().await,
                source: QuoteSource::Idle,
                committed: false,
                failure: None,
            };
        }

        let generation = self.next_generation();

        let (quotes, source, failure) = match mode {
            SyncMode::Fallback => (
                Self::synthesize(catalog, symbols),
                QuoteSource::Synthesized,
                None,
            ),
            SyncMode::Live => match self.remote.fetch_quotes(symbols).await {
                Ok(quotes) => (index_quotes(quotes), QuoteSource::Remote, None),
                Err(e) => {
                    warn!("Batch quote request failed, synthesizing: {}", e);
                    (
                        Self::synthesize(catalog, symbols),
                        QuoteSource::Synthesized,
                        Some(e),
                    )
                }
            },
        };

        let committed = self.commit(generation, quotes.clone()).await;

        RefreshOutcome {
            generation,
            quotes,
            source,
            committed,
            failure,
        }
    }

    /// Replace the whole cache, superseding any refresh in flight.
    pub async fn install(&self, quotes: QuoteMap) {
        let mut cache = self.cache.write().await;
        self.next_generation();
        *cache = quotes;
    }

    /// Insert or replace one quote, superseding any refresh in flight.
    pub async fn upsert(&self, quote: Quote) {
        let mut cache = self.cache.write().await;
        self.next_generation();
        cache.insert(quote.symbol.clone(), quote);
    }

    /// Drop the quote for `symbol`, superseding any refresh in flight.
    pub async fn evict(&self, symbol: &str) {
        let mut cache = self.cache.write().await;
        self.next_generation();
        cache.remove(symbol);
    }

    /// Supersede any refresh in flight without touching the cache.
    pub fn invalidate(&self) -> u64 {
        self.next_generation()
    }

    /// Synthesize quotes locally. Kept synchronous so the thread-local RNG
    /// never lives across an await.
    pub fn synthesize(catalog: &[CatalogEntry], symbols: &[String]) -> QuoteMap {
        synthesize_quotes(catalog, symbols, &mut rand::rng())
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Write `quotes` if `generation` is still the latest one taken.
    async fn commit(&self, generation: u64, quotes: QuoteMap) -> bool {
        let mut cache = self.cache.write().await;
        let current = self.generation();
        if generation != current {
            debug!(
                "Discarding stale quotes (generation {} < {})",
                generation, current
            );
            return false;
        }
        *cache = quotes;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{InMemoryRemote, MockQuoteClient};
    use crate::error::Result;
    use crate::state::reference_catalog;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    fn quote(symbol: &str, price: rust_decimal::Decimal) -> Quote {
        Quote {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            price,
            change: dec!(0),
            change_percent: dec!(0),
        }
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// Batch requests resolve only when the test releases them.
    struct GatedQuotes {
        gates: Mutex<Vec<oneshot::Receiver<Vec<Quote>>>>,
    }

    #[async_trait]
    impl QuoteClient for GatedQuotes {
        async fn fetch_quote(&self, _symbol: &str) -> Result<Quote> {
            unreachable!()
        }

        async fn fetch_quotes(&self, _symbols: &[String]) -> Result<Vec<Quote>> {
            let gate = self.gates.lock().unwrap().remove(0);
            gate.await.map_err(|_| Error::network("gate dropped"))
        }

        async fn fetch_tracked(&self) -> Result<Vec<Quote>> {
            unreachable!()
        }

        async fn track(&self, _symbol: &str) -> Result<Quote> {
            unreachable!()
        }

        async fn untrack(&self, _symbol: &str) -> Result<String> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn test_empty_symbols_is_noop() {
        let mut remote = MockQuoteClient::new();
        remote.expect_fetch_quotes().never();
        let poller = QuotePoller::new(Arc::new(remote));

        let outcome = poller.refresh(&[], SyncMode::Live, &reference_catalog()).await;

        assert_eq!(outcome.source, QuoteSource::Idle);
        assert!(outcome.quotes.is_empty());
        assert!(!outcome.committed);
        assert_eq!(poller.generation(), 0);
    }

    #[tokio::test]
    async fn test_live_refresh_replaces_cache_wholesale() {
        let poller = QuotePoller::new(Arc::new(InMemoryRemote::new()));
        poller.upsert(quote("GRIZ", dec!(1))).await;

        let outcome = poller
            .refresh(&symbols(&["SWANSON", "BOGUS"]), SyncMode::Live, &[])
            .await;

        assert_eq!(outcome.source, QuoteSource::Remote);
        assert!(outcome.committed);
        let cache = poller.snapshot().await;
        assert_eq!(cache.len(), 1);
        assert!(cache.contains_key("SWANSON"));
    }

    #[tokio::test]
    async fn test_fallback_refresh_never_calls_remote() {
        let mut remote = MockQuoteClient::new();
        remote.expect_fetch_quotes().never();
        let poller = QuotePoller::new(Arc::new(remote));

        let outcome = poller
            .refresh(&symbols(&["SWANSON"]), SyncMode::Fallback, &reference_catalog())
            .await;

        assert_eq!(outcome.source, QuoteSource::Synthesized);
        let price = outcome.quotes["SWANSON"].price;
        // 45.50 * [0.95, 1.05]
        assert!(price >= dec!(43.225) && price <= dec!(47.775), "{price}");
        assert_eq!(poller.snapshot().await["SWANSON"].price, price);
    }

    #[tokio::test]
    async fn test_live_failure_synthesizes_same_cycle() {
        let mut remote = MockQuoteClient::new();
        remote
            .expect_fetch_quotes()
            .times(1)
            .returning(|_| Err(Error::network("connection reset")));
        let poller = QuotePoller::new(Arc::new(remote));

        let outcome = poller
            .refresh(&symbols(&["PAWN", "JJ"]), SyncMode::Live, &reference_catalog())
            .await;

        assert!(outcome.failure.is_some());
        assert_eq!(outcome.source, QuoteSource::Synthesized);
        assert!(outcome.committed);
        assert_eq!(poller.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn test_stale_response_does_not_overwrite_newer() {
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();
        let remote = GatedQuotes {
            gates: Mutex::new(vec![first_rx, second_rx]),
        };
        let poller = Arc::new(QuotePoller::new(Arc::new(remote)));
        let tracked = symbols(&["SWANSON"]);

        let first = tokio::spawn({
            let poller = poller.clone();
            let tracked = tracked.clone();
            async move { poller.refresh(&tracked, SyncMode::Live, &[]).await }
        });
        // Let the first refresh take its generation and park on its gate.
        while poller.generation() < 1 {
            tokio::task::yield_now().await;
        }

        let second = tokio::spawn({
            let poller = poller.clone();
            let tracked = tracked.clone();
            async move { poller.refresh(&tracked, SyncMode::Live, &[]).await }
        });
        while poller.generation() < 2 {
            tokio::task::yield_now().await;
        }

        second_tx.send(vec![quote("SWANSON", dec!(2.00))]).unwrap();
        let second = second.await.unwrap();
        assert_eq!(second.generation, 2);
        assert!(second.committed);

        first_tx.send(vec![quote("SWANSON", dec!(1.00))]).unwrap();
        let first = first.await.unwrap();
        assert_eq!(first.generation, 1);
        assert!(!first.committed);

        assert_eq!(poller.snapshot().await["SWANSON"].price, dec!(2.00));
    }

    #[tokio::test]
    async fn test_invalidate_discards_in_flight_refresh() {
        let (tx, rx) = oneshot::channel();
        let remote = GatedQuotes {
            gates: Mutex::new(vec![rx]),
        };
        let poller = Arc::new(QuotePoller::new(Arc::new(remote)));

        let pending = tokio::spawn({
            let poller = poller.clone();
            async move { poller.refresh(&symbols(&["PIT"]), SyncMode::Live, &[]).await }
        });
        while poller.generation() < 1 {
            tokio::task::yield_now().await;
        }

        poller.invalidate();
        tx.send(vec![quote("PIT", dec!(22.30))]).unwrap();

        assert!(!pending.await.unwrap().committed);
        assert!(poller.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_evict_and_ordered_reads() {
        let poller = QuotePoller::new(Arc::new(InMemoryRemote::new()));
        poller.upsert(quote("PAWN", dec!(15))).await;
        poller.upsert(quote("GRIZ", dec!(95))).await;

        let ordered = poller.quotes_for(&symbols(&["GRIZ", "TOMS", "PAWN"])).await;
        let order: Vec<_> = ordered.iter().map(|q| q.symbol.as_str()).collect();
        assert_eq!(order, vec!["GRIZ", "PAWN"]);

        poller.evict("PAWN").await;
        assert!(!poller.snapshot().await.contains_key("PAWN"));
        assert_eq!(poller.generation(), 3);
    }
}
