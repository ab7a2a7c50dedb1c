//! Sync engine - composition root for catalog, tracked set and quotes.

use super::{PollScheduler, QuotePoller, TrackedSetStore};
use crate::api::{CatalogClient, QuoteClient};
use crate::config::SyncConfig;
use crate::error::Result;
use crate::state::{
    ADD_FAILED, Advisory, CatalogEntry, CatalogListing, Quote, QuoteMap, REMOVE_FAILED,
    SyncEvent, SyncMode, SyncState, TrackedSet, index_quotes,
};
use crate::pricing::generate_quote;
use crate::storage::TrackedMirror;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Builder for creating a sync engine.
pub struct SyncEngineBuilder {
    catalog_client: Option<Arc<dyn CatalogClient>>,
    quote_client: Option<Arc<dyn QuoteClient>>,
    mirror: Option<Arc<dyn TrackedMirror>>,
    config: SyncConfig,
}

impl SyncEngineBuilder {
    /// Create a new builder with default config.
    pub fn new() -> Self {
        Self {
            catalog_client: None,
            quote_client: None,
            mirror: None,
            config: SyncConfig::default(),
        }
    }

    /// Set the catalog client.
    pub fn catalog_client(mut self, client: Arc<dyn CatalogClient>) -> Self {
        self.catalog_client = Some(client);
        self
    }

    /// Set the quote client.
    pub fn quote_client(mut self, client: Arc<dyn QuoteClient>) -> Self {
        self.quote_client = Some(client);
        self
    }

    /// Use one remote for both catalog and quotes.
    pub fn remote<R>(self, remote: Arc<R>) -> Self
    where
        R: CatalogClient + QuoteClient + 'static,
    {
        self.catalog_client(remote.clone()).quote_client(remote)
    }

    /// Set the persisted mirror.
    pub fn mirror(mut self, mirror: Arc<dyn TrackedMirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Set the sync configuration.
    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the engine.
    pub fn build(self) -> Result<SyncEngine> {
        let catalog_client = self
            .catalog_client
            .ok_or_else(|| crate::Error::config("SyncEngine requires a catalog client"))?;
        let quote_client = self
            .quote_client
            .ok_or_else(|| crate::Error::config("SyncEngine requires a quote client"))?;
        let mirror = self
            .mirror
            .ok_or_else(|| crate::Error::config("SyncEngine requires a tracked mirror"))?;

        Ok(SyncEngine::new(catalog_client, quote_client, mirror, self.config))
    }
}

impl Default for SyncEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct EngineInner {
    catalog_client: Arc<dyn CatalogClient>,
    tracked: TrackedSetStore,
    poller: QuotePoller,
    /// Held across a tracked-set change and the cache update that follows it.
    membership: Mutex<()>,
    state: RwLock<SyncState>,
    scheduler: Mutex<PollScheduler>,
    config: SyncConfig,
}

/// Keeps the tracked set, the catalog and the quote cache consistent with the
/// remote source, degrading to local data when it is unreachable.
///
/// Cloning is cheap; all clones share the same state.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
}

impl SyncEngine {
    /// Create a new engine in [`SyncMode::Live`] with nothing tracked.
    pub fn new(
        catalog_client: Arc<dyn CatalogClient>,
        quote_client: Arc<dyn QuoteClient>,
        mirror: Arc<dyn TrackedMirror>,
        config: SyncConfig,
    ) -> Self {
        let scheduler = PollScheduler::new(config.poll_interval());
        Self {
            inner: Arc::new(EngineInner {
                catalog_client,
                tracked: TrackedSetStore::new(quote_client.clone(), mirror),
                poller: QuotePoller::new(quote_client),
                membership: Mutex::new(()),
                state: RwLock::new(SyncState::new()),
                scheduler: Mutex::new(scheduler),
                config,
            }),
        }
    }

    /// Start building an engine.
    pub fn builder() -> SyncEngineBuilder {
        SyncEngineBuilder::new()
    }

    /// Load the catalog, then the tracked set.
    pub async fn initialize(&self) -> TrackedSet {
        self.get_catalog().await;
        self.reload_tracked().await
    }

    /// Fetch the catalog.
    ///
    /// On failure the reference catalog is served with synthesized quotes and
    /// the engine enters [`SyncMode::Fallback`]. A successful fetch is the only
    /// way back to [`SyncMode::Live`].
    pub async fn get_catalog(&self) -> Vec<CatalogListing> {
        match self.inner.catalog_client.fetch_catalog().await {
            Ok(listings) => {
                let entries = listings.iter().map(|l| l.entry.clone()).collect();
                self.apply(SyncEvent::CatalogLoaded(entries)).await;
                info!("Loaded catalog with {} entries", listings.len());
                listings
            }
            Err(e) => {
                warn!("Catalog unavailable, using reference catalog: {}", e);
                self.apply(SyncEvent::CatalogFailed(e.to_string())).await;
                let catalog = self.catalog().await;
                Self::reference_listings(&catalog)
            }
        }
    }

    /// Retry the remote source after a degradation.
    pub async fn retry(&self) -> SyncMode {
        self.get_catalog().await;
        self.mode().await
    }

    /// Reload the tracked set from the remote source, or from the mirror when
    /// the remote list is unavailable.
    pub async fn reload_tracked(&self) -> TrackedSet {
        let _membership = self.inner.membership.lock().await;
        let loaded = self.inner.tracked.load().await;

        match &loaded.failure {
            None => {
                self.inner
                    .poller
                    .install(index_quotes(loaded.quotes.iter().cloned()))
                    .await;
            }
            Some(e) => {
                self.apply(SyncEvent::TrackedFailed(e.to_string())).await;
                let catalog = self.catalog().await;
                let quotes = QuotePoller::synthesize(&catalog, loaded.tracked.as_slice());
                self.inner.poller.install(quotes).await;
            }
        }

        self.sync_polling().await;
        loaded.tracked
    }

    /// Refresh quotes for every tracked symbol and return the quote cache.
    ///
    /// A batch failure switches to [`SyncMode::Fallback`] and the same cycle is
    /// served by local synthesis. If the refresh was superseded while in
    /// flight, the newer cache is returned instead of its discarded result.
    pub async fn refresh(&self) -> QuoteMap {
        let symbols = self.inner.tracked.symbols().await;
        let (mode, catalog) = {
            let state = self.inner.state.read().await;
            (state.mode, state.catalog.clone())
        };

        let outcome = self.inner.poller.refresh(&symbols, mode, &catalog).await;
        debug!(
            "Refresh generation {} ({:?}, committed: {})",
            outcome.generation, outcome.source, outcome.committed
        );

        if let Some(e) = outcome.failure {
            self.apply(SyncEvent::QuotesFailed(e.to_string())).await;
        }

        if outcome.committed {
            outcome.quotes
        } else {
            self.quotes().await
        }
    }

    /// Cached quotes for the tracked set, in display order.
    pub async fn get_tracked_quotes(&self) -> Vec<Quote> {
        let symbols = self.inner.tracked.symbols().await;
        self.inner.poller.quotes_for(&symbols).await
    }

    /// Track `symbol`. The remote write must succeed before anything changes
    /// locally; its error is returned unchanged otherwise.
    pub async fn add_tracked(&self, symbol: &str) -> Result<Quote> {
        let _membership = self.inner.membership.lock().await;
        match self.inner.tracked.add(symbol).await {
            Ok(quote) => {
                self.inner.poller.upsert(quote.clone()).await;
                self.sync_polling().await;
                Ok(quote)
            }
            Err(e) => {
                if e.is_remote_failure() {
                    warn!("Error adding tracked stock {}: {}", symbol, e);
                } else {
                    debug!("Refused adding tracked stock {}: {}", symbol, e);
                }
                self.apply(SyncEvent::WriteFailed {
                    advisory: ADD_FAILED,
                    reason: e.to_string(),
                })
                .await;
                Err(e)
            }
        }
    }

    /// Untrack `symbol`. The remote write must succeed before anything
    /// changes locally; its error is returned unchanged otherwise.
    pub async fn remove_tracked(&self, symbol: &str) -> Result<()> {
        let _membership = self.inner.membership.lock().await;
        match self.inner.tracked.remove(symbol).await {
            Ok(()) => {
                if let Some(normalized) = crate::state::normalize_symbol(symbol) {
                    self.inner.poller.evict(&normalized).await;
                }
                self.sync_polling().await;
                Ok(())
            }
            Err(e) => {
                if e.is_remote_failure() {
                    warn!("Error removing tracked stock {}: {}", symbol, e);
                } else {
                    debug!("Refused removing tracked stock {}: {}", symbol, e);
                }
                self.apply(SyncEvent::WriteFailed {
                    advisory: REMOVE_FAILED,
                    reason: e.to_string(),
                })
                .await;
                Err(e)
            }
        }
    }

    /// Current mode.
    pub async fn mode(&self) -> SyncMode {
        self.inner.state.read().await.mode
    }

    /// Current advisory, if any.
    pub async fn advisory(&self) -> Option<Advisory> {
        self.inner.state.read().await.advisory.clone()
    }

    /// Dismiss the current advisory.
    pub async fn clear_advisory(&self) {
        self.apply(SyncEvent::ClearAdvisory).await;
    }

    /// Snapshot of the tracked set.
    pub async fn tracked(&self) -> TrackedSet {
        self.inner.tracked.snapshot().await
    }

    /// Catalog entries currently in use.
    pub async fn catalog(&self) -> Arc<Vec<CatalogEntry>> {
        self.inner.state.read().await.catalog.clone()
    }

    /// When the catalog in use was installed, if ever.
    pub async fn catalog_updated(&self) -> Option<DateTime<Utc>> {
        self.inner.state.read().await.catalog_updated
    }

    /// Snapshot of the quote cache.
    pub async fn quotes(&self) -> QuoteMap {
        self.inner.poller.snapshot().await
    }

    /// Whether the poll schedule is running.
    pub async fn is_polling(&self) -> bool {
        self.inner.scheduler.lock().await.is_running()
    }

    /// Stop polling. Responses still in flight are discarded.
    pub async fn shutdown(&self) {
        if self.inner.scheduler.lock().await.stop() {
            info!("Quote polling stopped");
        }
        self.inner.poller.invalidate();
    }

    async fn apply(&self, event: SyncEvent) {
        let mut state = self.inner.state.write().await;
        if let Some(previous) = state.reduce(event) {
            info!("Sync mode changed: {} -> {}", previous, state.mode);
        }
    }

    /// Run the poll schedule exactly while something is tracked.
    async fn sync_polling(&self) {
        if !self.inner.config.auto_poll {
            return;
        }

        let mut scheduler = self.inner.scheduler.lock().await;
        let idle = self.inner.tracked.is_empty().await;

        if idle {
            if scheduler.stop() {
                self.inner.poller.invalidate();
                info!("Quote polling stopped: nothing tracked");
            }
        } else if !scheduler.is_running() {
            let engine: Weak<EngineInner> = Arc::downgrade(&self.inner);
            scheduler.start(move || {
                let engine = engine.clone();
                async move {
                    if let Some(inner) = engine.upgrade() {
                        SyncEngine { inner }.refresh().await;
                    }
                }
            });
            info!("Quote polling started every {:?}", scheduler.period());
        }
    }

    fn reference_listings(catalog: &[CatalogEntry]) -> Vec<CatalogListing> {
        let mut rng = rand::rng();
        catalog
            .iter()
            .map(|entry| CatalogListing {
                entry: entry.clone(),
                quote: generate_quote(entry, &mut rng),
            })
            .collect()
    }
}
