//! Authoritative tracked-set storage.
//!
//! Membership changes are write-through: the remote write must succeed before
//! the local set and the persisted mirror change. Reads fall back to the mirror
//! when the remote list cannot be fetched.

use crate::api::QuoteClient;
use crate::error::{Error, Result};
use crate::state::{Quote, TrackedSet, normalize_symbol};
use crate::storage::TrackedMirror;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Result of [`TrackedSetStore::load`].
#[derive(Debug)]
pub struct TrackedLoad {
    /// The set now held by the store.
    pub tracked: TrackedSet,
    /// Quotes returned by the remote list (empty when it failed).
    pub quotes: Vec<Quote>,
    /// Why the remote list could not be used, if it could not.
    pub failure: Option<Error>,
}

/// Owns the tracked set and keeps it in step with the remote source and the
/// local mirror.
pub struct TrackedSetStore {
    remote: Arc<dyn QuoteClient>,
    mirror: Arc<dyn TrackedMirror>,
    set: RwLock<TrackedSet>,
    /// Serializes load/add/remove.
    writer: Mutex<()>,
}

impl TrackedSetStore {
    /// Create an empty store.
    pub fn new(remote: Arc<dyn QuoteClient>, mirror: Arc<dyn TrackedMirror>) -> Self {
        Self {
            remote,
            mirror,
            set: RwLock::new(TrackedSet::new()),
            writer: Mutex::new(()),
        }
    }

    /// Snapshot of the current set.
    pub async fn snapshot(&self) -> TrackedSet {
        self.set.read().await.clone()
    }

    /// Current symbols in display order.
    pub async fn symbols(&self) -> Vec<String> {
        self.set.read().await.to_vec()
    }

    pub async fn is_empty(&self) -> bool {
        self.set.read().await.is_empty()
    }

    /// Replace the set from the remote list, or from the mirror if the remote
    /// list is unavailable. Never fails.
    pub async fn load(&self) -> TrackedLoad {
        let _writer = self.writer.lock().await;

        match self.remote.fetch_tracked().await {
            Ok(quotes) => {
                let tracked = TrackedSet::from_symbols(quotes.iter().map(|q| q.symbol.clone()));
                self.persist(&tracked);
                *self.set.write().await = tracked.clone();
                info!("Loaded {} tracked symbols from remote", tracked.len());
                TrackedLoad {
                    tracked,
                    quotes,
                    failure: None,
                }
            }
            Err(e) => {
                warn!("Tracked list unavailable, reading mirror: {}", e);
                let tracked = self.read_mirror();
                *self.set.write().await = tracked.clone();
                TrackedLoad {
                    tracked,
                    quotes: Vec::new(),
                    failure: Some(e),
                }
            }
        }
    }

    /// Track `symbol` on the remote source, then locally.
    ///
    /// Fails with [`Error::AlreadyTracked`] without any remote call when the
    /// symbol is already a member; remote failures are returned unchanged and
    /// leave the set untouched.
    pub async fn add(&self, symbol: &str) -> Result<Quote> {
        let symbol = normalize_symbol(symbol).ok_or_else(|| Error::InvalidSymbol(symbol.into()))?;
        let _writer = self.writer.lock().await;

        if self.set.read().await.contains(&symbol) {
            return Err(Error::AlreadyTracked(symbol));
        }

        let quote = self.remote.track(&symbol).await?;

        let mut set = self.set.write().await;
        set.insert(quote.symbol.clone());
        self.persist(&set);
        info!("Tracking {}", quote.symbol);

        Ok(quote)
    }

    /// Untrack `symbol` on the remote source, then locally.
    ///
    /// Fails with [`Error::NotTracked`] without any remote call or mirror
    /// write when the symbol is not a member.
    pub async fn remove(&self, symbol: &str) -> Result<()> {
        let symbol = normalize_symbol(symbol).ok_or_else(|| Error::InvalidSymbol(symbol.into()))?;
        let _writer = self.writer.lock().await;

        if !self.set.read().await.contains(&symbol) {
            return Err(Error::NotTracked(symbol));
        }

        self.remote.untrack(&symbol).await?;

        let mut set = self.set.write().await;
        set.remove(&symbol);
        self.persist(&set);
        info!("Stopped tracking {}", symbol);

        Ok(())
    }

    fn read_mirror(&self) -> TrackedSet {
        match self.mirror.read_tracked_mirror() {
            Ok(symbols) => TrackedSet::from_symbols(symbols),
            Err(Error::PersistedMirrorMissing) => {
                debug!("No tracked mirror yet, starting empty");
                TrackedSet::new()
            }
            Err(e) => {
                warn!("Tracked mirror unreadable, starting empty: {}", e);
                TrackedSet::new()
            }
        }
    }

    fn persist(&self, set: &TrackedSet) {
        if let Err(e) = self.mirror.write_tracked_mirror(set.as_slice()) {
            warn!("Failed to persist tracked mirror: {}", e);
        }
    }
}
