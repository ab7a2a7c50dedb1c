//! State management for ticker-sync.
//!
//! Engine-wide state is changed only by reducing [`SyncEvent`]s, so the
//! Live/Fallback policy lives in one place: [`SyncState::reduce`].

mod catalog;
mod quote;
mod tracked;

pub use catalog::{CatalogEntry, CatalogListing, find_entry, reference_catalog};
pub use quote::{Quote, QuoteMap, Trend, index_quotes};
pub use tracked::{TrackedSet, normalize_symbol};

use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Whether the catalog/quote path is degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Remote-backed data.
    #[default]
    Live,
    /// Locally synthesized data; the remote source is assumed unreachable.
    Fallback,
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Live => write!(f, "Live"),
            Self::Fallback => write!(f, "Fallback"),
        }
    }
}

/// A display-only message describing a degraded or failed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory {
    pub message: String,
    pub level: AdvisoryLevel,
    /// Underlying failure, for logs and diagnostics.
    pub reason: Option<String>,
}

/// Advisory severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisoryLevel {
    /// Degraded: local data is being shown.
    Warning,
    /// A requested change was not made.
    Error,
}

impl Advisory {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: AdvisoryLevel::Warning,
            reason: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: AdvisoryLevel::Error,
            reason: None,
        }
    }

    /// Attach the failure that caused this advisory.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

pub const CATALOG_UNAVAILABLE: &str = "Unable to load stocks from the API. Showing sample data.";
pub const TRACKED_UNAVAILABLE: &str = "Unable to load tracked stocks from API. Showing local data.";
pub const ADD_FAILED: &str = "Unable to add tracked stock.";
pub const REMOVE_FAILED: &str = "Unable to remove tracked stock.";

/// Events that change engine-wide state.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// A catalog fetch succeeded.
    CatalogLoaded(Vec<CatalogEntry>),
    /// A catalog fetch failed.
    CatalogFailed(String),
    /// The remote tracked list could not be fetched.
    TrackedFailed(String),
    /// A batched quote fetch failed.
    QuotesFailed(String),
    /// An add/remove write failed.
    WriteFailed { advisory: &'static str, reason: String },
    /// Dismiss the current advisory.
    ClearAdvisory,
}

/// Mode, catalog and advisory shared by every engine operation.
#[derive(Debug, Clone)]
pub struct SyncState {
    /// Current mode.
    pub mode: SyncMode,
    /// Catalog, replaced wholesale.
    pub catalog: Arc<Vec<CatalogEntry>>,
    /// Current advisory.
    pub advisory: Option<Advisory>,
    /// When the catalog was last replaced.
    pub catalog_updated: Option<DateTime<Utc>>,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            mode: SyncMode::Live,
            catalog: Arc::new(Vec::new()),
            advisory: None,
            catalog_updated: None,
        }
    }
}

impl SyncState {
    /// Create the initial state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an event. Returns the previous mode when the mode changed.
    pub fn reduce(&mut self, event: SyncEvent) -> Option<SyncMode> {
        let previous = self.mode;
        match event {
            SyncEvent::CatalogLoaded(entries) => {
                self.catalog = Arc::new(entries);
                self.catalog_updated = Some(Utc::now());
                self.mode = SyncMode::Live;
                self.advisory = None;
            }
            SyncEvent::CatalogFailed(reason) => {
                self.catalog = Arc::new(reference_catalog());
                self.catalog_updated = Some(Utc::now());
                self.mode = SyncMode::Fallback;
                self.advisory = Some(Advisory::warning(CATALOG_UNAVAILABLE).with_reason(reason));
            }
            SyncEvent::TrackedFailed(reason) => {
                self.ensure_catalog();
                self.mode = SyncMode::Fallback;
                self.advisory = Some(Advisory::warning(TRACKED_UNAVAILABLE).with_reason(reason));
            }
            SyncEvent::QuotesFailed(reason) => {
                self.ensure_catalog();
                self.mode = SyncMode::Fallback;
                self.advisory = Some(Advisory::warning(CATALOG_UNAVAILABLE).with_reason(reason));
            }
            SyncEvent::WriteFailed { advisory, reason } => {
                self.advisory = Some(Advisory::error(advisory).with_reason(reason));
            }
            SyncEvent::ClearAdvisory => {
                self.advisory = None;
            }
        }

        (self.mode != previous).then_some(previous)
    }

    /// Synthesis needs base prices even if the catalog was never loaded.
    fn ensure_catalog(&mut self) {
        if self.catalog.is_empty() {
            self.catalog = Arc::new(reference_catalog());
        }
    }
}
