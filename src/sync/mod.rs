//! Synchronization of the tracked set and its quotes with the remote source.

mod engine;
mod poller;
mod scheduler;
mod tracked_store;

pub use engine::{SyncEngine, SyncEngineBuilder};
pub use poller::{QuotePoller, QuoteSource, RefreshOutcome};
pub use scheduler::PollScheduler;
pub use tracked_store::{TrackedLoad, TrackedSetStore};
