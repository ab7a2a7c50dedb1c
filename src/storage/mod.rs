//! Local persisted mirror of the tracked set.
//!
//! The mirror is the ground truth for membership while the remote source is
//! unreachable. Only the ordered list of symbols is stored.

mod file;
mod memory;

pub use file::FileMirror;
pub use memory::MemoryMirror;

use crate::error::Result;

/// Read/write contract for the persisted tracked-symbol mirror.
#[cfg_attr(test, mockall::automock)]
pub trait TrackedMirror: Send + Sync {
    /// Read the mirrored symbols in order.
    ///
    /// Returns [`crate::Error::PersistedMirrorMissing`] when nothing was
    /// written yet.
    fn read_tracked_mirror(&self) -> Result<Vec<String>>;

    /// Overwrite the mirror with `symbols`.
    fn write_tracked_mirror(&self, symbols: &[String]) -> Result<()>;
}
