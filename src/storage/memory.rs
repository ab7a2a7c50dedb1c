//! Process-local mirror.

use super::TrackedMirror;
use crate::error::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Keeps the mirror in memory and counts writes.
#[derive(Debug, Default)]
pub struct MemoryMirror {
    symbols: Mutex<Option<Vec<String>>>,
    writes: AtomicUsize,
}

impl MemoryMirror {
    /// Create an empty mirror (reads report a missing mirror).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mirror that already holds `symbols`.
    pub fn with_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            symbols: Mutex::new(Some(symbols.into_iter().map(Into::into).collect())),
            writes: AtomicUsize::new(0),
        }
    }

    /// Current mirrored symbols, if any were written.
    pub fn symbols(&self) -> Option<Vec<String>> {
        self.symbols
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of writes performed.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl TrackedMirror for MemoryMirror {
    fn read_tracked_mirror(&self) -> Result<Vec<String>> {
        self.symbols().ok_or(Error::PersistedMirrorMissing)
    }

    fn write_tracked_mirror(&self, symbols: &[String]) -> Result<()> {
        *self.symbols.lock().unwrap_or_else(PoisonError::into_inner) = Some(symbols.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_mirror() {
        let mirror = MemoryMirror::new();
        assert!(matches!(
            mirror.read_tracked_mirror(),
            Err(Error::PersistedMirrorMissing)
        ));

        mirror.write_tracked_mirror(&["JJ".to_string()]).unwrap();
        assert_eq!(mirror.read_tracked_mirror().unwrap(), vec!["JJ"]);
        assert_eq!(mirror.write_count(), 1);
    }
}
