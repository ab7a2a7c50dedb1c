//! JSON file mirror.

use super::TrackedMirror;
use crate::error::{Error, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Stores the tracked symbols as a JSON array in a single file.
#[derive(Debug, Clone)]
pub struct FileMirror {
    path: PathBuf,
}

impl FileMirror {
    /// Create a mirror backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the mirror file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TrackedMirror for FileMirror {
    fn read_tracked_mirror(&self) -> Result<Vec<String>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::PersistedMirrorMissing);
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    fn write_tracked_mirror(&self, symbols: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string(symbols)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("ticker-sync-{}-{name}", std::process::id()))
            .join("tracked.json")
    }

    #[test]
    fn test_missing_file_is_missing_mirror() {
        let mirror = FileMirror::new(scratch_path("missing"));
        assert!(matches!(
            mirror.read_tracked_mirror(),
            Err(Error::PersistedMirrorMissing)
        ));
    }

    #[test]
    fn test_write_then_read_preserves_order() {
        let path = scratch_path("order");
        let mirror = FileMirror::new(&path);
        let symbols = vec!["SWANSON".to_string(), "PAWN".to_string()];

        mirror.write_tracked_mirror(&symbols).unwrap();
        assert_eq!(mirror.read_tracked_mirror().unwrap(), symbols);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            r#"["SWANSON","PAWN"]"#
        );

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let path = scratch_path("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        let mirror = FileMirror::new(&path);
        assert!(matches!(
            mirror.read_tracked_mirror(),
            Err(Error::Serialization(_))
        ));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
