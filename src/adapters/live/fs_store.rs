//! Filesystem-backed artifact store.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::ImageError;
use crate::ports::ArtifactStore;

/// Stores artifacts as plain files.
///
/// Writes go to a hidden `.part` sibling first and are renamed into place,
/// so an interrupted run never leaves a truncated file at the final path.
#[derive(Debug, Default)]
pub struct FsStore;

impl FsStore {
    /// Create a filesystem store.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".part");
    path.with_file_name(name)
}

impl ArtifactStore for FsStore {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn ensure_dir(&self, dir: &Path) -> Result<(), ImageError> {
        std::fs::create_dir_all(dir).map_err(ImageError::Io)
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<(), ImageError> {
        let staging = staging_path(path);
        std::fs::write(&staging, data)?;
        if let Err(e) = std::fs::rename(&staging, path) {
            let _ = std::fs::remove_file(&staging);
            return Err(ImageError::Io(e));
        }
        Ok(())
    }
}
