//! Artifact store port: where finished images land.

use std::path::Path;

use crate::error::ImageError;

/// Persists encoded artifacts and answers whether one already exists.
///
/// The existence check is the only record of completed work, so `write`
/// must never leave a partial file at `path`.
pub trait ArtifactStore: Send + Sync {
    /// Whether an artifact is already present at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Create `dir` and its parents if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    fn ensure_dir(&self, dir: &Path) -> Result<(), ImageError>;

    /// Store `data` at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be written.
    fn write(&self, path: &Path, data: &[u8]) -> Result<(), ImageError>;
}
