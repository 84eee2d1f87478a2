//! Service context that bundles all port trait objects.

use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::adapters::live::fs_store::FsStore;
use crate::adapters::live::gemini::GeminiGenerator;
use crate::adapters::live::tokio_pacer::TokioPacer;
use crate::adapters::replaying::image_generator::ReplayingImageGenerator;
use crate::cassette::config::load_cassette;
use crate::config::{Config, API_KEY_ENV};
use crate::error::ImageError;
use crate::ports::{ArtifactStore, ImageGenerator, Pacer};

/// Bundles all port trait objects into a single context.
pub struct ServiceContext {
    /// Image generator port.
    pub generator: Box<dyn ImageGenerator>,
    /// Artifact store port.
    pub store: Box<dyn ArtifactStore>,
    /// Pacer port.
    pub pacer: Box<dyn Pacer>,
}

impl ServiceContext {
    fn with_generator(generator: Box<dyn ImageGenerator>) -> Self {
        Self { generator, store: Box::new(FsStore::new()), pacer: Box::new(TokioPacer::new()) }
    }

    /// Create a live context talking to Gemini.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not configured or the HTTP client
    /// cannot be built.
    pub fn live(config: &Config) -> Result<Self, ImageError> {
        let key = config
            .gemini_key()
            .ok_or_else(|| ImageError::MissingApiKey { env_var: API_KEY_ENV.into() })?;
        Ok(Self::with_generator(Box::new(GeminiGenerator::new(key)?)))
    }

    /// Create a replaying context from a cassette file; no credential needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be loaded.
    pub fn replaying(path: &Path) -> Result<Self, ImageError> {
        let replayer = load_cassette(path)
            .map_err(|e| ImageError::Config(format!("Failed to load cassette: {e}")))?;
        let replayer = Arc::new(Mutex::new(replayer));
        Ok(Self::with_generator(Box::new(ReplayingImageGenerator::new(replayer))))
    }
}
