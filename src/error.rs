//! Unified error type for fakegen.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while driving a batch.
#[derive(Debug, Error)]
pub enum ImageError {
    /// An API returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// A network error occurred.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A cassette supplied a failure or ran out of interactions.
    #[error("{0}")]
    Replay(String),

    /// Image decode, normalization or encode error.
    #[error("Image conversion error: {0}")]
    ImageConversion(String),

    /// No API key configured.
    #[error("{env_var} is not set. Add it to your .env file, the environment, or the config file.")]
    MissingApiKey {
        /// The environment variable name.
        env_var: String,
    },

    /// The prompt file does not exist.
    #[error("Prompt file {} not found", .path.display())]
    InputNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },
}
