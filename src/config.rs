//! Configuration file loading and run-configuration resolution.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cli::Cli;
use crate::error::ImageError;
use crate::model::{resolve_model, validate_model, DEFAULT_MODEL};
use crate::safety::SafetyPolicy;

/// Environment variable holding the Gemini credential.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Top-level configuration file.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// API key configuration.
    #[serde(default)]
    pub keys: KeysConfig,

    /// Defaults used when the matching CLI flag is absent.
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// API key configuration.
#[derive(Debug, Default, Deserialize)]
pub struct KeysConfig {
    /// Gemini API key.
    pub gemini: Option<String>,
}

/// Default batch settings from the config file.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Model name or alias.
    pub model: String,
    /// Prompt list path.
    pub prompts: PathBuf,
    /// Directory receiving `fakeNNN.jpg` files.
    pub output_dir: PathBuf,
    /// Pause after each attempt, in seconds.
    pub delay_secs: u64,
    /// Pause after a rate-limited attempt, in seconds.
    pub rate_limit_delay_secs: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            prompts: PathBuf::from("prompts.txt"),
            output_dir: PathBuf::from("fakes"),
            delay_secs: 10,
            rate_limit_delay_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from the given path, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
    }

    /// Get the Gemini API key, preferring the environment variable.
    ///
    /// Blank values count as unset wherever they come from.
    #[must_use]
    pub fn gemini_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.keys.gemini.clone().filter(|k| !k.trim().is_empty()))
    }
}

/// Immutable settings for one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Resolved model identifier.
    pub model: String,
    /// Prompt list path.
    pub prompts_path: PathBuf,
    /// Output directory.
    pub output_dir: PathBuf,
    /// Safety thresholds sent with every request; always fully permissive.
    pub safety: SafetyPolicy,
    /// Pause owed after every attempt.
    pub delay: Duration,
    /// Pause owed after a rate-limited attempt.
    pub rate_limit_delay: Duration,
}

impl BatchConfig {
    /// Merge CLI flags over config-file defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not a Gemini model or the rate-limit
    /// delay is not strictly longer than the standard delay.
    pub fn resolve(cli: &Cli, config: &Config) -> Result<Self, ImageError> {
        let defaults = &config.defaults;
        let model = resolve_model(cli.model.as_deref().unwrap_or(&defaults.model));
        validate_model(&model).map_err(ImageError::InvalidArgument)?;

        let delay_secs = cli.delay_secs.unwrap_or(defaults.delay_secs);
        let rate_limit_delay_secs =
            cli.rate_limit_delay_secs.unwrap_or(defaults.rate_limit_delay_secs);
        if rate_limit_delay_secs <= delay_secs {
            return Err(ImageError::InvalidArgument(format!(
                "rate-limit delay ({rate_limit_delay_secs}s) must be longer than the \
                 standard delay ({delay_secs}s)"
            )));
        }

        Ok(Self {
            model,
            prompts_path: cli.prompts.clone().unwrap_or_else(|| defaults.prompts.clone()),
            output_dir: cli.output_dir.clone().unwrap_or_else(|| defaults.output_dir.clone()),
            safety: SafetyPolicy::default(),
            delay: Duration::from_secs(delay_secs),
            rate_limit_delay: Duration::from_secs(rate_limit_delay_secs),
        })
    }
}

/// Discover the config file path using the resolution order:
/// 1. Explicit path (from `--config` flag)
/// 2. `FAKEGEN_CONFIG` environment variable
/// 3. `~/.config/fakegen/config.toml`
#[must_use]
pub fn discover_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    if let Ok(p) = std::env::var("FAKEGEN_CONFIG") {
        return PathBuf::from(p);
    }

    default_config_path()
}

/// Default config path: `~/.config/fakegen/config.toml`.
fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config/fakegen/config.toml")
    } else {
        PathBuf::from("fakegen.toml")
    }
}
