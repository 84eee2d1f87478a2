//! Prompt list loading.

use std::io::ErrorKind;
use std::path::Path;

use crate::error::ImageError;

/// Read the prompt file: one prompt per line, trimmed, blank lines dropped.
///
/// Position in the returned list (plus one) is the prompt's ordinal.
///
/// # Errors
///
/// Returns [`ImageError::InputNotFound`] if the file does not exist and
/// [`ImageError::Io`] for any other read failure.
pub fn load_prompts(path: &Path) -> Result<Vec<String>, ImageError> {
    let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ImageError::InputNotFound { path: path.to_path_buf() },
        _ => ImageError::Io(e),
    })?;
    Ok(parse_prompts(&contents))
}

fn parse_prompts(contents: &str) -> Vec<String> {
    contents.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string).collect()
}
