//! Application settings loading from `agelens.toml`
//!
//! Every field has a default, so the file is optional. It exists to point a
//! deployment at a different bucket or table without recompiling.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Default settings file looked up in the working directory.
pub const DEFAULT_SETTINGS_PATH: &str = "agelens.toml";

/// Tunables that are not secrets.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppSettings {
    /// Storage bucket holding original and generated images
    pub bucket: String,
    /// Table recording each saved generation
    pub generations_table: String,
    /// Largest accepted upload, in bytes
    pub max_upload_bytes: usize,
    /// Timeout applied to every outbound HTTP request, in seconds
    pub request_timeout_secs: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            bucket: "agelens-images".to_string(),
            generations_table: "generations".to_string(),
            max_upload_bytes: 5 * 1024 * 1024,
            request_timeout_secs: 120,
        }
    }
}

/// Loads settings from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<AppSettings> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read settings file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse settings file: {e}"),
    })
}

/// Loads settings from `AGELENS_CONFIG` or `./agelens.toml`, falling back to
/// defaults when the file does not exist.
pub fn load_default_settings() -> Result<AppSettings> {
    let path = std::env::var("AGELENS_CONFIG").unwrap_or_else(|_| DEFAULT_SETTINGS_PATH.into());
    if Path::new(&path).exists() {
        tracing::debug!("Loading settings from {}", path);
        load_settings(&path)
    } else {
        tracing::debug!("No settings file at {}, using defaults", path);
        Ok(AppSettings::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_partial_settings() {
        let toml_str = r#"
            bucket = "staging-images"
            max_upload_bytes = 1048576
        "#;

        let settings: AppSettings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.bucket, "staging-images");
        assert_eq!(settings.max_upload_bytes, 1_048_576);
        assert_eq!(settings.generations_table, "generations");
        assert_eq!(settings.request_timeout_secs, 120);
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let settings: AppSettings = toml::from_str("").unwrap();
        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn test_missing_file_is_a_config_error() {
        let result = load_settings("/definitely/not/here/agelens.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
