//! Remote service credentials read from the environment.
//!
//! Missing backend credentials are not an error: the application falls back to
//! demo mode. The image API key is only checked when a transform is requested.

use crate::config::env::{get_env_var, resolve_with};
use tracing::warn;

/// Default generative-image model.
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// Backend endpoint and API key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Anonymous API key sent with every request
    pub key: String,
}

impl BackendConfig {
    /// Reads `SUPABASE_URL` and `SUPABASE_KEY` (with bundler prefixes).
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`BackendConfig::from_env`] against a custom lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            url: resolve_with("SUPABASE_URL", &lookup),
            key: resolve_with("SUPABASE_KEY", &lookup),
        };
        if !config.is_configured() {
            warn!(
                "Backend not configured. Set SUPABASE_URL and SUPABASE_KEY to persist data; running in demo mode."
            );
        }
        config
    }

    /// Both values must be present for the real backend to be used.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        !self.url.is_empty() && !self.key.is_empty()
    }
}

/// Credentials for the image transform API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformConfig {
    pub api_key: Option<String>,
    pub model: String,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }
}

impl TransformConfig {
    /// Reads `API_KEY` (falling back to `GEMINI_API_KEY`) and `GEMINI_MODEL`.
    #[must_use]
    pub fn from_env() -> Self {
        let api_key = Some(get_env_var("API_KEY"))
            .filter(|key| !key.is_empty())
            .or_else(|| Some(get_env_var("GEMINI_API_KEY")).filter(|key| !key.is_empty()));
        let model = Some(get_env_var("GEMINI_MODEL"))
            .filter(|model| !model.is_empty())
            .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string());
        Self { api_key, model }
    }
}
