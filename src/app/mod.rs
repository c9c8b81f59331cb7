//! Application layer - the explicit context object plus the stateful flows a
//! front end drives: session/view controller and the image generator.

/// View state and auth-driven navigation
pub mod controller;
/// Upload, transform and save workflow
pub mod generator;

pub use controller::{SessionController, ViewState};
pub use generator::{Generator, ProcessingStatus};

use crate::backend::{self, BackendClient, BackendMode};
use crate::config::{AppSettings, BackendConfig, TransformConfig};
use crate::errors::Result;
use crate::transform::{GeminiTransformer, ImageTransformer};
use std::sync::Arc;
use tracing::info;

/// Everything the flows need, built once at startup and shared.
#[derive(Clone)]
pub struct AppContext {
    pub settings: AppSettings,
    pub backend: Arc<dyn BackendClient>,
    pub transformer: Arc<dyn ImageTransformer>,
}

impl AppContext {
    #[must_use]
    pub fn new(
        settings: AppSettings,
        backend: Arc<dyn BackendClient>,
        transformer: Arc<dyn ImageTransformer>,
    ) -> Self {
        Self {
            settings,
            backend,
            transformer,
        }
    }

    /// Builds the context from environment variables. Falls back to the demo
    /// backend when backend credentials are missing.
    ///
    /// # Errors
    /// Fails only if an HTTP client cannot be constructed.
    pub fn from_env(settings: AppSettings) -> Result<Self> {
        let backend = backend::connect(&BackendConfig::from_env(), &settings)?;
        let transformer = GeminiTransformer::new(&TransformConfig::from_env(), &settings)?;
        info!("Application context ready ({:?} mode)", backend.mode());
        Ok(Self::new(settings, backend, Arc::new(transformer)))
    }

    #[must_use]
    pub fn mode(&self) -> BackendMode {
        self.backend.mode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_demo_context;

    #[test]
    fn test_demo_context() {
        let context = setup_demo_context();
        assert_eq!(context.mode(), BackendMode::Demo);
        assert_eq!(context.settings, AppSettings::default());
    }
}
