//! Backend layer - auth, row queries and blob storage behind one facade.
//!
//! Two implementations exist: [`supabase::SupabaseBackend`] talks to the hosted
//! service over HTTP, and [`mock::MockBackend`] emulates it in memory for demo
//! mode. [`connect`] picks one from the configuration.

/// Auth state publish/subscribe channel
pub mod auth_events;
/// In-memory backend used in demo mode
pub mod mock;
/// Query builder and the data access trait
pub mod query;
/// Blob storage trait and bucket wrapper
pub mod storage;
/// HTTP adapter for the hosted backend
pub mod supabase;

pub use auth_events::{AuthEvent, AuthEvents, Subscription};
pub use query::{DataApi, InsertBuilder, OrderOptions, Query, QueryBuilder, QueryResponse};
pub use storage::{Bucket, StorageApi, UploadResponse};

use crate::config::{AppSettings, BackendConfig};
use crate::entities::{Session, SignUpOptions};
use crate::errors::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Session-based authentication.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Current session, if any.
    async fn get_session(&self) -> Result<Option<Session>>;

    /// Signs in and notifies listeners with [`AuthEvent::SignedIn`] before
    /// returning.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    /// Creates an account. Returns `None` when the backend requires the
    /// address to be confirmed before a session is issued.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        options: SignUpOptions,
    ) -> Result<Option<Session>>;

    /// Clears the session and notifies listeners with [`AuthEvent::SignedOut`].
    async fn sign_out(&self) -> Result<()>;

    /// Registers `listener`; it is immediately called with the current
    /// session.
    fn on_auth_state_change(
        &self,
        listener: Box<dyn Fn(AuthEvent, Option<&Session>) + Send + Sync>,
    ) -> Subscription;
}

/// Which implementation is behind a [`BackendClient`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendMode {
    /// Hosted backend with real credentials
    Remote,
    /// Volatile in-memory emulation
    Demo,
}

/// Uniform facade over auth, data and storage.
pub trait BackendClient: AuthApi + DataApi + StorageApi {
    /// Hosted or demo.
    fn mode(&self) -> BackendMode;
}

/// Builds the backend for `config`: the hosted one when both URL and key are
/// set, the in-memory mock otherwise.
///
/// # Errors
/// Fails only if the HTTP client cannot be constructed.
pub fn connect(config: &BackendConfig, settings: &AppSettings) -> Result<Arc<dyn BackendClient>> {
    if config.is_configured() {
        info!("Using hosted backend at {}", config.url);
        Ok(Arc::new(supabase::SupabaseBackend::new(config, settings)?))
    } else {
        warn!("Backend credentials missing; using in-memory demo backend");
        Ok(Arc::new(mock::MockBackend::new()))
    }
}
