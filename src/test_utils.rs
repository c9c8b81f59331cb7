//! Shared test utilities for `AgeLens`.
//!
//! Every helper builds a fresh in-memory backend, so tests never share state.

use crate::{
    app::AppContext,
    backend::{
        AuthApi, AuthEvent, BackendClient, BackendMode, Bucket, DataApi, InsertBuilder, Query,
        QueryBuilder, QueryResponse, StorageApi, Subscription, UploadResponse,
        mock::MockBackend, query::QueryKind,
    },
    config::AppSettings,
    entities::{AgingStyle, Blob, GenerationRow, NewGeneration, Row, Session, SignUpOptions},
    errors::{Error, Result},
    transform::ImageTransformer,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Eight-byte PNG signature as a data URL.
pub const SAMPLE_PNG_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgo=";
/// JPEG start-of-image marker as a data URL.
pub const SAMPLE_JPEG_DATA_URL: &str = "data:image/jpeg;base64,/9j/4A==";

pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace")))
        .with_test_writer()
        .try_init();
}

/// Transformer that answers instantly with [`SAMPLE_PNG_DATA_URL`], or
/// always fails.
#[derive(Debug, Default)]
pub struct FakeTransformer {
    fail: bool,
}

impl FakeTransformer {
    #[must_use]
    pub const fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl ImageTransformer for FakeTransformer {
    async fn transform(&self, _image: &str, style: AgingStyle) -> Result<String> {
        if self.fail {
            return Err(Error::Transform {
                message: format!("fake failure for {style}"),
            });
        }
        Ok(SAMPLE_PNG_DATA_URL.to_string())
    }
}

/// Demo-mode context with default settings and a [`FakeTransformer`].
#[must_use]
pub fn setup_demo_context() -> AppContext {
    AppContext::new(
        AppSettings::default(),
        Arc::new(MockBackend::new()),
        Arc::new(FakeTransformer::default()),
    )
}

/// Records a generation row pointing at placeholder URLs in the bucket.
/// No blobs are uploaded.
pub async fn insert_generation(
    backend: &dyn BackendClient,
    settings: &AppSettings,
    user_id: &str,
    style: AgingStyle,
) -> Result<GenerationRow> {
    let bucket = Bucket::new(backend, &settings.bucket);
    let row = NewGeneration {
        user_id: user_id.to_string(),
        original_path: bucket.get_public_url(&format!("{user_id}/original.jpg")),
        generated_path: bucket.get_public_url(&format!("{user_id}/{}.png", style.id())),
        style,
    };
    let stored = backend
        .from(&settings.generations_table)
        .insert(row.into_row()?)
        .select()
        .single()
        .await?;
    GenerationRow::from_row(stored)
}

/// Which operations a [`FailingBackend`] rejects.
#[derive(Clone, Copy, Debug, Default)]
pub struct Failures {
    pub row_delete: bool,
    pub upload: bool,
    pub remove: bool,
}

/// Demo backend that fails selected operations with a 500.
#[derive(Default)]
pub struct FailingBackend {
    inner: MockBackend,
    failures: Failures,
}

impl FailingBackend {
    #[must_use]
    pub fn new(failures: Failures) -> Self {
        Self {
            inner: MockBackend::new(),
            failures,
        }
    }

    /// The healthy backend underneath, for inspecting state.
    #[must_use]
    pub const fn inner(&self) -> &MockBackend {
        &self.inner
    }
}

fn injected(operation: &str) -> Error {
    Error::Backend {
        status: 500,
        message: format!("injected {operation} failure"),
    }
}

#[async_trait]
impl AuthApi for FailingBackend {
    async fn get_session(&self) -> Result<Option<Session>> {
        self.inner.get_session().await
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        self.inner.sign_in_with_password(email, password).await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        options: SignUpOptions,
    ) -> Result<Option<Session>> {
        self.inner.sign_up(email, password, options).await
    }

    async fn sign_out(&self) -> Result<()> {
        self.inner.sign_out().await
    }

    fn on_auth_state_change(
        &self,
        listener: Box<dyn Fn(AuthEvent, Option<&Session>) + Send + Sync>,
    ) -> Subscription {
        self.inner.on_auth_state_change(listener)
    }
}

#[async_trait]
impl DataApi for FailingBackend {
    fn from(&self, table: &str) -> QueryBuilder<'_> {
        QueryBuilder::with_snapshot(self, table, self.inner.database().snapshot(table))
    }

    fn insert(&self, table: &str, row: Row) -> InsertBuilder {
        self.inner.insert(table, row)
    }

    async fn execute(&self, query: Query) -> Result<QueryResponse> {
        if self.failures.row_delete && query.kind == QueryKind::Delete {
            return Err(injected("row delete"));
        }
        self.inner.execute(query).await
    }
}

#[async_trait]
impl StorageApi for FailingBackend {
    async fn upload(&self, bucket: &str, path: &str, blob: Blob) -> Result<UploadResponse> {
        if self.failures.upload {
            return Err(injected("upload"));
        }
        self.inner.upload(bucket, path, blob).await
    }

    fn get_public_url(&self, bucket: &str, path: &str) -> String {
        self.inner.get_public_url(bucket, path)
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<Vec<String>> {
        if self.failures.remove {
            return Err(injected("remove"));
        }
        self.inner.remove(bucket, paths).await
    }
}

impl BackendClient for FailingBackend {
    fn mode(&self) -> BackendMode {
        BackendMode::Demo
    }
}
