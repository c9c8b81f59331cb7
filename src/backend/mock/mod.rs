//! In-memory backend for demo mode.
//!
//! Emulates the hosted service closely enough for the application to behave
//! the same without credentials: sign-in always succeeds, tables and blobs
//! live only as long as the process, and no operation ever reports an error.
//! Each `MockBackend` is an independent world, so tests can build a fresh one
//! per case.

pub mod auth;
pub mod data;
pub mod storage;

pub use auth::MockAuth;
pub use data::MockDatabase;
pub use storage::MockStorage;

use crate::backend::auth_events::{AuthEvent, Subscription};
use crate::backend::query::{DataApi, InsertBuilder, Query, QueryBuilder, QueryResponse};
use crate::backend::storage::{StorageApi, UploadResponse};
use crate::backend::{AuthApi, BackendClient, BackendMode};
use crate::entities::{Blob, Row, Session, SignUpOptions};
use crate::errors::Result;
use async_trait::async_trait;

#[derive(Default)]
pub struct MockBackend {
    auth: MockAuth,
    database: MockDatabase,
    storage: MockStorage,
}

impl MockBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn auth(&self) -> &MockAuth {
        &self.auth
    }

    #[must_use]
    pub const fn database(&self) -> &MockDatabase {
        &self.database
    }

    #[must_use]
    pub const fn storage(&self) -> &MockStorage {
        &self.storage
    }
}

#[async_trait]
impl AuthApi for MockBackend {
    async fn get_session(&self) -> Result<Option<Session>> {
        Ok(self.auth.session())
    }

    async fn sign_in_with_password(&self, email: &str, _password: &str) -> Result<Session> {
        Ok(self.auth.sign_in(email))
    }

    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        options: SignUpOptions,
    ) -> Result<Option<Session>> {
        Ok(Some(self.auth.sign_up(email, options)))
    }

    async fn sign_out(&self) -> Result<()> {
        self.auth.sign_out();
        Ok(())
    }

    fn on_auth_state_change(
        &self,
        listener: Box<dyn Fn(AuthEvent, Option<&Session>) + Send + Sync>,
    ) -> Subscription {
        self.auth.subscribe(listener)
    }
}

#[async_trait]
impl DataApi for MockBackend {
    fn from(&self, table: &str) -> QueryBuilder<'_> {
        QueryBuilder::with_snapshot(self, table, self.database.snapshot(table))
    }

    fn insert(&self, table: &str, row: Row) -> InsertBuilder {
        InsertBuilder::ready(Ok(vec![self.database.insert(table, row)]))
    }

    async fn execute(&self, query: Query) -> Result<QueryResponse> {
        Ok(self.database.execute(query))
    }
}

#[async_trait]
impl StorageApi for MockBackend {
    async fn upload(&self, bucket: &str, path: &str, blob: Blob) -> Result<UploadResponse> {
        self.storage.upload(bucket, path, blob);
        Ok(UploadResponse {
            path: path.to_string(),
        })
    }

    fn get_public_url(&self, bucket: &str, path: &str) -> String {
        self.storage.public_url(bucket, path)
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<Vec<String>> {
        Ok(self.storage.remove(bucket, paths))
    }
}

impl BackendClient for MockBackend {
    fn mode(&self) -> BackendMode {
        BackendMode::Demo
    }
}
