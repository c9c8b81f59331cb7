//! Blob storage seam and a bucket-scoped convenience wrapper.

use crate::entities::Blob;
use crate::errors::Result;
use async_trait::async_trait;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadResponse {
    /// Path the blob was stored under, relative to the bucket
    pub path: String,
}

/// Path-addressed blob storage.
#[async_trait]
pub trait StorageApi: Send + Sync {
    /// Stores `blob` at `path`, replacing any existing object.
    async fn upload(&self, bucket: &str, path: &str, blob: Blob) -> Result<UploadResponse>;

    /// URL under which `path` can be fetched. Never fails; see each backend for
    /// what is returned when nothing is stored there.
    fn get_public_url(&self, bucket: &str, path: &str) -> String;

    /// Deletes every listed path that exists and returns the ones removed.
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<Vec<String>>;
}

/// A [`StorageApi`] bound to one bucket.
pub struct Bucket<'a, S: StorageApi + ?Sized> {
    api: &'a S,
    name: String,
}

impl<'a, S: StorageApi + ?Sized> Bucket<'a, S> {
    pub fn new(api: &'a S, name: &str) -> Self {
        Self {
            api,
            name: name.to_string(),
        }
    }

    pub async fn upload(&self, path: &str, blob: Blob) -> Result<UploadResponse> {
        self.api.upload(&self.name, path, blob).await
    }

    #[must_use]
    pub fn get_public_url(&self, path: &str) -> String {
        self.api.get_public_url(&self.name, path)
    }

    pub async fn remove(&self, paths: &[String]) -> Result<Vec<String>> {
        self.api.remove(&self.name, paths).await
    }
}
