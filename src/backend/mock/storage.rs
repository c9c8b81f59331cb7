//! Object storage emulation keyed by bucket and path.
//!
//! Each upload gets a process-local reference URL carrying a random token.
//! Overwriting or removing the object revokes that token, so stale references
//! stop resolving just like revoked browser object URLs.

use crate::entities::Blob;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::debug;
use uuid::Uuid;

/// Scheme and host of every mock storage reference.
pub const MOCK_STORAGE_ORIGIN: &str = "mock://storage";

#[derive(Clone, Debug)]
struct StoredBlob {
    blob: Blob,
    token: Uuid,
}

#[derive(Default)]
pub struct MockStorage {
    buckets: Mutex<HashMap<String, HashMap<String, StoredBlob>>>,
}

impl MockStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upload(&self, bucket: &str, path: &str, blob: Blob) {
        let stored = StoredBlob {
            blob,
            token: Uuid::new_v4(),
        };
        let replaced = self
            .buckets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(bucket.to_string())
            .or_default()
            .insert(path.to_string(), stored)
            .is_some();
        debug!(
            "Mock upload to {}/{} ({})",
            bucket,
            path,
            if replaced { "replaced" } else { "new" }
        );
    }

    /// Live reference for `path`, or the token-less placeholder when nothing
    /// is stored there. The placeholder never resolves.
    #[must_use]
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        let base = object_url(bucket, path);
        let buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        match buckets.get(bucket).and_then(|objects| objects.get(path)) {
            Some(stored) => format!("{base}?token={}", stored.token),
            None => base,
        }
    }

    pub fn remove(&self, bucket: &str, paths: &[String]) -> Vec<String> {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(objects) = buckets.get_mut(bucket) else {
            return Vec::new();
        };
        let removed: Vec<String> = paths
            .iter()
            .filter(|path| objects.remove(path.as_str()).is_some())
            .cloned()
            .collect();
        debug!(
            "Mock remove in {}: {} of {} paths existed",
            bucket,
            removed.len(),
            paths.len()
        );
        removed
    }

    /// Fetches the blob behind a live reference returned by
    /// [`MockStorage::public_url`].
    #[must_use]
    pub fn resolve(&self, url: &str) -> Option<Blob> {
        let rest = url.strip_prefix(MOCK_STORAGE_ORIGIN)?.strip_prefix('/')?;
        let (location, token) = rest.split_once("?token=")?;
        let token = Uuid::parse_str(token).ok()?;
        let (bucket, encoded_path) = location.split_once('/')?;
        let path = urlencoding::decode(encoded_path).ok()?;

        let buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        buckets
            .get(bucket)?
            .get(path.as_ref())
            .filter(|stored| stored.token == token)
            .map(|stored| stored.blob.clone())
    }

    #[must_use]
    pub fn contains(&self, bucket: &str, path: &str) -> bool {
        self.buckets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(bucket)
            .is_some_and(|objects| objects.contains_key(path))
    }
}

fn object_url(bucket: &str, path: &str) -> String {
    let encoded: Vec<String> = path
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("{MOCK_STORAGE_ORIGIN}/{bucket}/{}", encoded.join("/"))
}
