//! History business logic - listing and deleting saved generations.
//!
//! Deleting is a two-step, non-transactional operation: the row goes first,
//! then the two blobs it referenced. If the row delete fails nothing else is
//! touched. If blob cleanup fails the row stays deleted and the leftover
//! blobs are only logged.

use crate::backend::{BackendClient, Bucket, OrderOptions};
use crate::config::AppSettings;
use crate::entities::{GenerationRow, HistoryItem};
use crate::errors::Result;
use tracing::{debug, error, info, instrument, warn};

/// Every saved generation, newest first.
#[instrument(skip(backend, settings))]
pub async fn fetch_history(
    backend: &dyn BackendClient,
    settings: &AppSettings,
) -> Result<Vec<HistoryItem>> {
    let response = backend
        .from(&settings.generations_table)
        .select()
        .order("created_at", OrderOptions::descending())
        .await
        .inspect_err(|e| error!("Failed to fetch history: {}", e))?;

    let items = response
        .data
        .into_iter()
        .map(|row| GenerationRow::from_row(row).map(HistoryItem::from))
        .collect::<Result<Vec<_>>>()?;
    debug!("Fetched {} history items", items.len());
    Ok(items)
}

/// Recovers the storage path from a public URL by locating the bucket
/// segment. Returns `None` for URLs that do not point into `bucket`.
#[must_use]
pub fn path_from_url(url: &str, bucket: &str) -> Option<String> {
    let without_query = url.split(|c| c == '?' || c == '#').next()?;
    let segments: Vec<&str> = without_query.split('/').collect();
    let bucket_index = segments.iter().position(|segment| *segment == bucket)?;
    let rest = &segments[bucket_index + 1..];
    if rest.is_empty() || rest.iter().all(|segment| segment.is_empty()) {
        return None;
    }
    urlencoding::decode(&rest.join("/"))
        .ok()
        .map(std::borrow::Cow::into_owned)
}

/// Deletes the row for `item`, then its blobs.
///
/// # Errors
/// Fails only when the row delete fails; storage failures are logged and
/// swallowed.
#[instrument(skip(backend, settings, item), fields(id = %item.id))]
pub async fn delete_history_item(
    backend: &dyn BackendClient,
    settings: &AppSettings,
    item: &HistoryItem,
) -> Result<()> {
    let response = backend
        .from(&settings.generations_table)
        .delete()
        .eq("id", item.id.as_str())
        .await
        .inspect_err(|e| error!("Fatal error deleting history row: {}", e))?;
    if response.count == Some(0) {
        warn!("No row matched id {}; cleaning up storage anyway", item.id);
    }

    let paths: Vec<String> = [&item.original_url, &item.generated_url]
        .into_iter()
        .filter_map(|url| path_from_url(url, &settings.bucket))
        .collect();
    if paths.is_empty() {
        warn!("Could not derive storage paths for {}", item.id);
        return Ok(());
    }

    match Bucket::new(backend, &settings.bucket).remove(&paths).await {
        Ok(removed) => info!(
            "Deleted history item {} and {} of {} blobs",
            item.id,
            removed.len(),
            paths.len()
        ),
        Err(e) => warn!(
            "Row deleted, but failed to clean up storage for {}: {}",
            item.id, e
        ),
    }
    Ok(())
}

/// File name offered when downloading a generated image.
#[must_use]
pub fn download_name(id: &str) -> String {
    format!("agelens-result-{id}.png")
}

/// Date as shown on the dashboard (`dd/mm/yyyy`).
#[must_use]
pub fn format_date(item: &HistoryItem) -> String {
    item.date.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::backend::DataApi;
    use crate::backend::mock::MockBackend;
    use crate::entities::{AgingStyle, Blob, NewGeneration};
    use crate::test_utils::{FailingBackend, Failures, init_test_tracing, insert_generation};
    use std::time::Duration;

    /// Uploads a pair, records it and returns the fetched history item.
    async fn seed_pair(backend: &dyn BackendClient, settings: &AppSettings) -> Result<HistoryItem> {
        let bucket = Bucket::new(backend, &settings.bucket);
        bucket
            .upload("u1/1_original.jpg", Blob::new(b"o".to_vec(), "image/jpeg"))
            .await?;
        bucket
            .upload("u1/1_natural.png", Blob::new(b"g".to_vec(), "image/png"))
            .await?;
        let row = NewGeneration {
            user_id: "u1".to_string(),
            original_path: bucket.get_public_url("u1/1_original.jpg"),
            generated_path: bucket.get_public_url("u1/1_natural.png"),
            style: AgingStyle::Natural,
        };
        let stored = backend
            .from(&settings.generations_table)
            .insert(row.into_row()?)
            .select()
            .single()
            .await?;
        Ok(HistoryItem::from(GenerationRow::from_row(stored)?))
    }

    #[test]
    fn test_path_from_supabase_url() {
        let url = "https://x.supabase.co/storage/v1/object/public/agelens-images/u1/17_original.jpg";
        assert_eq!(
            path_from_url(url, "agelens-images").as_deref(),
            Some("u1/17_original.jpg")
        );
    }

    #[test]
    fn test_path_from_mock_url_decodes_and_drops_token() {
        let url = "mock://storage/agelens-images/u1/my%20photo.jpg?token=abc";
        assert_eq!(
            path_from_url(url, "agelens-images").as_deref(),
            Some("u1/my photo.jpg")
        );
    }

    #[test]
    fn test_path_from_foreign_url_is_none() {
        assert_eq!(path_from_url("https://cdn.example/a.png", "agelens-images"), None);
        assert_eq!(path_from_url("https://x/agelens-images/", "agelens-images"), None);
    }

    #[tokio::test]
    async fn test_fetch_history_newest_first() -> Result<()> {
        init_test_tracing();
        let backend = MockBackend::new();
        let settings = AppSettings::default();
        let first = insert_generation(&backend, &settings, "u1", AgingStyle::Natural).await?;
        std::thread::sleep(Duration::from_millis(5));
        let second = insert_generation(&backend, &settings, "u1", AgingStyle::Rustico).await?;
        assert!(second.created_at > first.created_at);

        let items = fetch_history(&backend, &settings).await?;
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_removes_row_and_blobs() -> Result<()> {
        init_test_tracing();
        let backend = MockBackend::new();
        let settings = AppSettings::default();
        let item = seed_pair(&backend, &settings).await?;

        assert_eq!(fetch_history(&backend, &settings).await?.len(), 1);
        delete_history_item(&backend, &settings, &item).await?;

        assert!(fetch_history(&backend, &settings).await?.is_empty());
        assert!(!backend.storage().contains(&settings.bucket, "u1/1_original.jpg"));
        assert!(!backend.storage().contains(&settings.bucket, "u1/1_natural.png"));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_row_delete_leaves_row_and_blobs() -> Result<()> {
        init_test_tracing();
        let backend = FailingBackend::new(Failures {
            row_delete: true,
            ..Failures::default()
        });
        let settings = AppSettings::default();
        let item = seed_pair(&backend, &settings).await?;

        let result = delete_history_item(&backend, &settings, &item).await;
        assert!(matches!(result, Err(crate::errors::Error::Backend { status: 500, .. })));

        assert_eq!(fetch_history(&backend, &settings).await?, vec![item]);
        let storage = backend.inner().storage();
        assert!(storage.contains(&settings.bucket, "u1/1_original.jpg"));
        assert!(storage.contains(&settings.bucket, "u1/1_natural.png"));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_blob_cleanup_still_deletes_row() -> Result<()> {
        init_test_tracing();
        let backend = FailingBackend::new(Failures {
            remove: true,
            ..Failures::default()
        });
        let settings = AppSettings::default();
        let item = seed_pair(&backend, &settings).await?;

        delete_history_item(&backend, &settings, &item).await?;

        assert!(fetch_history(&backend, &settings).await?.is_empty());
        let storage = backend.inner().storage();
        assert!(storage.contains(&settings.bucket, "u1/1_original.jpg"));
        assert!(storage.contains(&settings.bucket, "u1/1_natural.png"));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_missing_item_is_not_an_error() -> Result<()> {
        let backend = MockBackend::new();
        let settings = AppSettings::default();
        let item = HistoryItem {
            id: "ghost".to_string(),
            date: chrono::Utc::now(),
            original_url: "https://cdn.example/o.jpg".to_string(),
            generated_url: "https://cdn.example/g.png".to_string(),
            description: "Transformação".to_string(),
            style: None,
        };
        delete_history_item(&backend, &settings, &item).await
    }

    #[test]
    fn test_download_name_and_date() {
        let item = HistoryItem {
            id: "abc".to_string(),
            date: "2025-03-07T10:00:00Z".parse().unwrap(),
            original_url: String::new(),
            generated_url: String::new(),
            description: String::new(),
            style: None,
        };
        assert_eq!(download_name(&item.id), "agelens-result-abc.png");
        assert_eq!(format_date(&item), "07/03/2025");
    }
}
