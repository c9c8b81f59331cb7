//! Gallery business logic - persisting a before/after pair.
//!
//! Saving uploads both images, resolves their public URLs and records them in
//! the generations table. Any failing step aborts the save; blobs uploaded
//! before the failure are left behind.

use crate::backend::{BackendClient, Bucket};
use crate::config::AppSettings;
use crate::entities::{AgingStyle, Blob, GenerationRow, HistoryItem, NewGeneration};
use crate::errors::Result;
use tracing::{debug, error, info, instrument};

/// Storage paths for one saved pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairPaths {
    pub original: String,
    pub generated: String,
}

/// `{user}/{timestamp}_original.jpg` and `{user}/{timestamp}_{style}.png`.
#[must_use]
pub fn pair_paths(user_id: &str, timestamp_millis: i64, style: AgingStyle) -> PairPaths {
    PairPaths {
        original: format!("{user_id}/{timestamp_millis}_original.jpg"),
        generated: format!("{user_id}/{timestamp_millis}_{}.png", style.id()),
    }
}

/// Images to persist, as `data:` URLs.
#[derive(Debug, Clone, Copy)]
pub struct SaveRequest<'a> {
    pub user_id: &'a str,
    pub original: &'a str,
    pub generated: &'a str,
    pub style: AgingStyle,
    pub timestamp_millis: i64,
}

/// Uploads both images, inserts the generation row and returns the new
/// history entry.
#[instrument(skip(backend, settings, request), fields(user = request.user_id, style = %request.style))]
pub async fn save_generation(
    backend: &dyn BackendClient,
    settings: &AppSettings,
    request: SaveRequest<'_>,
) -> Result<HistoryItem> {
    let original_blob = Blob::from_data_url(request.original)?;
    let generated_blob = Blob::from_data_url(request.generated)?;

    let paths = pair_paths(request.user_id, request.timestamp_millis, request.style);
    let bucket = Bucket::new(backend, &settings.bucket);

    bucket
        .upload(&paths.original, original_blob)
        .await
        .inspect_err(|e| error!("Failed to upload original image: {}", e))?;
    bucket
        .upload(&paths.generated, generated_blob)
        .await
        .inspect_err(|e| error!("Failed to upload generated image: {}", e))?;
    debug!("Uploaded {} and {}", paths.original, paths.generated);

    let original_url = bucket.get_public_url(&paths.original);
    let generated_url = bucket.get_public_url(&paths.generated);

    let row = NewGeneration {
        user_id: request.user_id.to_string(),
        original_path: original_url,
        generated_path: generated_url,
        style: request.style,
    }
    .into_row()?;

    let stored = backend
        .from(&settings.generations_table)
        .insert(row)
        .select()
        .single()
        .await
        .inspect_err(|e| error!("Failed to record generation: {}", e))?;

    let item = HistoryItem::from(GenerationRow::from_row(stored)?);
    info!("Saved generation {}", item.id);
    Ok(item)
}
