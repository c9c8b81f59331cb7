//! Image transform layer - turns a photo into its aged variant.
//!
//! The remote model is treated as one opaque, slow, fallible call: no partial
//! results, no retry, no cancellation.

/// Gemini-compatible HTTP implementation
pub mod gemini;

pub use gemini::GeminiTransformer;

use crate::entities::AgingStyle;
use crate::errors::Result;
use async_trait::async_trait;

/// Applies an aging style to an image.
#[async_trait]
pub trait ImageTransformer: Send + Sync {
    /// `image` is raw base64 or a `data:` URL. Returns a
    /// `data:image/png;base64,...` URL.
    async fn transform(&self, image: &str, style: AgingStyle) -> Result<String>;
}
