//! `GeminiTransformer` - calls the Gemini `generateContent` REST endpoint with
//! the photo inline and the style prompt as text, and returns the first image
//! part of the answer.

use crate::config::{AppSettings, TransformConfig};
use crate::entities::AgingStyle;
use crate::entities::blob::strip_data_url_prefix;
use crate::errors::{Error, Result};
use crate::transform::ImageTransformer;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, instrument};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Transformer backed by the Gemini image model.
#[derive(Clone)]
pub struct GeminiTransformer {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiTransformer {
    /// # Errors
    /// Fails if the HTTP client cannot be built. A missing API key is only
    /// reported when [`ImageTransformer::transform`] is called.
    pub fn new(config: &TransformConfig, settings: &AppSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: BASE_URL.to_string(),
        })
    }

    /// Points the client at another endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    async fn request_image(&self, api_key: &str, image: &str, style: AgingStyle) -> Result<String> {
        let body = build_request(image, style);
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(Error::Transform {
                message: format!("Gemini API returned {status}: {text}"),
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        extract_image(parsed).ok_or_else(|| Error::Transform {
            message: "A resposta da IA não continha dados de imagem.".to_string(),
        })
    }
}

#[async_trait]
impl ImageTransformer for GeminiTransformer {
    #[instrument(skip(self, image), fields(model = %self.model))]
    async fn transform(&self, image: &str, style: AgingStyle) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| Error::MissingApiKey {
            key: "API_KEY".to_string(),
        })?;

        info!("Requesting '{}' aging effect", style);
        self.request_image(api_key, image, style)
            .await
            .map_err(|e| {
                error!("Error generating aging effect: {}", e);
                match e {
                    Error::Transform { .. } => e,
                    other => Error::Transform {
                        message: other.to_string(),
                    },
                }
            })
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Content,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

fn build_request(image: &str, style: AgingStyle) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: Content {
            parts: vec![
                Part {
                    text: None,
                    inline_data: Some(InlineData {
                        mime_type: "image/jpeg".to_string(),
                        data: strip_data_url_prefix(image).to_string(),
                    }),
                },
                Part {
                    text: Some(style.prompt().to_string()),
                    inline_data: None,
                },
            ],
        },
    }
}

/// First inline image of the first candidate, as a PNG data URL.
fn extract_image(response: GenerateContentResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .filter_map(|part| part.inline_data)
        .find(|inline| !inline.data.is_empty())
        .map(|inline| format!("data:image/png;base64,{}", inline.data))
}
