//! Generator workflow - pick a photo, pick a style, transform, save.
//!
//! The generator keeps the same state a front end renders: the two images as
//! `data:` URLs, the selected style, a status and the last user-facing error.
//! Every failure is both stored as a Portuguese message and returned.

use crate::app::AppContext;
use crate::core::gallery::{self, SaveRequest};
use crate::entities::{AgingStyle, Blob, HistoryItem};
use crate::errors::{Error, Result};
use chrono::Utc;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};

/// Name offered when downloading the result.
pub const DOWNLOAD_NAME: &str = "agelens-resultado.png";

/// Shown one after another while the transform runs.
pub const PROCESSING_MESSAGES: [&str; 7] = [
    "Analisando traços faciais...",
    "Mapeando estrutura óssea...",
    "Simulando perda de colágeno...",
    "Aplicando linhas de expressão...",
    "Ajustando pigmentação da pele...",
    "Refinando detalhes capilares...",
    "Finalizando renderização...",
];

const SAVE_FAILED: &str = "Erro ao salvar imagem no servidor.";
const TOO_LARGE: &str = "A imagem é muito grande. O tamanho máximo é 5MB.";

/// Where the generator is in its workflow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProcessingStatus {
    #[default]
    Idle,
    /// Reading the selected file
    Uploading,
    /// Waiting on the transform
    Processing,
    Success,
    Error,
}

pub struct Generator {
    context: AppContext,
    status: ProcessingStatus,
    style: AgingStyle,
    original: Option<String>,
    generated: Option<String>,
    error: Option<String>,
    is_saved: bool,
    is_saving: bool,
    message_index: usize,
}

impl Generator {
    #[must_use]
    pub fn new(context: AppContext) -> Self {
        Self {
            context,
            status: ProcessingStatus::Idle,
            style: AgingStyle::default(),
            original: None,
            generated: None,
            error: None,
            is_saved: false,
            is_saving: false,
            message_index: 0,
        }
    }

    #[must_use]
    pub const fn status(&self) -> ProcessingStatus {
        self.status
    }

    #[must_use]
    pub const fn style(&self) -> AgingStyle {
        self.style
    }

    #[must_use]
    pub fn original(&self) -> Option<&str> {
        self.original.as_deref()
    }

    #[must_use]
    pub fn generated(&self) -> Option<&str> {
        self.generated.as_deref()
    }

    /// Last message meant for the user.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub const fn is_saved(&self) -> bool {
        self.is_saved
    }

    #[must_use]
    pub const fn is_saving(&self) -> bool {
        self.is_saving
    }

    fn unreadable(&mut self, e: std::io::Error) -> Error {
        self.status = ProcessingStatus::Error;
        self.error = Some("Não foi possível ler o arquivo selecionado.".to_string());
        e.into()
    }

    fn reject(&mut self, message: &str) -> Error {
        self.error = Some(message.to_string());
        Error::Validation {
            message: message.to_string(),
        }
    }

    /// Accepts an image file as the new original, discarding any previous
    /// result.
    ///
    /// # Errors
    /// Rejects non-image content types and files above the upload limit;
    /// the current images are kept in that case.
    pub fn select_file(&mut self, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let blob = Blob::new(bytes, content_type);
        if !blob.is_image() {
            return Err(self.reject("Por favor, selecione um arquivo de imagem válido (JPEG ou PNG)."));
        }
        if blob.len() > self.context.settings.max_upload_bytes {
            return Err(self.reject(TOO_LARGE));
        }

        self.error = None;
        self.is_saved = false;
        self.original = Some(blob.to_data_url());
        self.generated = None;
        self.status = ProcessingStatus::Idle;
        debug!("Selected {} byte {} image", blob.len(), blob.content_type);
        Ok(())
    }

    /// Reads an image from disk and selects it. The content type comes from
    /// the file extension. Oversized files are rejected before being read.
    pub async fn load_file(&mut self, path: &Path) -> Result<()> {
        self.status = ProcessingStatus::Uploading;
        let size = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata.len(),
            Err(e) => return Err(self.unreadable(e)),
        };
        if usize::try_from(size).map_or(true, |size| size > self.context.settings.max_upload_bytes) {
            self.status = ProcessingStatus::Idle;
            return Err(self.reject(TOO_LARGE));
        }

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => return Err(self.unreadable(e)),
        };
        let result = self.select_file(bytes, content_type_for(path));
        if result.is_err() {
            self.status = ProcessingStatus::Idle;
        }
        result
    }

    pub fn select_style(&mut self, style: AgingStyle) {
        self.style = style;
    }

    /// Runs the transform on the selected original with the selected style.
    #[instrument(skip(self), fields(style = %self.style))]
    pub async fn process(&mut self) -> Result<()> {
        let Some(original) = self.original.clone() else {
            return Err(self.reject("Selecione uma imagem antes de transformar."));
        };

        self.status = ProcessingStatus::Processing;
        self.error = None;
        self.is_saved = false;
        self.message_index = 0;

        match self.context.transformer.transform(&original, self.style).await {
            Ok(generated) => {
                self.generated = Some(generated);
                self.status = ProcessingStatus::Success;
                info!("Transform finished");
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.user_message());
                self.status = ProcessingStatus::Error;
                Err(e)
            }
        }
    }

    /// Message for the current processing tick.
    #[must_use]
    pub const fn processing_message(&self) -> &'static str {
        PROCESSING_MESSAGES[self.message_index]
    }

    /// Advances the processing message while processing, rewinds it otherwise.
    pub fn tick(&mut self) {
        if matches!(self.status, ProcessingStatus::Processing) {
            self.message_index = (self.message_index + 1) % PROCESSING_MESSAGES.len();
        } else {
            self.message_index = 0;
        }
    }

    /// Clears both images and any error.
    pub fn reset(&mut self) {
        self.original = None;
        self.generated = None;
        self.status = ProcessingStatus::Idle;
        self.error = None;
        self.is_saved = false;
        self.message_index = 0;
    }

    /// The generated image, ready to write to [`DOWNLOAD_NAME`].
    pub fn download(&self) -> Result<Blob> {
        self.generated
            .as_deref()
            .ok_or_else(|| Error::NotFound {
                what: "generated image".to_string(),
            })
            .and_then(Blob::from_data_url)
    }

    /// Uploads the pair for `user_id` and records it in the history.
    #[instrument(skip(self))]
    pub async fn save_to_gallery(&mut self, user_id: &str) -> Result<HistoryItem> {
        let (Some(original), Some(generated)) = (self.original.clone(), self.generated.clone())
        else {
            return Err(self.reject("Nenhuma imagem gerada para salvar."));
        };
        if self.is_saved {
            warn!("Generation already saved; saving another copy");
        }

        self.is_saving = true;
        let result = gallery::save_generation(
            self.context.backend.as_ref(),
            &self.context.settings,
            SaveRequest {
                user_id,
                original: &original,
                generated: &generated,
                style: self.style,
                timestamp_millis: Utc::now().timestamp_millis(),
            },
        )
        .await;
        self.is_saving = false;

        match result {
            Ok(item) => {
                self.is_saved = true;
                Ok(item)
            }
            Err(e) => {
                error!("Error saving to gallery: {}", e);
                self.error = Some(SAVE_FAILED.to_string());
                Err(e)
            }
        }
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}
