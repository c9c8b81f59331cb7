use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image transform failed: {message}")]
    Transform { message: String },

    #[error("Missing API key: {key} is not set")]
    MissingApiKey { key: String },

    #[error("Invalid image: {message}")]
    InvalidImage { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    /// Short localized message safe to show to the user.
    ///
    /// The original error is expected to be logged by the caller; nothing
    /// structured crosses the view boundary.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message } | Self::InvalidImage { message } => message.clone(),
            Self::Transform { .. } => "Falha ao processar a imagem. Tente novamente.".to_string(),
            Self::MissingApiKey { .. } => {
                "Chave da API de imagens não configurada. Defina API_KEY nas variáveis de ambiente."
                    .to_string()
            }
            Self::Config { .. } => "Sistema não configurado corretamente.".to_string(),
            Self::NotFound { .. } => "Registro não encontrado.".to_string(),
            Self::Backend { .. }
            | Self::Http(_)
            | Self::Serialization(_)
            | Self::Io(_)
            | Self::Task(_) => {
                "Ocorreu um erro ao comunicar com o servidor.".to_string()
            }
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_backend_details() {
        let err = Error::Backend {
            status: 403,
            message: "new row violates row-level security policy".to_string(),
        };
        let message = err.user_message();
        assert!(!message.contains("row-level"));
        assert_eq!(message, "Ocorreu um erro ao comunicar com o servidor.");
    }

    #[test]
    fn test_user_message_passes_validation_text_through() {
        let err = Error::Validation {
            message: "A senha deve ter pelo menos 6 caracteres.".to_string(),
        };
        assert_eq!(err.user_message(), "A senha deve ter pelo menos 6 caracteres.");
    }

    #[test]
    fn test_transform_error_has_dedicated_message() {
        let err = Error::Transform {
            message: "no image part".to_string(),
        };
        assert_eq!(
            err.user_message(),
            "Falha ao processar a imagem. Tente novamente."
        );
    }
}
