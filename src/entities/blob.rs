//! Binary payloads moved between the generator, the image API and storage.

use crate::errors::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;

/// Bytes plus their MIME type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl Blob {
    pub fn new(bytes: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }

    /// Decodes a `data:` URL (`data:image/png;base64,....`).
    ///
    /// # Errors
    /// Returns [`Error::InvalidImage`] when the input is not a data URL or the
    /// payload is not valid base64.
    pub fn from_data_url(data_url: &str) -> Result<Self> {
        let invalid = |message: String| Error::InvalidImage { message };

        let rest = data_url
            .strip_prefix("data:")
            .ok_or_else(|| invalid("Formato de imagem inválido.".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| invalid("Formato de imagem inválido.".to_string()))?;

        let (mime, is_base64) = match header.strip_suffix(";base64") {
            Some(mime) => (mime, true),
            None => (header, false),
        };
        let content_type = if mime.is_empty() {
            "text/plain".to_string()
        } else {
            mime.to_string()
        };

        let bytes = if is_base64 {
            BASE64_STANDARD
                .decode(payload.trim())
                .map_err(|e| invalid(format!("Imagem corrompida: {e}")))?
        } else {
            urlencoding::decode_binary(payload.as_bytes()).into_owned()
        };

        Ok(Self {
            bytes,
            content_type,
        })
    }

    /// Encodes the blob back into a base64 `data:` URL.
    #[must_use]
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            BASE64_STANDARD.encode(&self.bytes)
        )
    }

    #[must_use]
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Strips a `data:...,` prefix, leaving the raw base64 payload.
#[must_use]
pub fn strip_data_url_prefix(image: &str) -> &str {
    if image.starts_with("data:") {
        image.split_once(',').map_or(image, |(_, payload)| payload)
    } else {
        image
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_decode_base64_data_url() {
        let blob = Blob::from_data_url("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(blob.content_type, "image/png");
        assert_eq!(blob.bytes, vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
        assert!(blob.is_image());
    }

    #[test]
    fn test_decode_percent_encoded_data_url() {
        let blob = Blob::from_data_url("data:,hello%20world").unwrap();
        assert_eq!(blob.content_type, "text/plain");
        assert_eq!(blob.bytes, b"hello world");
    }

    #[test]
    fn test_rejects_plain_strings_and_bad_base64() {
        assert!(matches!(
            Blob::from_data_url("https://example.com/a.png"),
            Err(Error::InvalidImage { .. })
        ));
        assert!(matches!(
            Blob::from_data_url("data:image/png;base64,@@@"),
            Err(Error::InvalidImage { .. })
        ));
    }

    #[test]
    fn test_data_url_survives_reencoding() {
        let blob = Blob::new(vec![1, 2, 3, 250], "image/jpeg");
        let decoded = Blob::from_data_url(&blob.to_data_url()).unwrap();
        assert_eq!(decoded, blob);
    }

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_data_url_prefix("data:image/jpeg;base64,QUJD"), "QUJD");
        assert_eq!(strip_data_url_prefix("QUJD"), "QUJD");
    }
}
