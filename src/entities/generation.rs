//! Generation entity - One saved before/after pair in the `generations` table.
//!
//! Rows travel through the backend as generic JSON maps; this module gives the
//! one table the application uses a fixed schema and maps it to the history
//! items shown on the dashboard.

use crate::entities::{AgingStyle, Row};
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stored generation record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRow {
    /// Generated by the backend on insert
    pub id: String,
    /// Owner of the images
    pub user_id: String,
    /// Public URL of the uploaded original
    pub original_path: String,
    /// Public URL of the generated image
    pub generated_path: String,
    #[serde(default)]
    pub style: Option<AgingStyle>,
    /// Set by the backend on insert
    pub created_at: DateTime<Utc>,
}

impl GenerationRow {
    /// Decodes a generic row.
    ///
    /// # Errors
    /// Fails when a required column is missing or has the wrong type.
    pub fn from_row(row: Row) -> Result<Self> {
        serde_json::from_value(Value::Object(row)).map_err(Error::from)
    }
}

/// Columns supplied by the caller on insert; `id` and `created_at` come from
/// the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewGeneration {
    pub user_id: String,
    pub original_path: String,
    pub generated_path: String,
    pub style: AgingStyle,
}

impl NewGeneration {
    pub fn into_row(self) -> Result<Row> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::Validation {
                message: format!("generation did not serialize to an object: {other}"),
            }),
        }
    }
}

/// Dashboard entry derived from a [`GenerationRow`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistoryItem {
    pub id: String,
    pub date: DateTime<Utc>,
    pub original_url: String,
    pub generated_url: String,
    pub description: String,
    pub style: Option<AgingStyle>,
}

/// Human-readable caption for a generation.
#[must_use]
pub fn describe(style: Option<AgingStyle>) -> String {
    style.map_or_else(
        || "Transformação".to_string(),
        |style| format!("Transformação {}", style.label()),
    )
}

impl From<GenerationRow> for HistoryItem {
    fn from(row: GenerationRow) -> Self {
        Self {
            description: describe(row.style),
            id: row.id,
            date: row.created_at,
            original_url: row.original_path,
            generated_url: row.generated_path,
            style: row.style,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_maps_to_history_item() {
        let row = json!({
            "id": "abc",
            "user_id": "u1",
            "original_path": "https://x/original.jpg",
            "generated_path": "https://x/natural.png",
            "style": "natural",
            "created_at": "2025-03-01T12:00:00+00:00"
        });
        let Value::Object(row) = row else { unreachable!() };

        let item = HistoryItem::from(GenerationRow::from_row(row).unwrap());
        assert_eq!(item.id, "abc");
        assert_eq!(item.description, "Transformação Natural");
        assert_eq!(item.style, Some(AgingStyle::Natural));
        assert_eq!(item.generated_url, "https://x/natural.png");
    }

    #[test]
    fn test_row_without_style_still_maps() {
        let row = json!({
            "id": "abc",
            "user_id": "u1",
            "original_path": "o",
            "generated_path": "g",
            "created_at": "2025-03-01T12:00:00Z"
        });
        let Value::Object(row) = row else { unreachable!() };

        let item = HistoryItem::from(GenerationRow::from_row(row).unwrap());
        assert_eq!(item.style, None);
        assert_eq!(item.description, "Transformação");
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let Value::Object(row) = json!({ "id": "abc" }) else { unreachable!() };
        assert!(GenerationRow::from_row(row).is_err());
    }

    #[test]
    fn test_new_generation_row_has_no_generated_columns() {
        let row = NewGeneration {
            user_id: "u1".to_string(),
            original_path: "o".to_string(),
            generated_path: "g".to_string(),
            style: AgingStyle::Elegante,
        }
        .into_row()
        .unwrap();
        assert_eq!(row.get("style"), Some(&json!("elegante")));
        assert!(!row.contains_key("id"));
        assert!(!row.contains_key("created_at"));
    }
}
