//! Entity module - Data shapes shared by the backends and the application.
//! Rows are generic JSON maps at the backend seam; the `generations` table gets
//! a fixed schema on top of that.

pub mod blob;
pub mod generation;
pub mod style;
pub mod user;

pub use blob::Blob;
pub use generation::{GenerationRow, HistoryItem, NewGeneration};
pub use style::AgingStyle;
pub use user::{AuthUser, Session, SignUpOptions, User, UserMetadata};

/// One record of a table: column name to value.
pub type Row = serde_json::Map<String, serde_json::Value>;
