/// Environment variable lookup with bundler prefixes
pub mod env;

/// Backend and image API credentials
pub mod credentials;

/// Non-secret settings from agelens.toml
pub mod settings;

pub use credentials::{BackendConfig, TransformConfig};
pub use settings::AppSettings;
