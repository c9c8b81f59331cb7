//! Core business logic - framework-agnostic account, gallery and history
//! operations. Everything here talks to the backend through the
//! [`crate::backend::BackendClient`] facade, so it runs unchanged against the
//! hosted service or the in-memory demo backend.

/// Login and registration
pub mod account;
/// Saving a generated pair
pub mod gallery;
/// Listing and deleting saved generations
pub mod history;
