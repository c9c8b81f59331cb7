//! Account business logic - login and registration with form validation.

use crate::backend::BackendClient;
use crate::entities::{Session, SignUpOptions};
use crate::errors::{Error, Result};
use tracing::{error, info};

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 6;

fn validate_credentials(email: &str, password: &str) -> Result<()> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(Error::Validation {
            message: "Informe um email válido.".to_string(),
        });
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::Validation {
            message: format!("A senha deve ter pelo menos {MIN_PASSWORD_LEN} caracteres."),
        });
    }
    Ok(())
}

/// Avatar generated for new accounts.
#[must_use]
pub fn default_avatar_url(email: &str) -> String {
    format!(
        "https://api.dicebear.com/7.x/avataaars/svg?seed={}",
        urlencoding::encode(email)
    )
}

/// Signs an existing user in.
///
/// The resulting view change is driven by the auth listener, not by the
/// caller.
pub async fn login(backend: &dyn BackendClient, email: &str, password: &str) -> Result<Session> {
    validate_credentials(email, password)?;
    backend
        .sign_in_with_password(email.trim(), password)
        .await
        .inspect(|session| info!("User {} signed in", session.user.id))
        .inspect_err(|e| error!("Sign-in failed: {}", e))
}

/// Creates an account seeded with the display name and a generated avatar.
///
/// Returns `None` when the backend wants the address confirmed first.
pub async fn register(
    backend: &dyn BackendClient,
    full_name: &str,
    email: &str,
    password: &str,
) -> Result<Option<Session>> {
    if full_name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Informe seu nome completo.".to_string(),
        });
    }
    validate_credentials(email, password)?;

    let email = email.trim();
    let options = SignUpOptions {
        full_name: Some(full_name.trim().to_string()),
        avatar_url: Some(default_avatar_url(email)),
    };
    backend
        .sign_up(email, password, options)
        .await
        .inspect(|session| {
            if session.is_none() {
                info!("Account for {} created; confirmation pending", email);
            }
        })
        .inspect_err(|e| error!("Sign-up failed: {}", e))
}
