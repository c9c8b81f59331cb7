//! User and session entities - Identity as reported by the auth backend.
//!
//! `AuthUser` mirrors the backend's user object; `User` is the flattened view
//! the application works with.

use serde::{Deserialize, Serialize};

/// Profile metadata stored alongside the account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// User object returned by the auth API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// The single active authenticated identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque bearer token
    pub access_token: String,
    pub user: AuthUser,
}

/// Options accepted by sign-up; seeded into [`UserMetadata`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignUpOptions {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<SignUpOptions> for UserMetadata {
    fn from(options: SignUpOptions) -> Self {
        Self {
            full_name: options.full_name,
            avatar_url: options.avatar_url,
        }
    }
}

/// Application-level user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub avatar: Option<String>,
}

impl From<&AuthUser> for User {
    fn from(auth_user: &AuthUser) -> Self {
        let email = auth_user.email.clone().unwrap_or_default();
        let name = auth_user
            .user_metadata
            .full_name
            .clone()
            .filter(|name| !name.is_empty())
            .or_else(|| {
                email
                    .split('@')
                    .next()
                    .filter(|local| !local.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "Usuário".to_string());
        Self {
            id: auth_user.id.clone(),
            email,
            name,
            avatar: auth_user.user_metadata.avatar_url.clone(),
        }
    }
}
