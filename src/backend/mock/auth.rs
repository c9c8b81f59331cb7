//! In-memory session emulation.
//!
//! Every sign-in succeeds and no password is checked. The session is derived
//! from the email alone, so signing in twice with one address yields the same
//! user id.

use crate::backend::auth_events::{AuthEvent, AuthEvents, Subscription};
use crate::entities::{AuthUser, Session, SignUpOptions, UserMetadata};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

#[derive(Default)]
pub struct MockAuth {
    session: Mutex<Option<Session>>,
    events: AuthEvents,
}

impl MockAuth {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn sign_in(&self, email: &str) -> Session {
        info!("Mock sign-in for {}", email);
        self.start_session(email, UserMetadata::default())
    }

    pub fn sign_up(&self, email: &str, options: SignUpOptions) -> Session {
        info!("Mock sign-up for {}", email);
        self.start_session(email, options.into())
    }

    pub fn sign_out(&self) {
        info!("Mock sign-out");
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.events.emit(AuthEvent::SignedOut, None);
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(AuthEvent, Option<&Session>) + Send + Sync + 'static,
    {
        let current = self.session();
        self.events.subscribe(listener, current.as_ref())
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.events.listener_count()
    }

    fn start_session(&self, email: &str, user_metadata: UserMetadata) -> Session {
        let session = session_for(email, user_metadata);
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        debug!("Mock session started for user {}", session.user.id);
        self.events.emit(AuthEvent::SignedIn, Some(&session));
        session
    }
}

/// Builds the session a given email always maps to.
#[must_use]
pub fn session_for(email: &str, user_metadata: UserMetadata) -> Session {
    let mut hasher = DefaultHasher::new();
    email.trim().to_lowercase().hash(&mut hasher);
    let user_id = format!("mock-user-{:016x}", hasher.finish());

    Session {
        access_token: format!("mock-token-{user_id}"),
        user: AuthUser {
            id: user_id,
            email: Some(email.to_string()),
            user_metadata,
        },
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_session_is_deterministic_per_email() {
        let a = session_for("ana@example.com", UserMetadata::default());
        let b = session_for("ANA@example.com ", UserMetadata::default());
        let c = session_for("bia@example.com", UserMetadata::default());
        assert_eq!(a.user.id, b.user.id);
        assert_ne!(a.user.id, c.user.id);
        assert_eq!(a.access_token, format!("mock-token-{}", a.user.id));
    }

    #[test]
    fn test_sign_out_emits_once_and_clears() {
        let auth = MockAuth::new();
        auth.sign_in("a@b.com");
        let signed_out = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&signed_out);
        let _sub = auth.subscribe(move |event, session| {
            if event == AuthEvent::SignedOut {
                assert!(session.is_none());
                *counter.lock().unwrap() += 1;
            }
        });

        auth.sign_out();

        assert!(auth.session().is_none());
        assert_eq!(*signed_out.lock().unwrap(), 1);
    }

    #[test]
    fn test_sign_up_seeds_metadata() {
        let auth = MockAuth::new();
        let session = auth.sign_up(
            "a@b.com",
            SignUpOptions {
                full_name: Some("Ana".to_string()),
                avatar_url: Some("https://avatar".to_string()),
            },
        );
        assert_eq!(session.user.user_metadata.full_name.as_deref(), Some("Ana"));
        assert_eq!(auth.session(), Some(session));
    }
}
