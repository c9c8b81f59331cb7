//! Auth state publish/subscribe channel shared by every backend.
//!
//! Listeners are called synchronously, in registration order, on the thread
//! that triggered the change. A new subscriber is immediately replayed the
//! current session so late subscribers start in sync.

use crate::entities::Session;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tracing::trace;

/// Kind of auth state change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthEvent {
    /// Replay of the current state delivered on subscription
    InitialSession,
    SignedIn,
    SignedOut,
}

impl AuthEvent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InitialSession => "INITIAL_SESSION",
            Self::SignedIn => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
        }
    }
}

/// Callback invoked on every auth change.
pub type AuthListener = Arc<dyn Fn(AuthEvent, Option<&Session>) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, AuthListener)>>,
}

/// Registry of auth listeners.
#[derive(Default)]
pub struct AuthEvents {
    registry: Arc<Registry>,
}

impl AuthEvents {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` and replays `current` to it before returning.
    pub fn subscribe<F>(&self, listener: F, current: Option<&Session>) -> Subscription
    where
        F: Fn(AuthEvent, Option<&Session>) + Send + Sync + 'static,
    {
        let listener: AuthListener = Arc::new(listener);
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::clone(&listener)));
        trace!("Auth listener {} registered", id);

        listener(AuthEvent::InitialSession, current);

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Delivers `event` to every listener registered at call time.
    ///
    /// The registry lock is released before any listener runs, so listeners
    /// may subscribe, unsubscribe or query the session.
    pub fn emit(&self, event: AuthEvent, session: Option<&Session>) {
        let listeners: Vec<AuthListener> = self
            .registry
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        trace!("Emitting {} to {} listeners", event.as_str(), listeners.len());
        for listener in listeners {
            listener(event, session);
        }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.registry
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Handle returned by a subscription.
///
/// Dropping the handle keeps the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    /// Removes this listener only. A no-op when the backend is already gone.
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(id, _)| *id != self.id);
            trace!("Auth listener {} removed", self.id);
        }
    }
}
