//! Session/view controller.
//!
//! Owns the current view and the signed-in user. The view follows the auth
//! channel: any event carrying a session maps the user and moves public views
//! to the dashboard, `SignedOut` returns to the landing page.

use crate::backend::{AuthEvent, BackendClient, Subscription};
use crate::entities::{Session, User};
use crate::errors::Result;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, warn};

/// Screens of the application.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ViewState {
    #[default]
    Landing,
    Login,
    Register,
    Dashboard,
    Generator,
}

impl ViewState {
    /// Reachable without a session.
    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Landing | Self::Login | Self::Register)
    }
}

#[derive(Debug, Default)]
struct ControllerState {
    view: ViewState,
    user: Option<User>,
    loading: bool,
}

impl ControllerState {
    fn apply(&mut self, event: AuthEvent, session: Option<&Session>) {
        match session {
            Some(session) => {
                self.user = Some(User::from(&session.user));
                if self.view.is_public() {
                    self.view = ViewState::Dashboard;
                }
            }
            None => {
                self.user = None;
                if event == AuthEvent::SignedOut {
                    self.view = ViewState::Landing;
                }
            }
        }
    }
}

/// Drives navigation from auth state.
pub struct SessionController {
    backend: Arc<dyn BackendClient>,
    state: Arc<Mutex<ControllerState>>,
    subscription: Mutex<Option<Subscription>>,
}

impl SessionController {
    #[must_use]
    pub fn new(backend: Arc<dyn BackendClient>) -> Self {
        Self {
            backend,
            state: Arc::new(Mutex::new(ControllerState {
                loading: true,
                ..ControllerState::default()
            })),
            subscription: Mutex::new(None),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut ControllerState) -> T) -> T {
        f(&mut self.state.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Restores any existing session and starts following auth changes.
    /// A failed session lookup is logged and leaves the landing page up.
    pub async fn start(&self) {
        match self.backend.get_session().await {
            Ok(Some(session)) => self.with_state(|state| {
                state.user = Some(User::from(&session.user));
                state.view = ViewState::Dashboard;
            }),
            Ok(None) => self.with_state(|state| state.view = ViewState::Landing),
            Err(e) => error!("Failed to check session: {}", e),
        }
        self.with_state(|state| state.loading = false);

        let state = Arc::clone(&self.state);
        let subscription =
            self.backend
                .on_auth_state_change(Box::new(move |event: AuthEvent, session: Option<&Session>| {
                    debug!("Auth event {}", event.as_str());
                    state
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .apply(event, session);
                }));

        let previous = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(subscription);
        if let Some(previous) = previous {
            previous.unsubscribe();
        }
    }

    /// Stops following auth changes.
    pub fn shutdown(&self) {
        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
            debug!("Session controller detached from auth events");
        }
    }

    #[must_use]
    pub fn view(&self) -> ViewState {
        self.with_state(|state| state.view)
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.with_state(|state| state.user.clone())
    }

    /// True until [`SessionController::start`] has checked the session.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.with_state(|state| state.loading)
    }

    /// Switches view; private views redirect to login without a user.
    pub fn navigate(&self, view: ViewState) -> ViewState {
        self.with_state(|state| {
            state.view = if state.user.is_none() && !view.is_public() {
                ViewState::Login
            } else {
                view
            };
            state.view
        })
    }

    /// Called once a generation is saved.
    pub fn on_saved(&self) -> ViewState {
        self.navigate(ViewState::Dashboard)
    }

    /// Signs out and returns to the landing page. The local state is cleared
    /// even when the backend call fails.
    pub async fn logout(&self) -> Result<()> {
        let result = self
            .backend
            .sign_out()
            .await
            .inspect_err(|e| warn!("Sign-out failed: {}", e));
        self.with_state(|state| {
            state.user = None;
            state.view = ViewState::Landing;
        });
        info!("Logged out");
        result
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::clone_on_ref_ptr)]
    use super::*;
    use crate::backend::mock::MockBackend;
    use crate::core::account;
    use crate::test_utils::init_test_tracing;

    #[tokio::test]
    async fn test_start_without_session_is_landing() {
        init_test_tracing();
        let controller = SessionController::new(Arc::new(MockBackend::new()));
        assert!(controller.is_loading());
        controller.start().await;
        assert!(!controller.is_loading());
        assert_eq!(controller.view(), ViewState::Landing);
        assert!(controller.user().is_none());
    }

    #[tokio::test]
    async fn test_start_with_session_goes_to_dashboard() -> Result<()> {
        let backend = Arc::new(MockBackend::new());
        account::login(backend.as_ref(), "maria@x.com", "secret1").await?;

        let controller = SessionController::new(backend);
        controller.start().await;
        assert_eq!(controller.view(), ViewState::Dashboard);
        assert_eq!(controller.user().unwrap().name, "maria");
        Ok(())
    }

    #[tokio::test]
    async fn test_navigation_guard() {
        let controller = SessionController::new(Arc::new(MockBackend::new()));
        controller.start().await;
        assert_eq!(controller.navigate(ViewState::Generator), ViewState::Login);
        assert_eq!(controller.navigate(ViewState::Dashboard), ViewState::Login);
        assert_eq!(controller.navigate(ViewState::Register), ViewState::Register);
    }

    #[tokio::test]
    async fn test_login_and_logout_follow_auth_events() -> Result<()> {
        let backend = Arc::new(MockBackend::new());
        let controller = SessionController::new(backend.clone());
        controller.start().await;
        controller.navigate(ViewState::Login);

        account::register(backend.as_ref(), "Ana", "a@b.com", "secret1").await?;
        assert_eq!(controller.view(), ViewState::Dashboard);
        assert_eq!(controller.user().unwrap().name, "Ana");

        assert_eq!(controller.navigate(ViewState::Generator), ViewState::Generator);
        assert_eq!(controller.on_saved(), ViewState::Dashboard);

        controller.logout().await?;
        assert_eq!(controller.view(), ViewState::Landing);
        assert!(controller.user().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_sign_in_keeps_private_view() -> Result<()> {
        let backend = Arc::new(MockBackend::new());
        account::login(backend.as_ref(), "a@b.com", "secret1").await?;
        let controller = SessionController::new(backend.clone());
        controller.start().await;
        controller.navigate(ViewState::Generator);

        account::login(backend.as_ref(), "c@d.com", "secret1").await?;
        assert_eq!(controller.view(), ViewState::Generator);
        assert_eq!(controller.user().unwrap().email, "c@d.com");
        Ok(())
    }

    #[tokio::test]
    async fn test_shutdown_unsubscribes() {
        let backend = Arc::new(MockBackend::new());
        let controller = SessionController::new(backend.clone());
        controller.start().await;
        assert_eq!(backend.auth().listener_count(), 1);
        controller.shutdown();
        assert_eq!(backend.auth().listener_count(), 0);
    }
}
