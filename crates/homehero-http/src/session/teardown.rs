use crate::navigation::{Redirect, LOGIN_ROUTE};
use crate::session::SessionStore;
use crate::traits::{IdentityProvider, Navigator};
use std::sync::Arc;

/// The clear-token, sign-out, redirect sequence run when the backend rejects
/// the session.
pub struct SessionTeardown {
    store: Arc<SessionStore>,
    identity: Option<Arc<dyn IdentityProvider>>,
    navigator: Option<Arc<dyn Navigator>>,
    login_route: String,
}

impl SessionTeardown {
    pub fn new(
        store: Arc<SessionStore>,
        identity: Arc<dyn IdentityProvider>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            store,
            identity: Some(identity),
            navigator: Some(navigator),
            login_route: LOGIN_ROUTE.to_string(),
        }
    }

    /// Teardown that only clears the store.
    pub fn detached(store: Arc<SessionStore>) -> Self {
        Self {
            store,
            identity: None,
            navigator: None,
            login_route: LOGIN_ROUTE.to_string(),
        }
    }

    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    /// Run the teardown. Every step is attempted; sign-out failures are
    /// logged and do not stop the redirect.
    pub async fn run(&self, return_to: Option<&str>) {
        tracing::error!(?return_to, "Authorization rejected, tearing session down");

        self.store.clear_token();

        if let Some(identity) = &self.identity {
            if let Err(e) = identity.sign_out().await {
                tracing::warn!("Identity provider sign-out failed: {}", e);
            }
        }

        if let Some(navigator) = &self.navigator {
            navigator.navigate(Redirect {
                route: self.login_route.clone(),
                ..Redirect::session_expired(return_to)
            });
        }
    }
}
