//! Redirects requested by the request layer and the private-route guard.

use crate::session::SyncState;
use crate::traits::Navigator;
use serde::Serialize;

pub const LOGIN_ROUTE: &str = "/login";
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please login again.";

/// A navigation request for the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub route: String,
    /// Where to go back to after signing in.
    pub return_to: Option<String>,
    pub message: Option<String>,
}

impl Redirect {
    pub fn to(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            return_to: None,
            message: None,
        }
    }

    pub fn login() -> Self {
        Self::to(LOGIN_ROUTE)
    }

    /// The redirect issued by a session teardown.
    pub fn session_expired(return_to: Option<&str>) -> Self {
        Self {
            route: LOGIN_ROUTE.to_string(),
            return_to: return_to.map(str::to_string),
            message: Some(SESSION_EXPIRED_MESSAGE.to_string()),
        }
    }

    pub fn with_return_to(mut self, path: impl Into<String>) -> Self {
        self.return_to = Some(path.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Outcome of guarding a route that needs a signed-in user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteDecision {
    /// The identity provider has not reported yet; show a spinner.
    Loading,
    Allow,
    Redirect(Redirect),
}

pub fn guard_private_route(state: &SyncState, location: &str) -> RouteDecision {
    match state {
        SyncState::Unknown => RouteDecision::Loading,
        SyncState::SignedIn { .. } => RouteDecision::Allow,
        SyncState::SignedOut => RouteDecision::Redirect(Redirect::login().with_return_to(location)),
    }
}

/// Forwards redirects over a channel to whoever drives the UI.
#[derive(Clone, Debug)]
pub struct ChannelNavigator {
    tx: async_channel::Sender<Redirect>,
}

impl ChannelNavigator {
    pub fn new() -> (Self, async_channel::Receiver<Redirect>) {
        let (tx, rx) = async_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn navigate(&self, redirect: Redirect) {
        if let Err(e) = self.tx.try_send(redirect) {
            tracing::warn!("Navigation dropped, no listener: {:?}", e.into_inner());
        }
    }
}

/// Logs redirects. Used where there is no view to move to.
#[derive(Clone, Debug, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, redirect: Redirect) {
        tracing::info!(
            route = %redirect.route,
            return_to = ?redirect.return_to,
            message = ?redirect.message,
            "navigate"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Identity;

    #[test]
    fn test_session_expired_redirect() {
        let redirect = Redirect::session_expired(Some("/my-bookings"));
        assert_eq!(redirect.route, "/login");
        assert_eq!(redirect.return_to.as_deref(), Some("/my-bookings"));
        assert_eq!(redirect.message.as_deref(), Some(SESSION_EXPIRED_MESSAGE));
    }

    #[test]
    fn test_guard_private_route() {
        assert_eq!(guard_private_route(&SyncState::Unknown, "/profile"), RouteDecision::Loading);
        assert_eq!(
            guard_private_route(&SyncState::SignedOut, "/profile"),
            RouteDecision::Redirect(Redirect::login().with_return_to("/profile"))
        );
        let signed_in = SyncState::SignedIn {
            identity: Identity::new("a@b.com"),
            has_token: false,
        };
        assert_eq!(guard_private_route(&signed_in, "/profile"), RouteDecision::Allow);
    }

    #[tokio::test]
    async fn test_channel_navigator_delivers() {
        let (navigator, rx) = ChannelNavigator::new();
        navigator.navigate(Redirect::login());
        assert_eq!(rx.recv().await.unwrap(), Redirect::login());

        drop(rx);
        navigator.navigate(Redirect::login());
    }
}
