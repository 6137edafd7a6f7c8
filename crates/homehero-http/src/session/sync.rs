//! Keeps the session store in step with the identity provider.

use crate::client::ApiClient;
use crate::error::{HomeHeroError, Result};
use crate::session::SessionStore;
use crate::types::{ApiRequest, AuthEvent, Identity};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// Where the synchronizer stands with respect to the identity provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncState {
    /// No callback from the identity provider yet.
    Unknown,
    SignedOut,
    /// `has_token` is false when the token exchange failed.
    SignedIn { identity: Identity, has_token: bool },
}

impl SyncState {
    #[inline]
    pub fn is_loading(&self) -> bool {
        matches!(self, SyncState::Unknown)
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SyncState::SignedIn { identity, .. } => Some(identity),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    email: &'a str,
}

/// Body of the token-exchange response. Both `{ token }` and
/// `{ success, token }` are accepted.
#[derive(Debug, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl TokenResponse {
    pub fn into_token(self) -> Result<String> {
        if self.success == Some(false) {
            return Err(HomeHeroError::TokenExchange(
                self.message
                    .unwrap_or_else(|| "server reported success: false".to_string()),
            ));
        }
        match self.token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(HomeHeroError::TokenExchange(
                "response carried no token".to_string(),
            )),
        }
    }
}

/// State machine driven by [`AuthEvent`]s.
///
/// Events are handled one at a time and in order; [`SessionSynchronizer::run`]
/// drains a subscription on a single task.
pub struct SessionSynchronizer {
    store: Arc<SessionStore>,
    client: ApiClient,
    state: watch::Sender<SyncState>,
    token_path: String,
    logout_path: String,
}

impl SessionSynchronizer {
    /// `client` is used without token attachment whatever its configuration.
    pub fn new(store: Arc<SessionStore>, client: &ApiClient) -> Self {
        let (state, _) = watch::channel(SyncState::Unknown);
        Self {
            store,
            client: client.as_public(),
            state,
            token_path: "/jwt".to_string(),
            logout_path: "/logout".to_string(),
        }
    }

    pub fn with_paths(mut self, token_path: impl Into<String>, logout_path: impl Into<String>) -> Self {
        self.token_path = token_path.into();
        self.logout_path = logout_path.into();
        self
    }

    pub fn state(&self) -> SyncState {
        self.state.borrow().clone()
    }

    /// Observe state changes, e.g. to leave a loading view.
    pub fn watch(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Apply one identity-provider event.
    ///
    /// Returns `TokenExchange` when signing in did not yield a token; the
    /// state is still `SignedIn`, tokenless.
    pub async fn handle(&self, event: AuthEvent) -> Result<()> {
        match event {
            AuthEvent::SignedIn(identity) => self.enter_signed_in(identity).await,
            AuthEvent::SignedOut => {
                self.enter_signed_out().await;
                Ok(())
            }
        }
    }

    async fn enter_signed_in(&self, identity: Identity) -> Result<()> {
        tracing::info!(email = %identity.email, "Auth state changed: signed in");

        // A token from an earlier event is never reused, same user or not.
        self.store.clear_token();
        self.store.set_identity(Some(identity.clone()));

        let outcome = self.exchange_token(&identity).await;
        let result = match outcome {
            Ok(token) => {
                if let Err(e) = self.store.set_token(token) {
                    tracing::warn!("Token kept in memory only: {}", e);
                }
                Ok(())
            }
            Err(e) => {
                tracing::error!(email = %identity.email, "Token exchange failed: {}", e);
                self.store.clear_token();
                Err(match e {
                    HomeHeroError::TokenExchange(msg) => HomeHeroError::TokenExchange(msg),
                    other => HomeHeroError::TokenExchange(other.to_string()),
                })
            }
        };

        self.state.send_replace(SyncState::SignedIn {
            identity,
            has_token: self.store.has_token(),
        });
        result
    }

    async fn enter_signed_out(&self) {
        tracing::info!("Auth state changed: signed out");
        self.store.clear_token();
        self.store.set_identity(None);
        self.state.send_replace(SyncState::SignedOut);

        let notice = self
            .client
            .fetch(ApiRequest::post(self.logout_path.as_str()))
            .await;
        if let Err(e) = notice {
            tracing::debug!("Logout notice failed (ignored): {}", e);
        }
    }

    /// `POST /jwt { email }` and pull the token out of the reply.
    pub async fn exchange_token(&self, identity: &Identity) -> Result<String> {
        let response: TokenResponse = self
            .client
            .post(
                &self.token_path,
                &TokenRequest {
                    email: &identity.email,
                },
            )
            .await?;
        response.into_token()
    }

    /// Consume `events` until the channel closes.
    pub async fn run(self, events: async_channel::Receiver<AuthEvent>) {
        while let Ok(event) = events.recv().await {
            if let Err(e) = self.handle(event).await {
                tracing::warn!("Session sync: {}", e);
            }
        }
        tracing::debug!("Identity subscription closed, synchronizer stopping");
    }

    /// Run on a background task. The returned receiver follows the state.
    pub fn spawn(
        self,
        events: async_channel::Receiver<AuthEvent>,
    ) -> (tokio::task::JoinHandle<()>, watch::Receiver<SyncState>) {
        let watcher = self.watch();
        let handle = tokio::spawn(self.run(events));
        (handle, watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_shapes() {
        let plain: TokenResponse = serde_json::from_str(r#"{"token":"abc123"}"#).unwrap();
        assert_eq!(plain.into_token().unwrap(), "abc123");

        let flagged: TokenResponse =
            serde_json::from_str(r#"{"success":true,"token":"xyz"}"#).unwrap();
        assert_eq!(flagged.into_token().unwrap(), "xyz");
    }

    #[test]
    fn test_token_response_failures() {
        let refused: TokenResponse =
            serde_json::from_str(r#"{"success":false,"token":"x","message":"nope"}"#).unwrap();
        assert!(matches!(refused.into_token(), Err(HomeHeroError::TokenExchange(m)) if m == "nope"));

        let empty: TokenResponse = serde_json::from_str(r#"{"token":""}"#).unwrap();
        assert!(empty.into_token().is_err());

        let missing: TokenResponse = serde_json::from_str("{}").unwrap();
        assert!(missing.into_token().is_err());
    }

    #[test]
    fn test_state_helpers() {
        assert!(SyncState::Unknown.is_loading());
        assert!(!SyncState::SignedOut.is_loading());
        let state = SyncState::SignedIn {
            identity: Identity::new("a@b.com"),
            has_token: true,
        };
        assert_eq!(state.identity().map(|i| i.email.as_str()), Some("a@b.com"));
    }
}
