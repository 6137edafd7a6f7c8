use crate::client::utils::redact_token;
use crate::error::Result;
use crate::session::MemoryStorage;
use crate::traits::TokenStorage;
use crate::types::{Identity, Session};
use parking_lot::RwLock;
use std::sync::Arc;

/// Storage slot holding the bearer token.
pub const ACCESS_TOKEN_KEY: &str = "access-token";

/// Single source of truth for the bearer token and the current identity.
///
/// The token is mirrored to durable storage; the identity is in memory only
/// and follows whatever the identity provider last reported.
pub struct SessionStore {
    storage: Arc<dyn TokenStorage>,
    token: RwLock<Option<String>>,
    identity: RwLock<Option<Identity>>,
}

impl SessionStore {
    /// Open a store over `storage`, picking up a token left by a previous run.
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        let token = match storage.get(ACCESS_TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!("Could not read persisted token: {}", e);
                None
            }
        };
        Self {
            storage,
            token: RwLock::new(token),
            identity: RwLock::new(None),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Current bearer token, if any.
    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    #[inline]
    pub fn has_token(&self) -> bool {
        self.token.read().is_some()
    }

    /// Install `token`. The in-memory slot is updated even when persisting
    /// fails, so the running process stays authenticated.
    pub fn set_token(&self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        tracing::debug!(token = %redact_token(&token), "storing access token");
        *self.token.write() = Some(token.clone());
        self.storage.put(ACCESS_TOKEN_KEY, &token)
    }

    /// Drop the token. Safe to call when no token is held.
    pub fn clear_token(&self) {
        let previous = self.token.write().take();
        if previous.is_some() {
            tracing::debug!("access token cleared");
        }
        if let Err(e) = self.storage.delete(ACCESS_TOKEN_KEY) {
            tracing::warn!("Could not remove persisted token: {}", e);
        }
    }

    pub fn identity(&self) -> Option<Identity> {
        self.identity.read().clone()
    }

    pub fn set_identity(&self, identity: Option<Identity>) {
        *self.identity.write() = identity;
    }

    pub fn snapshot(&self) -> Session {
        Session {
            identity: self.identity(),
            token: self.token(),
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("has_token", &self.has_token())
            .field("identity", &self.identity.read().as_ref().map(|i| i.email.clone()))
            .finish()
    }
}
