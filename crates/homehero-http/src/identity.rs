//! In-process identity provider.
//!
//! Stands in for a hosted provider: it remembers who is signed in (optionally
//! across restarts) and broadcasts transitions to subscribers. When linked to
//! a [`SessionStore`], the token is dropped before any transition is visible.

use crate::error::{HomeHeroError, Result};
use crate::session::SessionStore;
use crate::traits::{IdentityProvider, TokenStorage};
use crate::types::{AuthEvent, Identity};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Storage slot for the signed-in identity.
pub const IDENTITY_KEY: &str = "identity";

#[derive(Default)]
pub struct LocalIdentityProvider {
    current: RwLock<Option<Identity>>,
    subscribers: Mutex<Vec<async_channel::Sender<AuthEvent>>>,
    storage: Option<Arc<dyn TokenStorage>>,
    session: Option<Arc<SessionStore>>,
}

impl LocalIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that persists the signed-in identity and restores it now.
    pub fn with_storage(storage: Arc<dyn TokenStorage>) -> Self {
        let restored = match storage.get(IDENTITY_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<Identity>(&raw)
                .map_err(|e| tracing::warn!("Ignoring unreadable stored identity: {}", e))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Could not read stored identity: {}", e);
                None
            }
        };
        Self {
            current: RwLock::new(restored),
            subscribers: Mutex::new(Vec::new()),
            storage: Some(storage),
            session: None,
        }
    }

    /// Clear `store`'s token whenever the signed-in user changes, so no
    /// request goes out with a token the new state has not confirmed.
    pub fn with_session(mut self, store: Arc<SessionStore>) -> Self {
        self.session = Some(store);
        self
    }

    pub fn current_user(&self) -> Option<Identity> {
        self.current.read().clone()
    }

    /// Record a successful credential submission.
    pub fn sign_in(&self, mut identity: Identity) -> Result<()> {
        if identity.email.trim().is_empty() {
            return Err(HomeHeroError::Identity("email is required".to_string()));
        }
        identity.metadata.last_sign_in_time = Some(Utc::now());
        self.persist(Some(&identity))?;
        self.transition(Some(identity));
        Ok(())
    }

    /// Create the account and sign it in.
    pub fn register(&self, mut identity: Identity) -> Result<()> {
        identity.metadata.creation_time = Some(Utc::now());
        self.sign_in(identity)
    }

    /// Change name and photo of the signed-in user. Subscribers are not
    /// notified; this is not an auth-state change.
    pub fn update_profile(&self, name: Option<String>, photo: Option<String>) -> Result<Identity> {
        let mut current = self.current.write();
        let identity = current
            .as_mut()
            .ok_or_else(|| HomeHeroError::Identity("no user is signed in".to_string()))?;
        if let Some(name) = name {
            identity.display_name = Some(name);
        }
        if let Some(photo) = photo {
            identity.photo_url = Some(photo);
        }
        let updated = identity.clone();
        drop(current);
        self.persist(Some(&updated))?;
        Ok(updated)
    }

    fn persist(&self, identity: Option<&Identity>) -> Result<()> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };
        match identity {
            Some(identity) => storage.put(IDENTITY_KEY, &serde_json::to_string(identity)?),
            None => storage.delete(IDENTITY_KEY),
        }
    }

    fn transition(&self, identity: Option<Identity>) {
        let mut subscribers = self.subscribers.lock();
        if let Some(session) = &self.session {
            session.clear_token();
            if identity.is_none() {
                session.set_identity(None);
            }
        }
        *self.current.write() = identity.clone();
        let event = AuthEvent::from(identity);
        subscribers.retain(|tx| tx.try_send(event.clone()).is_ok());
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    fn subscribe(&self) -> async_channel::Receiver<AuthEvent> {
        let (tx, rx) = async_channel::unbounded();
        let mut subscribers = self.subscribers.lock();
        let initial = AuthEvent::from(self.current.read().clone());
        if tx.try_send(initial).is_ok() {
            subscribers.push(tx);
        }
        rx
    }

    async fn sign_out(&self) -> Result<()> {
        if let Err(e) = self.persist(None) {
            tracing::warn!("Could not forget stored identity: {}", e);
        }
        self.transition(None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryStorage;

    #[tokio::test]
    async fn test_subscriber_gets_current_state_first() {
        let provider = LocalIdentityProvider::new();
        let rx = provider.subscribe();
        assert_eq!(rx.recv().await.unwrap(), AuthEvent::SignedOut);

        provider.sign_in(Identity::new("a@b.com")).unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.identity().unwrap().email, "a@b.com");
        assert!(event.identity().unwrap().metadata.last_sign_in_time.is_some());

        provider.sign_out().await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), AuthEvent::SignedOut);
    }

    #[test]
    fn test_empty_email_rejected() {
        let provider = LocalIdentityProvider::new();
        assert!(provider.sign_in(Identity::new("  ")).is_err());
        assert!(provider.current_user().is_none());
    }

    #[tokio::test]
    async fn test_identity_persists_across_instances() {
        let storage: Arc<dyn TokenStorage> = Arc::new(MemoryStorage::new());
        let provider = LocalIdentityProvider::with_storage(storage.clone());
        provider
            .register(Identity::new("a@b.com").with_display_name("Ada"))
            .unwrap();

        let restored = LocalIdentityProvider::with_storage(storage.clone());
        let user = restored.current_user().unwrap();
        assert_eq!(user.name(), "Ada");
        assert!(user.metadata.creation_time.is_some());

        restored.sign_out().await.unwrap();
        assert!(LocalIdentityProvider::with_storage(storage).current_user().is_none());
    }

    #[tokio::test]
    async fn test_linked_session_is_cleared_with_the_transition() {
        let store = Arc::new(SessionStore::in_memory());
        let provider = LocalIdentityProvider::new().with_session(store.clone());
        provider.sign_in(Identity::new("a@b.com")).unwrap();
        store.set_token("abc123").unwrap();
        store.set_identity(provider.current_user());

        provider.sign_out().await.unwrap();
        assert_eq!(store.token(), None);
        assert_eq!(store.identity(), None);

        store.set_token("abc123").unwrap();
        provider.sign_in(Identity::new("a@b.com")).unwrap();
        assert_eq!(store.token(), None);
    }

    #[test]
    fn test_update_profile_requires_user() {
        let provider = LocalIdentityProvider::new();
        assert!(provider.update_profile(Some("X".into()), None).is_err());

        provider.sign_in(Identity::new("a@b.com")).unwrap();
        let updated = provider
            .update_profile(Some("Ada".into()), Some("https://img/a.png".into()))
            .unwrap();
        assert_eq!(updated.display_name.as_deref(), Some("Ada"));
        assert_eq!(provider.current_user().unwrap().photo_url.as_deref(), Some("https://img/a.png"));
    }
}
