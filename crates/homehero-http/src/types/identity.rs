//! Identity-provider facing types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamps reported by the identity provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityMetadata {
    pub creation_time: Option<DateTime<Utc>>,
    pub last_sign_in_time: Option<DateTime<Utc>>,
}

/// A user as known to the external identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Stable key used for the backend token exchange.
    pub email: String,
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub metadata: IdentityMetadata,
}

impl Identity {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: None,
            photo_url: None,
            email_verified: false,
            metadata: IdentityMetadata::default(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }

    pub fn verified(mut self) -> Self {
        self.email_verified = true;
        self
    }

    /// Display name, falling back to the local part of the email.
    pub fn name(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => self.email.split('@').next().unwrap_or("User"),
        }
    }

    pub fn last_sign_in_display(&self) -> String {
        display_time(self.metadata.last_sign_in_time)
    }

    pub fn creation_display(&self) -> String {
        display_time(self.metadata.creation_time)
    }
}

fn display_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// A single identity-provider transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Identity),
    SignedOut,
}

impl AuthEvent {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthEvent::SignedIn(identity) => Some(identity),
            AuthEvent::SignedOut => None,
        }
    }
}

impl From<Option<Identity>> for AuthEvent {
    fn from(identity: Option<Identity>) -> Self {
        identity.map_or(AuthEvent::SignedOut, AuthEvent::SignedIn)
    }
}

/// Point-in-time view of the session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub identity: Option<Identity>,
    pub token: Option<String>,
}

impl Session {
    #[inline]
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some() && self.token.is_some()
    }
}
