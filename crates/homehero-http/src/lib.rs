//! Session-aware HTTP access to the HomeHero backend.
//!
//! One [`ApiClient`] type covers both the public and the secure client; the
//! difference is the `attach_token` flag in [`ClientConfig`] plus the
//! [`SessionTeardown`] installed on secure clients.

pub mod client;
pub mod error;
pub mod identity;
pub mod navigation;
pub mod session;
pub mod traits;
pub mod types;

pub use client::{ApiClient, ClientConfig};
pub use error::{HomeHeroError, Result};
pub use identity::LocalIdentityProvider;
pub use navigation::{guard_private_route, Redirect, RouteDecision};
pub use session::{SessionStore, SessionSynchronizer, SessionTeardown, SyncState};
pub use types::{ApiRequest, ApiResponse, AuthEvent, Identity, Session};
