use crate::error::Result;
use crate::navigation::Redirect;
use crate::types::{ApiRequest, ApiResponse, AuthEvent};
use async_trait::async_trait;

/// Abstraction for network operations.
///
/// `url` is absolute; the request's query pairs are already part of it.
#[async_trait]
pub trait HttpTransport: Send + Sync + 'static {
    async fn send(&self, url: &str, request: &ApiRequest) -> Result<ApiResponse>;
}

/// Abstraction for durable key/value storage of session material.
///
/// Implementations are synchronous: writes are small and must be committed
/// before the caller continues.
pub trait TokenStorage: Send + Sync + 'static {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&self, key: &str, value: &str) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;
}

/// The external identity provider as seen by the request layer.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Stream of identity transitions. The current state is delivered first.
    fn subscribe(&self) -> async_channel::Receiver<AuthEvent>;

    async fn sign_out(&self) -> Result<()>;
}

/// Presentation-layer hook used when the session is torn down.
pub trait Navigator: Send + Sync + 'static {
    fn navigate(&self, redirect: Redirect);
}
