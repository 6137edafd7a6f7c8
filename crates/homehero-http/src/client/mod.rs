//! HomeHero HTTP client implementation.

mod config;
mod fetch;
pub mod native_network;
pub mod retry;
pub mod utils;

pub use config::{ClientConfig, DEFAULT_API_URL};
pub use fetch::ApiClient;
pub use native_network::ReqwestTransport;
pub use retry::{parse_retry_after, RetryConfig, RetryDecision, RetryState};
