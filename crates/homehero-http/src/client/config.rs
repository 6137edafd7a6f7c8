//! Configuration for the HomeHero HTTP client.

use crate::error::{HomeHeroError, Result};

/// Backend used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "https://homehero-server-v2.vercel.app";

/// Configuration for one client instance.
///
/// The public and the secure client share this type; `attach_token` is the
/// only switch between them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin, e.g. `https://api.example.com`.
    pub base_url: String,
    /// Attach the session bearer token and tear the session down on 401/403.
    pub attach_token: bool,
    /// Maximum retries for failed requests when a request does not carry its
    /// own retry policy. Zero disables retries.
    pub max_retries: u32,
    /// Base retry delay in milliseconds.
    pub retry_delay_ms: u64,
    /// Connection timeout in seconds.
    pub connection_timeout_secs: u64,
    /// Request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Proxy URL (optional).
    pub proxy_url: String,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_API_URL.to_string(),
            attach_token: false,
            max_retries: 0,
            retry_delay_ms: 1000,
            connection_timeout_secs: 30,
            request_timeout_ms: 30000,
            proxy_url: String::new(),
            user_agent: concat!("homehero/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Unauthenticated client for `base_url`.
    pub fn public(base_url: impl Into<String>) -> Self {
        ClientConfig {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Token-attaching client for `base_url`.
    pub fn secure(base_url: impl Into<String>) -> Self {
        ClientConfig {
            base_url: base_url.into(),
            attach_token: true,
            ..Default::default()
        }
    }

    /// Defaults overridden by `HOMEHERO_API_URL`, `HOMEHERO_TIMEOUT_MS` and
    /// `HOMEHERO_PROXY`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("HOMEHERO_API_URL") {
            if !url.trim().is_empty() {
                config.base_url = url.trim().to_string();
            }
        }
        if let Some(ms) = std::env::var("HOMEHERO_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.request_timeout_ms = ms;
        }
        if let Ok(proxy) = std::env::var("HOMEHERO_PROXY") {
            config.proxy_url = proxy;
        }
        config
    }

    /// Same settings, with token attachment switched on or off.
    pub fn with_attach_token(mut self, attach: bool) -> Self {
        self.attach_token = attach;
        self
    }

    /// Resolve `path` and `query` against the base URL.
    pub fn url_for(&self, path: &str, query: &[(String, String)]) -> Result<url::Url> {
        let base = url::Url::parse(self.base_url.trim_end_matches('/'))?;
        if base.cannot_be_a_base() {
            return Err(HomeHeroError::Config(format!(
                "base URL cannot carry paths: {}",
                self.base_url
            )));
        }
        let mut url = base.clone();
        let prefix = base.path().trim_end_matches('/');
        url.set_path(&format!("{}/{}", prefix, path.trim_start_matches('/')));
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert!(!config.attach_token);
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.request_timeout_ms, 30000);
        assert_eq!(config.proxy_url, "");
    }

    #[test]
    fn test_public_and_secure_differ_only_in_attach_token() {
        let public = ClientConfig::public("http://localhost:5000");
        let secure = ClientConfig::secure("http://localhost:5000");
        assert!(!public.attach_token);
        assert!(secure.attach_token);
        assert_eq!(public.with_attach_token(true), secure);
    }

    #[test]
    fn test_url_for_joins_paths_and_query() {
        let config = ClientConfig::public("http://localhost:5000/api/");
        let url = config
            .url_for(
                "/services",
                &[("search".to_string(), "deep clean".to_string())],
            )
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/services?search=deep+clean");

        let url = ClientConfig::public("http://localhost:5000")
            .url_for("jwt", &[])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/jwt");
    }

    #[test]
    fn test_url_for_rejects_garbage_base() {
        let config = ClientConfig::public("not a url");
        assert!(config.url_for("/x", &[]).is_err());
    }
}
