//! The HomeHero API client.

use crate::client::config::ClientConfig;
use crate::client::native_network::ReqwestTransport;
use crate::client::retry::{parse_retry_after, RetryConfig, RetryDecision, RetryState};
use crate::client::utils::{is_access_denied_status, redact_token, sleep};
use crate::error::{HomeHeroError, Result};
use crate::session::{SessionStore, SessionTeardown};
use crate::traits::HttpTransport;
use crate::types::{ApiRequest, ApiResponse};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Session-aware HTTP client.
///
/// Built with `attach_token = false` it is the public client. With
/// `attach_token = true` plus [`ApiClient::with_session`] it reads the bearer
/// token from the store on every call and runs the teardown on 401/403
/// before handing the error back.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    config: Arc<ClientConfig>,
    store: Option<Arc<SessionStore>>,
    teardown: Option<Arc<SessionTeardown>>,
}

impl ApiClient {
    /// Client over a `reqwest` transport built from `config`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .connect_timeout(Duration::from_secs(config.connection_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(config.user_agent.clone());

        if !config.proxy_url.is_empty() {
            let proxy = reqwest::Proxy::all(&config.proxy_url)
                .map_err(|e| HomeHeroError::Config(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| HomeHeroError::Config(e.to_string()))?;
        Ok(Self::with_transport(
            config,
            Arc::new(ReqwestTransport::new(client)),
        ))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        ApiClient {
            transport,
            config: Arc::new(config),
            store: None,
            teardown: None,
        }
    }

    /// Bind the session store and the teardown run on authorization failure.
    pub fn with_session(mut self, store: Arc<SessionStore>, teardown: Arc<SessionTeardown>) -> Self {
        self.store = Some(store);
        self.teardown = Some(teardown);
        self
    }

    /// Same transport and settings, different token policy.
    pub fn as_public(&self) -> Self {
        ApiClient {
            transport: self.transport.clone(),
            config: Arc::new(self.config.as_ref().clone().with_attach_token(false)),
            store: None,
            teardown: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &Arc<dyn HttpTransport> {
        &self.transport
    }

    #[inline]
    pub fn is_secure(&self) -> bool {
        self.config.attach_token
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.fetch_json(ApiRequest::get(path)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.fetch_json(ApiRequest::post(path).with_json(body)?)
            .await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.fetch_json(ApiRequest::put(path).with_json(body)?).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.fetch_json(ApiRequest::patch(path).with_json(body)?)
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.fetch_json(ApiRequest::delete(path)).await
    }

    /// Dispatch `request` and parse a 2xx body as JSON.
    pub async fn fetch_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.fetch(request).await?;
        Ok(response.json()?)
    }

    /// Dispatch `request`.
    ///
    /// Non-2xx responses become [`HomeHeroError::Http`]. On a secure client a
    /// 401 or 403 first clears the store, signs out and navigates.
    pub async fn fetch(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        if self.config.attach_token {
            let token = self.store.as_ref().and_then(|s| s.token());
            if let Some(token) = &token {
                tracing::trace!(token = %redact_token(token), path = %request.path, "attaching bearer");
            }
            request.set_bearer(token.as_deref());
        }

        let url = self.config.url_for(&request.path, &request.query)?;
        let response = self.fetch_with_retries(url.as_str(), &request).await?;

        if response.is_success() {
            return Ok(response);
        }

        let status = response.status;
        let body = String::from_utf8_lossy(&response.body).into_owned();
        tracing::warn!(status, method = %request.method, path = %request.path, "request failed");

        if self.config.attach_token && is_access_denied_status(status) {
            if let Some(teardown) = &self.teardown {
                teardown.run(Some(request.path.as_str())).await;
            }
        }

        Err(HomeHeroError::Http { status, body })
    }

    async fn fetch_with_retries(&self, url: &str, request: &ApiRequest) -> Result<ApiResponse> {
        let retry_config = request.retry.clone().unwrap_or_else(|| {
            if self.config.max_retries == 0 {
                RetryConfig::no_retry()
            } else {
                RetryConfig::default()
                    .with_max_retries(self.config.max_retries)
                    .with_initial_backoff(Duration::from_millis(self.config.retry_delay_ms))
            }
        });

        let mut retry_state = RetryState::new(retry_config);

        loop {
            match self.transport.send(url, request).await {
                Ok(response) => {
                    if response.is_success() || is_access_denied_status(response.status) {
                        return Ok(response);
                    }
                    let retry_after = response.header("retry-after").and_then(parse_retry_after);
                    match retry_state.should_retry_status(response.status, retry_after) {
                        RetryDecision::Retry(delay) => {
                            tracing::warn!(
                                "Request status {} (attempt {}), retrying in {:?}",
                                response.status,
                                retry_state.attempts,
                                delay
                            );
                            sleep(delay).await;
                        }
                        RetryDecision::DontRetry => return Ok(response),
                    }
                }
                Err(e) => match retry_state.should_retry_error() {
                    RetryDecision::Retry(delay) if e.is_retryable() => {
                        tracing::warn!(
                            "Request failed (attempt {}), retrying in {:?}: {}",
                            retry_state.attempts,
                            delay,
                            e
                        );
                        sleep(delay).await;
                    }
                    _ => return Err(e),
                },
            }
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("has_session", &self.store.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryStorage;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    struct Scripted {
        responses: Mutex<VecDeque<Result<ApiResponse>>>,
        seen: Mutex<Vec<(String, ApiRequest)>>,
    }

    impl Scripted {
        fn new(responses: Vec<Result<ApiResponse>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl HttpTransport for Scripted {
        async fn send(&self, url: &str, request: &ApiRequest) -> Result<ApiResponse> {
            self.seen.lock().push((url.to_string(), request.clone()));
            self.responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(ApiResponse::new(200, "null")))
        }
    }

    #[tokio::test]
    async fn test_public_client_returns_parsed_body() {
        let transport = Scripted::new(vec![Ok(ApiResponse::new(200, r#"[{"_id":"1"}]"#))]);
        let client = ApiClient::with_transport(
            ClientConfig::public("http://localhost:5000"),
            transport.clone(),
        );

        let services: serde_json::Value = client.get("/services").await.unwrap();
        assert_eq!(services[0]["_id"], "1");

        let seen = transport.seen.lock();
        assert_eq!(seen[0].0, "http://localhost:5000/services");
        assert_eq!(seen[0].1.bearer(), None);
    }

    #[tokio::test]
    async fn test_public_client_never_attaches_token() {
        let transport = Scripted::new(vec![]);
        let store = Arc::new(SessionStore::new(Arc::new(MemoryStorage::new())));
        store.set_token("secret").unwrap();

        let secure = ApiClient::with_transport(ClientConfig::secure("http://h"), transport.clone())
            .with_session(store.clone(), Arc::new(SessionTeardown::detached(store)));
        let public = secure.as_public();

        let _: serde_json::Value = public.get("/services").await.unwrap();
        assert_eq!(transport.seen.lock()[0].1.bearer(), None);
    }

    #[tokio::test]
    async fn test_http_error_carries_status_and_body() {
        let transport = Scripted::new(vec![Ok(ApiResponse::new(404, "missing"))]);
        let client = ApiClient::with_transport(ClientConfig::public("http://h"), transport);

        let err = client.get::<serde_json::Value>("/services/x").await.unwrap_err();
        match err {
            HomeHeroError::Http { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "missing");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_network_error_not_retried_by_default() {
        let transport = Scripted::new(vec![
            Err(HomeHeroError::Network("refused".into())),
            Ok(ApiResponse::new(200, "{}")),
        ]);
        let client = ApiClient::with_transport(ClientConfig::public("http://h"), transport.clone());

        let err = client.get::<serde_json::Value>("/services").await.unwrap_err();
        assert!(matches!(err, HomeHeroError::Network(_)));
        assert_eq!(transport.seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_opt_in_retry_on_503() {
        let transport = Scripted::new(vec![
            Ok(ApiResponse::new(503, "").with_header("Retry-After", "0")),
            Ok(ApiResponse::new(200, r#"{"ok":true}"#)),
        ]);
        let client = ApiClient::with_transport(ClientConfig::public("http://h"), transport.clone());

        let request = ApiRequest::get("/services").with_retry(
            RetryConfig::default()
                .with_max_retries(2)
                .with_initial_backoff(Duration::from_millis(1)),
        );
        let value: serde_json::Value = client.fetch_json(request).await.unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(transport.seen.lock().len(), 2);
    }
}
