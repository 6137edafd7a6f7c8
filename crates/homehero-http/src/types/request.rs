//! Per-call request context.

use crate::client::retry::RetryConfig;
use crate::error::Result;
use http::Method;
use serde::Serialize;
use std::collections::BTreeMap;

/// One outgoing HTTP call.
///
/// The bearer credential is not set by callers: the client snapshots the
/// session store into `extra_headers` right before dispatch.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub content_type: Option<String>,
    pub body: bytes::Bytes,
    pub extra_headers: BTreeMap<String, String>,
    pub retry: Option<RetryConfig>,
}

impl Default for ApiRequest {
    fn default() -> Self {
        Self::new(Method::GET, "/")
    }
}

impl ApiRequest {
    #[inline]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            content_type: None,
            body: bytes::Bytes::new(),
            extra_headers: BTreeMap::new(),
            retry: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_query_pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<bytes::Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Serialize `payload` as the JSON body.
    pub fn with_json<T: Serialize + ?Sized>(self, payload: &T) -> Result<Self> {
        let body = serde_json::to_vec(payload)?;
        Ok(self
            .with_content_type("application/json")
            .with_body(body))
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers
            .insert(key.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_retry(mut self, config: RetryConfig) -> Self {
        self.retry = Some(config);
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.extra_headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The `Bearer` credential currently attached, if any.
    pub fn bearer(&self) -> Option<&str> {
        self.header("authorization")?.strip_prefix("Bearer ")
    }

    pub(crate) fn set_bearer(&mut self, token: Option<&str>) {
        self.extra_headers
            .retain(|k, _| !k.eq_ignore_ascii_case("authorization"));
        if let Some(token) = token {
            self.extra_headers
                .insert("authorization".to_string(), format!("Bearer {}", token));
        }
    }

    #[inline]
    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }
}
