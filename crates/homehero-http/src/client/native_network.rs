//! Native HTTP transport over `reqwest`.

use crate::error::{HomeHeroError, Result};
use crate::traits::HttpTransport;
use crate::types::{ApiRequest, ApiResponse};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::collections::BTreeMap;

/// `reqwest`-backed transport.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn network_error(url: &str, e: reqwest::Error) -> HomeHeroError {
    let kind = if e.is_timeout() {
        "timed out"
    } else if e.is_connect() {
        "connection failed"
    } else {
        "transport error"
    };
    HomeHeroError::Network(format!("{} ({}): {}", kind, url, e))
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, url: &str, request: &ApiRequest) -> Result<ApiResponse> {
        let builder = request
            .extra_headers
            .iter()
            .fold(self.client.request(request.method.clone(), url), |b, (k, v)| {
                b.header(k.as_str(), v.as_str())
            });
        let builder = if request.has_body() {
            let content_type = request.content_type.as_deref().unwrap_or("application/json");
            builder
                .header(CONTENT_TYPE, content_type)
                .body(request.body.clone())
        } else {
            builder
        };

        tracing::debug!(
            method = %request.method,
            url,
            authenticated = request.bearer().is_some(),
            "[HomeHeroHTTP-Out]"
        );

        let reply = builder.send().await.map_err(|e| network_error(url, e))?;
        let status = reply.status().as_u16();
        let headers: BTreeMap<String, String> = reply
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
            .collect();
        let body = reply.bytes().await.map_err(|e| network_error(url, e))?;

        tracing::debug!(status, url, bytes = body.len(), "[HomeHeroHTTP-In]");

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}
