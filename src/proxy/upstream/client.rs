// Upstream client implementation
// All traffic to the PR API funnels through here so the API key is
// attached in exactly one place.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Header carrying the upstream secret. Never reaches the browser.
pub const API_KEY_HEADER: &str = "X-API-Key";

const USER_AGENT: &str = concat!("pr-bubble-admin/", env!("CARGO_PKG_VERSION"));

/// Where to send the request and which secret to present.
#[derive(Debug, Clone, Copy)]
pub struct UpstreamAuth<'a> {
    pub base_url: &'a Url,
    pub api_key: &'a str,
}

/// Raw upstream answer. The body stays as bytes so error payloads can be
/// relayed without the proxy interpreting them.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request timed out")]
    Timeout,

    #[error("upstream request failed: {0}")]
    Transport(reqwest::Error),
}

impl UpstreamError {
    fn classify(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else {
            UpstreamError::Transport(err)
        }
    }
}

pub struct UpstreamClient {
    http_client: Client,
}

impl UpstreamClient {
    pub fn new(request_timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { http_client })
    }

    /// Build the upstream request address
    fn build_url(base_url: &Url, path: &str, query: Option<&str>) -> String {
        let base = base_url.as_str().trim_end_matches('/');
        match query {
            Some(qs) if !qs.is_empty() => format!("{}{}?{}", base, path, qs),
            _ => format!("{}{}", base, path),
        }
    }

    /// Forward a JSON (or bodyless) request, adding the API key header.
    pub async fn send(
        &self,
        auth: UpstreamAuth<'_>,
        method: Method,
        path: &str,
        query: Option<&str>,
        body: Option<&Value>,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let url = Self::build_url(auth.base_url, path, query);

        let mut request = self
            .http_client
            .request(method, &url)
            .header(API_KEY_HEADER, auth.api_key);
        if let Some(json) = body {
            request = request.json(json);
        }

        let response = request.send().await.map_err(UpstreamError::classify)?;
        Self::read(response).await
    }

    /// Forward a multipart form, adding the API key header.
    pub async fn send_multipart(
        &self,
        auth: UpstreamAuth<'_>,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let url = Self::build_url(auth.base_url, path, None);

        let response = self
            .http_client
            .post(&url)
            .header(API_KEY_HEADER, auth.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(UpstreamError::classify)?;
        Self::read(response).await
    }

    async fn read(response: reqwest::Response) -> Result<UpstreamResponse, UpstreamError> {
        let status = response.status();
        // The client timeout covers the body download as well.
        let body = response.bytes().await.map_err(UpstreamError::classify)?;
        Ok(UpstreamResponse { status, body })
    }
}
