// Typed client for the proxy API
//
// Thin and deliberate: one HTTP call per method, no retry, no caching.
// Used by admin tooling and the integration tests; the web UI speaks
// the same endpoints in the same shapes.

pub mod pr;
pub mod upload;

pub use pr::PrListParams;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The proxy (or the upstream relayed through it) answered with an
    /// error status. `detail` carries the body's `detail` field, or
    /// `HTTP <status>` when there was none to read.
    #[error("{detail}")]
    Api { status: StatusCode, detail: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid base URL: {0}")]
    BaseUrl(#[from] url::ParseError),
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)?;
        let http = Client::builder().build()?;
        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Decode a success body, or translate an error response the way the
    /// admin UI surfaces it to the operator.
    async fn handle<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(Self::api_error(status, &body));
        }
        Ok(response.json().await?)
    }

    fn api_error(status: StatusCode, body: &[u8]) -> ApiError {
        let detail = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .map(|e| e.detail)
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        ApiError::Api { status, detail }
    }
}
