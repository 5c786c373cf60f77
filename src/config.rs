use std::env;
use std::time::Duration;

use tracing::warn;
use url::Url;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8045;

fn default_request_timeout() -> u64 {
    30
}

/// Runtime configuration, read from the environment once at startup.
///
/// `api_url` / `api_key` stay optional on purpose: the server still boots
/// without them and the `/api` routes answer 500 until both are present,
/// so a misconfigured deployment fails loudly instead of silently leaking
/// requests somewhere unintended.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listen address, `127.0.0.1` unless overridden (privacy first).
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Base URL of the upstream PR API.
    pub api_url: Option<Url>,
    /// Secret injected as `X-API-Key` on every upstream call.
    pub api_key: Option<String>,
    /// Per-request upstream timeout.
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = get("HOST")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(get("PORT"), "PORT", DEFAULT_PORT);
        let timeout_secs = parse_or(
            get("REQUEST_TIMEOUT"),
            "REQUEST_TIMEOUT",
            default_request_timeout(),
        );

        let api_url = get("API_URL").filter(|v| !v.is_empty()).and_then(|raw| {
            match Url::parse(&raw) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!("API_URL {:?} is not a valid URL ({}), treating as unset", raw, e);
                    None
                }
            }
        });
        let api_key = get("API_KEY").filter(|v| !v.is_empty());

        Self {
            host,
            port,
            api_url,
            api_key,
            request_timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Address string for the TCP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match raw {
        None => default,
        Some(v) if v.is_empty() => default,
        Some(v) => v.parse().unwrap_or_else(|_| {
            warn!("invalid {} value {:?}, falling back to {}", key, v, default);
            default
        }),
    }
}
