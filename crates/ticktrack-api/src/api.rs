use std::env;
use std::time::Duration;

use reqwest::{Client, Url};
use tracing::warn;

use crate::client::ApiClient;
use crate::error::ApiError;

/// Default backend location when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Builder for an [`ApiClient`].
///
/// # Example
/// ```rust,ignore
/// use ticktrack_api::Api;
/// let client = Api::new()
///     .set_base_url("http://localhost:8080/api")
///     .set_timeout_secs(10)
///     .build()
///     .unwrap();
/// let tasks = client.tasks_for_user("42").await.unwrap();
/// ```
pub struct Api {
    pub(crate) base_url: String,
    pub(crate) timeout_secs: u64,
    pub(crate) proxy: Option<String>,
}

impl Default for Api {
    fn default() -> Self {
        Self::new()
    }
}

impl Api {
    /// Create a new `Api` builder.
    ///
    /// Proxy is automatically read from `HTTP_PROXY` / `HTTPS_PROXY` environment variables.
    pub fn new() -> Self {
        let proxy = env::var("HTTP_PROXY")
            .ok()
            .or_else(|| env::var("HTTPS_PROXY").ok());

        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            proxy,
        }
    }

    /// Set the backend base URL, e.g. `"https://tracker.example.com/api"`.
    pub fn set_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the per-request timeout in seconds (default: `30`).
    pub fn set_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Override the HTTP/HTTPS proxy URL.
    pub fn set_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Connect directly, ignoring any proxy picked up from the environment.
    pub fn no_proxy(mut self) -> Self {
        self.proxy = None;
        self
    }

    /// Validate the base URL and build the HTTP client.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let base = Url::parse(&self.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(self.base_url));
        }

        let mut builder = Client::builder()
            .user_agent(concat!("ticktrack/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(self.timeout_secs));

        match self.proxy {
            Some(ref proxy_url) => match reqwest::Proxy::all(proxy_url) {
                Ok(p) => {
                    builder = builder.proxy(p.no_proxy(reqwest::NoProxy::from_env()));
                }
                Err(e) => {
                    warn!(proxy = %proxy_url, error = %e, "ignoring invalid proxy URL");
                    builder = builder.no_proxy();
                }
            },
            None => {
                builder = builder.no_proxy();
            }
        }

        Ok(ApiClient::new(base, builder.build()?))
    }
}
