//! DashScope Builder Implementation
//!
//! Fluent construction of a [`DashScopeClient`].
//!
//! # Example
//! ```rust,ignore
//! use siumai_dashscope::DashScopeClient;
//!
//! let client = DashScopeClient::builder()
//!     .model("qwen-turbo")
//!     .http_debug(true)
//!     .build()?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::client::DashScopeClient;
use crate::config::{DashScopeConfig, HttpConfig, build_http_client_from_config, resolve_api_key};
use crate::defaults::{endpoints, runtime};
use crate::error::LlmError;
use crate::execution::interceptor::{HttpInterceptor, LoggingInterceptor};
use crate::execution::transport::{HttpTransport, ReqwestTransport};

/// DashScope client builder
#[derive(Clone, Default)]
pub struct DashScopeBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    http_config: HttpConfig,
    poll_interval: Option<Duration>,
    poll_timeout: Option<Duration>,
    http_debug: bool,
    interceptors: Vec<Arc<dyn HttpInterceptor>>,
    http_client: Option<reqwest::Client>,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl std::fmt::Debug for DashScopeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashScopeBuilder")
            .field("has_api_key", &self.api_key.is_some())
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("http_config", &self.http_config)
            .field("poll_interval", &self.poll_interval)
            .field("poll_timeout", &self.poll_timeout)
            .field("http_debug", &self.http_debug)
            .finish_non_exhaustive()
    }
}

impl DashScopeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API key. Without one, `DASHSCOPE_API_KEY` is read at build time.
    pub fn api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    /// Default chat model for requests that do not name one.
    pub fn model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    // === HTTP Basic Configuration ===

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.http_config.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.http_config.connect_timeout = Some(timeout);
        self
    }

    pub fn proxy<S: Into<String>>(mut self, proxy: S) -> Self {
        self.http_config.proxy = Some(proxy.into());
        self
    }

    pub fn user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.http_config.user_agent = Some(user_agent.into());
        self
    }

    /// Add a header sent with every request.
    pub fn header<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.http_config.headers.insert(key.into(), value.into());
        self
    }

    /// Replace the whole HTTP configuration.
    pub fn http_config(mut self, config: HttpConfig) -> Self {
        self.http_config = config;
        self
    }

    // === Task polling ===

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Give up on a Wanx task after `timeout`. Unset means wait until it ends.
    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = Some(timeout);
        self
    }

    // === HTTP Advanced Configuration ===

    /// Enable a built-in logging interceptor for HTTP debugging (no sensitive data).
    pub fn http_debug(mut self, enabled: bool) -> Self {
        self.http_debug = enabled;
        self
    }

    /// Add a custom HTTP interceptor (installed on the `reqwest` transport).
    pub fn with_http_interceptor(mut self, interceptor: Arc<dyn HttpInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Use a preconfigured `reqwest` client instead of building one.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Use a custom transport. Interceptors and HTTP client settings are then ignored.
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the DashScope client
    pub fn build(self) -> Result<DashScopeClient, LlmError> {
        self.build_with_env(|name| std::env::var(name).ok())
    }

    fn build_with_env<F>(self, env: F) -> Result<DashScopeClient, LlmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Priority: explicit key > environment variable
        let api_key = resolve_api_key(self.api_key, env).ok_or_else(|| {
            LlmError::ConfigurationError(format!(
                "missing the DashScope API key, set it in the {} environment variable",
                crate::defaults::API_KEY_ENV
            ))
        })?;

        let config = DashScopeConfig {
            api_key,
            base_url: self
                .base_url
                .unwrap_or_else(|| endpoints::BASE_URL.to_string()),
            model: self.model.unwrap_or_default(),
            http_config: self.http_config,
            poll_interval: self.poll_interval.unwrap_or(runtime::POLL_INTERVAL),
            poll_timeout: self.poll_timeout,
        };
        config.validate()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let http_client = match self.http_client {
                    Some(client) => client,
                    None => build_http_client_from_config(&config.http_config)?,
                };
                let mut interceptors = self.interceptors;
                if self.http_debug {
                    interceptors.push(Arc::new(LoggingInterceptor));
                }
                Arc::new(ReqwestTransport::new(http_client).with_interceptors(interceptors))
            }
        };

        tracing::debug!(
            target: "siumai::dashscope",
            base_url = %config.base_url,
            model = %config.model,
            "dashscope client built"
        );
        DashScopeClient::new(config, transport)
    }
}
