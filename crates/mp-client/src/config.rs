//! Client configuration.
//!
//! [`ClientConfig::default()`] is the named preset every client starts from;
//! nothing is read from global state, so two clients never share settings by
//! accident.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT_ENCODING, USER_AGENT};

use crate::error::Result;

/// Header that makes the current API act on behalf of another user.
pub const X_USER_ID: &str = "X-User-Id";

/// Configuration for the HTTP client and the default request headers.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Pool idle timeout.
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections per host.
    pub pool_max_idle_per_host: usize,
    /// Keep connections alive between requests.
    pub keep_alive: bool,
    /// Explicit proxy URL. When unset the system proxy settings apply.
    pub proxy: Option<String>,
    /// Skip TLS certificate verification (self-signed development domains).
    pub accept_invalid_certs: bool,
    /// User-Agent header value.
    pub user_agent: String,
    /// Send `Accept-Encoding: gzip` on bearer requests.
    pub accept_gzip: bool,
    /// Act on behalf of this user (`X-User-Id`). Ignored when zero.
    pub user_id: Option<u64>,
    /// Additional headers sent with every request.
    pub headers: Vec<(String, String)>,
    /// Whether to enable request/response tracing.
    pub enable_tracing: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: cpus,
            keep_alive: true,
            proxy: None,
            accept_invalid_certs: false,
            user_agent: crate::USER_AGENT.to_string(),
            accept_gzip: false,
            user_id: None,
            headers: Vec::new(),
            enable_tracing: true,
        }
    }
}

impl ClientConfig {
    /// Create a new client config builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Headers applied to every outgoing request, before any scheme-specific
    /// headers.
    pub fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&self.user_agent)?);

        if self.accept_gzip {
            headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        }

        if let Some(user_id) = self.user_id.filter(|id| *id > 0) {
            headers.insert(
                HeaderName::from_static("x-user-id"),
                HeaderValue::from(user_id),
            );
        }

        for (name, value) in &self.headers {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(value)?,
            );
        }

        Ok(headers)
    }
}

/// Builder for ClientConfig.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set pool idle timeout.
    pub fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    /// Set maximum idle connections per host.
    pub fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.config.pool_max_idle_per_host = max;
        self
    }

    /// Enable or disable connection reuse.
    pub fn with_keep_alive(mut self, enabled: bool) -> Self {
        self.config.keep_alive = enabled;
        self
    }

    /// Route all requests through the given proxy.
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.config.proxy = Some(proxy.into());
        self
    }

    /// Accept invalid TLS certificates. Only for development domains.
    pub fn with_insecure_skip_verify(mut self, yes: bool) -> Self {
        self.config.accept_invalid_certs = yes;
        self
    }

    /// Set custom User-Agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Ask the server for gzip-compressed responses (bearer scheme).
    pub fn with_accept_gzip(mut self, yes: bool) -> Self {
        self.config.accept_gzip = yes;
        self
    }

    /// Perform requests as the given user. Zero removes the header.
    pub fn with_user_id(mut self, user_id: u64) -> Self {
        self.config.user_id = (user_id > 0).then_some(user_id);
        self
    }

    /// Add a header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.push((name.into(), value.into()));
        self
    }

    /// Enable or disable request/response tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.config.enable_tracing = enabled;
        self
    }

    /// Build the client configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
