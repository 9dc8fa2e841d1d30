//! Raw HTTP transport.
//!
//! [`MpHttpClient`] owns the `reqwest` client and the default header set
//! derived from [`ClientConfig`]. It never decodes bodies: responses come back
//! fully buffered as [`RawResponse`] and the caller picks the decoder.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::request::{SignedRequest, APPLICATION_JSON};
use crate::response::RawResponse;

/// HTTP client for the Megaplan API. Cheap to clone; clones share the
/// connection pool.
#[derive(Debug, Clone)]
pub struct MpHttpClient {
    inner: reqwest::Client,
    config: ClientConfig,
    default_headers: HeaderMap,
}

impl MpHttpClient {
    /// Create a new HTTP client from a configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let default_headers = config.default_headers()?;

        let pool_max_idle = if config.keep_alive {
            config.pool_max_idle_per_host
        } else {
            0
        };

        // Decompression is handled by the response decoder.
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(pool_max_idle)
            .user_agent(&config.user_agent)
            .gzip(false)
            .deflate(false);

        if let Some(ref proxy) = config.proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str()).map_err(|e| {
                Error::with_source(ErrorKind::Config(format!("invalid proxy {}: {}", proxy, e)), e)
            })?;
            builder = builder.proxy(proxy);
        }

        if config.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let inner = builder
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self {
            inner,
            config,
            default_headers,
        })
    }

    /// Create a new HTTP client with default configuration.
    pub fn default_client() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Headers applied to bearer and raw requests.
    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// Start a raw request. Finish it with [`Self::send_raw`].
    pub fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        self.inner.request(method, url)
    }

    /// Execute a built request and buffer the response.
    #[instrument(skip(self, request), fields(method = %request.method(), url = %request.url()))]
    pub async fn execute(&self, request: SignedRequest) -> Result<RawResponse> {
        let req = request.into_reqwest(&self.inner).build()?;
        self.dispatch(req).await
    }

    /// Send a request built outside [`crate::RequestBuilder`].
    ///
    /// Only the default headers are added, without overriding anything the
    /// caller set; `Content-Type` falls back to `application/json`.
    #[instrument(skip(self, request))]
    pub async fn send_raw(&self, request: reqwest::RequestBuilder) -> Result<RawResponse> {
        self.send_raw_with(request, &HeaderMap::new()).await
    }

    /// Like [`send_raw`](Self::send_raw), with `extra` headers applied
    /// before the defaults, again only where the caller left them unset.
    pub(crate) async fn send_raw_with(
        &self,
        request: reqwest::RequestBuilder,
        extra: &HeaderMap,
    ) -> Result<RawResponse> {
        let mut req = request.build()?;
        let headers = req.headers_mut();
        for (name, value) in extra.iter().chain(self.default_headers.iter()) {
            if !headers.contains_key(name) {
                headers.insert(name.clone(), value.clone());
            }
        }
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        }
        self.dispatch(req).await
    }

    async fn dispatch(&self, req: reqwest::Request) -> Result<RawResponse> {
        if self.config.enable_tracing {
            debug!(method = %req.method(), url = %req.url(), "Sending request");
        }

        let response = self.inner.execute(req).await?;

        if self.config.enable_tracing {
            let status = response.status().as_u16();
            let content_length = response.content_length();

            if response.status().is_success() {
                debug!(status, content_length, "Response received");
            } else {
                info!(status, content_length, "Non-success response");
            }
        }

        RawResponse::from_reqwest(response).await
    }
}
