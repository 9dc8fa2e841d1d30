//! High-level Megaplan client.
//!
//! [`MegaplanClient`] binds a base URL and an [`AuthScheme`] to an
//! [`MpHttpClient`]. Every request goes through the same cycle: build
//! ([`RequestBuilder`]), sign or decorate, execute, decode.
//!
//! ## Security
//!
//! - Secrets are redacted in Debug output
//! - Request bodies and file contents are skipped in tracing spans

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::instrument;
use url::Url;

use crate::client::MpHttpClient;
use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::query::QueryParams;
use crate::request::{endpoint_url, parse_base_url, AuthScheme, BearerToken, RequestBuilder, SignedRequest};
use crate::response::{
    decode_envelope, decode_legacy, parse_envelope, Envelope, LegacyEnvelope, RawResponse,
};

/// Endpoint of the file storage in the current API.
pub const FILE_UPLOAD_PATH: &str = "/api/file";

/// Multipart field name the file storage expects.
pub const FILE_UPLOAD_FIELD: &str = "files[]";

/// Megaplan API client.
///
/// # Example
///
/// ```rust,ignore
/// use megaplan_client::{AuthScheme, MegaplanClient, QueryParams};
///
/// let client = MegaplanClient::new("company.megaplan.ru", AuthScheme::bearer(token)?)?;
///
/// let tasks: Envelope<Vec<Task>> = client
///     .send(client.get("/api/v3/task").params(QueryParams::new().with("limit", 50)))
///     .await?;
/// if tasks.next() {
///     // fetch the next page
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MegaplanClient {
    http: MpHttpClient,
    base: Url,
    scheme: AuthScheme,
}

impl MegaplanClient {
    /// Create a client for a domain with the default configuration.
    pub fn new(domain: &str, scheme: AuthScheme) -> Result<Self> {
        Self::with_config(domain, scheme, ClientConfig::default())
    }

    /// Create a client with custom configuration.
    pub fn with_config(domain: &str, scheme: AuthScheme, config: ClientConfig) -> Result<Self> {
        Self::with_http_client(domain, scheme, MpHttpClient::new(config)?)
    }

    /// Create a client on top of an existing transport, sharing its pool.
    pub fn with_http_client(domain: &str, scheme: AuthScheme, http: MpHttpClient) -> Result<Self> {
        Ok(Self {
            http,
            base: parse_base_url(domain)?,
            scheme,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn scheme(&self) -> &AuthScheme {
        &self.scheme
    }

    pub fn http(&self) -> &MpHttpClient {
        &self.http
    }

    /// Absolute URL of an endpoint path.
    pub fn url(&self, path: &str) -> Url {
        endpoint_url(&self.base, path)
    }

    /// Replace the bearer token. Requests built afterwards use the new token.
    ///
    /// Fails under the legacy scheme, whose credentials are fixed.
    pub fn set_token(&mut self, token: impl Into<String>) -> Result<()> {
        match self.scheme {
            AuthScheme::Bearer(ref mut current) => {
                *current = BearerToken::new(token)?;
                Ok(())
            }
            AuthScheme::Legacy(_) => Err(Error::new(ErrorKind::Config(
                "the legacy scheme has no token to replace".to_string(),
            ))),
        }
    }

    // =========================================================================
    // Request builders
    // =========================================================================

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        RequestBuilder::new(method, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.request(Method::PUT, path)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.request(Method::DELETE, path)
    }

    /// Sign or decorate a request under the active scheme.
    pub fn build(&self, request: RequestBuilder) -> Result<SignedRequest> {
        request.build(&self.base, &self.scheme, self.http.default_headers())
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Build and execute a request, returning the undecoded response.
    #[instrument(skip(self, request), fields(scheme = self.scheme.name(), path = %request.path()))]
    pub async fn execute(&self, request: RequestBuilder) -> Result<RawResponse> {
        let signed = self.build(request)?;
        self.http.execute(signed).await
    }

    /// Execute and decode the envelope. Field errors in `meta.errors` become
    /// an [`ErrorKind::Api`] error.
    pub async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Envelope<T>> {
        decode_envelope(self.execute(request).await?)
    }

    /// Execute and decode the envelope, leaving `meta.errors` to the caller.
    pub async fn send_unchecked<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Envelope<T>> {
        parse_envelope(self.execute(request).await?)
    }

    /// Execute a legacy request and decode its `{status, data}` response.
    pub async fn send_legacy<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<LegacyEnvelope<T>> {
        decode_legacy(self.execute(request).await?)
    }

    /// GET an endpoint of the current API with query parameters.
    #[instrument(skip(self, params))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: QueryParams,
    ) -> Result<Envelope<T>> {
        self.send(self.get(path).params(params)).await
    }

    /// POST a JSON body to an endpoint of the current API.
    #[instrument(skip(self, body))]
    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Envelope<T>> {
        self.send(self.post(path).json(body)?).await
    }

    /// GET a legacy endpoint, parameters in the signed query string.
    #[instrument(skip(self, params))]
    pub async fn legacy_get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: QueryParams,
    ) -> Result<LegacyEnvelope<T>> {
        self.send_legacy(self.get(path).params(params)).await
    }

    /// POST to a legacy endpoint, parameters as the form body.
    #[instrument(skip(self, params))]
    pub async fn legacy_post<T: DeserializeOwned>(
        &self,
        path: &str,
        params: QueryParams,
    ) -> Result<LegacyEnvelope<T>> {
        self.send_legacy(self.post(path).params(params)).await
    }

    // =========================================================================
    // Raw send
    // =========================================================================

    /// Start a raw request against an endpoint path.
    pub fn raw(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Send a raw request with default headers and, under the bearer scheme,
    /// the token. Legacy signing is not applied. An `Authorization` header
    /// set by the caller is left as is.
    pub async fn send_raw(&self, request: reqwest::RequestBuilder) -> Result<RawResponse> {
        let mut extra = HeaderMap::new();
        if let AuthScheme::Bearer(ref token) = self.scheme {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.as_str()))?;
            value.set_sensitive(true);
            extra.insert(AUTHORIZATION, value);
        }
        self.http.send_raw_with(request, &extra).await
    }

    /// Upload a file to the file storage.
    ///
    /// The response envelope describes the stored file(s).
    #[instrument(skip(self, content), fields(size = tracing::field::Empty))]
    pub async fn upload_file<T: DeserializeOwned>(
        &self,
        filename: &str,
        content: impl Into<Bytes>,
    ) -> Result<Envelope<T>> {
        let content: Bytes = content.into();
        tracing::Span::current().record("size", content.len());

        let part = reqwest::multipart::Part::bytes(content.to_vec())
            .file_name(filename.to_string())
            .mime_str("application/octet-stream")?;
        let form = reqwest::multipart::Form::new().part(FILE_UPLOAD_FIELD, part);

        let response = self
            .send_raw(self.raw(Method::POST, FILE_UPLOAD_PATH).multipart(form))
            .await?;
        decode_envelope(response)
    }
}
