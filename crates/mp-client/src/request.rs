//! Request building for both API generations.
//!
//! A [`RequestBuilder`] collects method, path, parameters and extra headers.
//! [`RequestBuilder::build`] turns it into a [`SignedRequest`] under one
//! [`AuthScheme`]:
//!
//! - **Legacy**: parameters are form-encoded, appended to the URL for GET or
//!   sent as the body otherwise, and the request is signed (see
//!   [`crate::signature`]).
//! - **Bearer**: parameters are JSON-encoded into the query string, the token
//!   goes into `Authorization`, and the configured default headers apply.

use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Local, TimeZone};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, AUTHORIZATION, CONTENT_TYPE, DATE,
};
use reqwest::Method;
use serde::Serialize;
use url::Url;

use crate::error::{Error, ErrorKind, Result};
use crate::query::{QueryParams, QueryValue};
use crate::signature::{Signer, SIGNED_CONTENT_TYPE};

pub(crate) const APPLICATION_JSON: &str = "application/json";

/// Authorization header of the legacy API.
pub const X_AUTHORIZATION: &str = "X-Authorization";

/// Opaque bearer token, redacted in Debug output.
#[derive(Clone)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(Error::new(ErrorKind::Config(
                "bearer scheme requires a non-empty token".to_string(),
            )));
        }
        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

/// How requests are authenticated. Chosen once, when the client is built.
#[derive(Debug, Clone)]
pub enum AuthScheme {
    /// HMAC-signed requests of the v1 API.
    Legacy(Signer),
    /// Static token of the v3 API.
    Bearer(BearerToken),
}

impl AuthScheme {
    /// Legacy scheme. Access id and secret key must both be present.
    pub fn legacy(access_id: impl Into<String>, secret_key: impl Into<Vec<u8>>) -> Result<Self> {
        Ok(AuthScheme::Legacy(Signer::new(access_id, secret_key)?))
    }

    /// Bearer scheme. The token must be non-empty.
    pub fn bearer(token: impl Into<String>) -> Result<Self> {
        Ok(AuthScheme::Bearer(BearerToken::new(token)?))
    }

    pub fn name(&self) -> &'static str {
        match self {
            AuthScheme::Legacy(_) => "legacy",
            AuthScheme::Bearer(_) => "bearer",
        }
    }
}

/// Normalize a configured domain into a base URL.
///
/// A bare host gets the `https` scheme. Anything that does not parse into a
/// URL with a host is rejected.
pub fn parse_base_url(domain: &str) -> Result<Url> {
    let domain = domain.trim();
    let candidate = if domain.contains("://") {
        domain.to_string()
    } else {
        format!("https://{}", domain)
    };

    let url = Url::parse(&candidate)
        .map_err(|e| Error::with_source(ErrorKind::InvalidUrl(format!("{}: {}", domain, e)), e))?;

    if url.host_str().map_or(true, str::is_empty) {
        return Err(Error::new(ErrorKind::InvalidUrl(format!(
            "{}: missing host",
            domain
        ))));
    }
    Ok(url)
}

/// Join an endpoint path onto the base URL, keeping any base path prefix.
pub fn endpoint_url(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    let prefix = base.path().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    url.set_path(&format!("{}/{}", prefix, path));
    url.set_query(None);
    url.set_fragment(None);
    url
}

/// Builder for one API request.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) params: QueryParams,
    pub(crate) body: Option<Bytes>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) timeout: Option<Duration>,
}

impl RequestBuilder {
    /// Create a new request builder for an endpoint path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: QueryParams::new(),
            body: None,
            headers: Vec::new(),
            timeout: None,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Replace all parameters.
    pub fn params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    /// Add one parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.params.insert(key, value);
        self
    }

    /// Set a raw body (bearer scheme only).
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a JSON body (bearer scheme only).
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Some(Bytes::from(serde_json::to_vec(body)?));
        Ok(self.header(CONTENT_TYPE.as_str(), APPLICATION_JSON))
    }

    /// Add a header. Takes precedence over the configured defaults.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Deadline for this request, passed through to the transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the request, signing legacy requests with the current local time.
    pub fn build(self, base: &Url, scheme: &AuthScheme, defaults: &HeaderMap) -> Result<SignedRequest> {
        self.build_at(base, scheme, defaults, &Local::now())
    }

    /// Build the request with an explicit signing time.
    pub fn build_at<Tz: TimeZone>(
        self,
        base: &Url,
        scheme: &AuthScheme,
        defaults: &HeaderMap,
        at: &DateTime<Tz>,
    ) -> Result<SignedRequest>
    where
        Tz::Offset: std::fmt::Display,
    {
        match scheme {
            AuthScheme::Legacy(signer) => self.build_legacy(base, signer, at),
            AuthScheme::Bearer(token) => self.build_bearer(base, token, defaults),
        }
    }

    fn build_legacy<Tz: TimeZone>(self, base: &Url, signer: &Signer, at: &DateTime<Tz>) -> Result<SignedRequest>
    where
        Tz::Offset: std::fmt::Display,
    {
        if self.body.is_some() {
            return Err(Error::new(ErrorKind::Config(
                "legacy requests carry their parameters as the body; raw bodies are not supported"
                    .to_string(),
            )));
        }

        let mut url = endpoint_url(base, &self.path);
        let encoded = self.params.to_form().to_urlencoded()?;

        let body = if self.method == Method::GET {
            if !encoded.is_empty() {
                url.set_query(Some(&encoded));
            }
            None
        } else {
            Some(Bytes::from(encoded))
        };

        let signature = signer.sign(&self.method, &url, at);

        let mut headers = HeaderMap::new();
        headers.insert(DATE, HeaderValue::from_str(&signature.date)?);
        headers.insert(
            HeaderName::from_static("x-authorization"),
            HeaderValue::from_str(&signature.authorization)?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(SIGNED_CONTENT_TYPE));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));
        apply_headers(&mut headers, &self.headers)?;

        Ok(SignedRequest {
            method: self.method,
            url,
            headers,
            body,
            timeout: self.timeout,
        })
    }

    fn build_bearer(self, base: &Url, token: &BearerToken, defaults: &HeaderMap) -> Result<SignedRequest> {
        let mut url = endpoint_url(base, &self.path);
        if !self.params.is_empty() {
            url.set_query(Some(&self.params.query_escape()?));
        }

        let mut headers = defaults.clone();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token.as_str()))?,
        );
        apply_headers(&mut headers, &self.headers)?;
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        }

        Ok(SignedRequest {
            method: self.method,
            url,
            headers,
            body: self.body,
            timeout: self.timeout,
        })
    }
}

fn apply_headers(headers: &mut HeaderMap, extra: &[(String, String)]) -> Result<()> {
    for (name, value) in extra {
        headers.insert(
            HeaderName::from_bytes(name.as_bytes())?,
            HeaderValue::from_str(value)?,
        );
    }
    Ok(())
}

/// A fully built request, ready for the transport.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub(crate) method: Method,
    pub(crate) url: Url,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<Bytes>,
    pub(crate) timeout: Option<Duration>,
}

impl SignedRequest {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a header value as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn into_reqwest(self, client: &reqwest::Client) -> reqwest::RequestBuilder {
        let mut req = client.request(self.method, self.url).headers(self.headers);
        if let Some(body) = self.body {
            req = req.body(body);
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        req
    }
}
