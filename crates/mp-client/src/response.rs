//! Response decoding.
//!
//! Every current-API response is wrapped in the same envelope:
//!
//! ```json
//! { "data": ..., "meta": { "status": 200, "errors": [], "pagination": {...} } }
//! ```
//!
//! Decoding goes through the same steps for every call:
//!
//! 1. gzip bodies are decompressed in place ([`RawResponse::decompress`]);
//! 2. bodies that are not `application/json` (maintenance pages, gateway
//!    errors) become an error carrying the text verbatim;
//! 3. the envelope is parsed with arbitrary-precision numbers;
//! 4. `meta.pagination` is normalized, the server sends `[]` when a list
//!    is not paginated;
//! 5. non-empty `meta.errors` become a single [`ErrorKind::Api`] error
//!    ([`decode_envelope`] only; [`parse_envelope`] leaves them to the caller).

use std::fmt;
use std::io::Read;

use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::{self, DeserializeOwned, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, ErrorKind, Result};
use crate::request::APPLICATION_JSON;

/// A fully buffered HTTP response.
///
/// The transport response is consumed when this is created, so the
/// connection is released whatever happens during decoding.
#[derive(Debug, Clone)]
pub struct RawResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    uncompressed: bool,
}

impl RawResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            uncompressed: false,
        }
    }

    /// Buffer a transport response.
    pub(crate) async fn from_reqwest(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(Self::new(status, headers, body))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE.as_str())
    }

    pub fn content_encoding(&self) -> Option<&str> {
        self.header(CONTENT_ENCODING.as_str())
    }

    /// True once the body has been decompressed by [`Self::decompress`].
    pub fn is_uncompressed(&self) -> bool {
        self.uncompressed
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decompress a gzip body in place.
    ///
    /// No-op when there is no `Content-Encoding` or the body was already
    /// decompressed. Any encoding other than gzip yields
    /// [`ErrorKind::UnknownCompression`] and leaves the response untouched.
    pub fn decompress(&mut self) -> Result<()> {
        if self.uncompressed {
            return Ok(());
        }

        let encoding = match self.content_encoding().map(str::trim) {
            None | Some("") => return Ok(()),
            Some(encoding) => encoding.to_string(),
        };

        if !encoding.eq_ignore_ascii_case("gzip") {
            return Err(Error::new(ErrorKind::UnknownCompression {
                encoding,
                body: self.body.clone(),
            }));
        }

        let mut decoder = flate2::read::GzDecoder::new(self.body.as_ref());
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed).map_err(|e| {
            Error::with_source(ErrorKind::Decompression(format!("gzip: {}", e)), e)
        })?;

        debug!(
            compressed = self.body.len(),
            decompressed = decompressed.len(),
            "Decompressed gzip response"
        );

        self.body = Bytes::from(decompressed);
        self.headers.remove(CONTENT_ENCODING);
        self.headers.remove(CONTENT_LENGTH);
        self.uncompressed = true;
        Ok(())
    }

    /// Decompress and check the content type, returning the JSON body.
    fn into_json_body(mut self) -> Result<Bytes> {
        self.decompress()?;

        let is_json = self
            .content_type()
            .is_some_and(|ct| ct.contains(APPLICATION_JSON));
        if !is_json {
            return Err(Error::new(ErrorKind::UnexpectedContent {
                content_type: self.content_type().map(str::to_string),
                body: self.text(),
            }));
        }

        Ok(self.body)
    }
}

/// Pagination counters from `meta.pagination`.
///
/// The server sends either an object with these counters or `[]` when the
/// result is not paginated; both decode into this type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub count: i64,
    pub limit: i64,
    pub current_page: i64,
    pub has_more_next: bool,
    pub has_more_prev: bool,
}

impl Pagination {
    /// There is a next page.
    pub fn next(&self) -> bool {
        self.has_more_next
    }

    /// There is a previous page.
    pub fn prev(&self) -> bool {
        self.has_more_prev
    }
}

impl<'de> Deserialize<'de> for Pagination {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(PaginationVisitor)
    }
}

struct PaginationVisitor;

impl<'de> Visitor<'de> for PaginationVisitor {
    type Value = Pagination;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a pagination object or an empty array")
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Pagination, E> {
        Ok(Pagination::default())
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Pagination, E> {
        Ok(Pagination::default())
    }

    // `[]` means "no pagination". Elements of a non-empty array carry no
    // counters either and are skipped.
    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Pagination, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Pagination::default())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Pagination, A::Error> {
        let mut pagination = Pagination::default();
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "count" => pagination.count = map.next_value()?,
                "limit" => pagination.limit = map.next_value()?,
                "currentPage" => pagination.current_page = map.next_value()?,
                "hasMoreNext" => pagination.has_more_next = map.next_value()?,
                "hasMorePrev" => pagination.has_more_prev = map.next_value()?,
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(pagination)
    }
}

/// One entry of `meta.errors`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiFieldError {
    #[serde(default)]
    pub field: Value,
    #[serde(default)]
    pub message: Value,
}

impl ApiFieldError {
    pub fn new(field: impl Into<Value>, message: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Strings print bare, anything else as compact JSON.
fn write_value(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::String(s) => f.write_str(s),
        other => write!(f, "{}", other),
    }
}

impl fmt::Display for ApiFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FIELD: ")?;
        write_value(f, &self.field)?;
        f.write_str(" MESSAGE: ")?;
        write_value(f, &self.message)
    }
}

/// Non-empty list of field errors, displayed one per line in server order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiErrors(Vec<ApiFieldError>);

impl ApiErrors {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ApiFieldError> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<ApiFieldError> {
        self.0
    }
}

impl From<Vec<ApiFieldError>> for ApiErrors {
    fn from(errors: Vec<ApiFieldError>) -> Self {
        Self(errors)
    }
}

impl fmt::Display for ApiErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The `meta` object of the envelope.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Meta {
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<ApiFieldError>,
    #[serde(default)]
    pub pagination: Pagination,
}

impl Meta {
    /// The aggregated field errors, or `None` if the server reported none.
    pub fn error(&self) -> Option<Error> {
        if self.errors.is_empty() {
            return None;
        }
        Some(Error::new(ErrorKind::Api(ApiErrors(self.errors.clone()))))
    }
}

/// A decoded response: payload plus metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub meta: Meta,
    pub data: T,
}

impl<T> Envelope<T> {
    /// There is a next page.
    pub fn next(&self) -> bool {
        self.meta.pagination.next()
    }

    /// There is a previous page.
    pub fn prev(&self) -> bool {
        self.meta.pagination.prev()
    }

    pub fn pagination(&self) -> &Pagination {
        &self.meta.pagination
    }

    pub fn into_data(self) -> T {
        self.data
    }
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    meta: Meta,
    #[serde(default)]
    data: Value,
}

fn read_envelope(response: RawResponse) -> Result<RawEnvelope> {
    let body = response.into_json_body()?;
    Ok(serde_json::from_slice(&body)?)
}

/// Decode an envelope and fail with [`ErrorKind::Api`] if `meta.errors` is
/// non-empty.
///
/// Field errors are checked before `data` is converted to `T`, so a rejected
/// request reports the server's reason rather than a payload mismatch.
pub fn decode_envelope<T: DeserializeOwned>(response: RawResponse) -> Result<Envelope<T>> {
    let raw = read_envelope(response)?;
    if let Some(err) = raw.meta.error() {
        return Err(err);
    }
    Ok(Envelope {
        data: serde_json::from_value(raw.data)?,
        meta: raw.meta,
    })
}

/// Decode an envelope without turning `meta.errors` into an error.
pub fn parse_envelope<T: DeserializeOwned>(response: RawResponse) -> Result<Envelope<T>> {
    let raw = read_envelope(response)?;
    Ok(Envelope {
        data: serde_json::from_value(raw.data)?,
        meta: raw.meta,
    })
}

/// `status` object of legacy API responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LegacyStatus {
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
}

impl LegacyStatus {
    pub fn is_ok(&self) -> bool {
        self.code == "ok"
    }
}

/// Legacy API response: `{"status": {"code", "message"}, "data": ...}`.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyEnvelope<T> {
    pub status: LegacyStatus,
    pub data: T,
}

#[derive(Deserialize)]
struct RawLegacyEnvelope {
    #[serde(default)]
    status: LegacyStatus,
    #[serde(default)]
    data: Value,
}

/// Decode a legacy response without checking its status.
pub fn parse_legacy<T: DeserializeOwned>(response: RawResponse) -> Result<LegacyEnvelope<T>> {
    let body = response.into_json_body()?;
    let raw: RawLegacyEnvelope = serde_json::from_slice(&body)?;
    Ok(LegacyEnvelope {
        data: serde_json::from_value(raw.data)?,
        status: raw.status,
    })
}

/// Decode a legacy response, failing with [`ErrorKind::LegacyStatus`] unless
/// the status code is `ok`.
pub fn decode_legacy<T: DeserializeOwned>(response: RawResponse) -> Result<LegacyEnvelope<T>> {
    let body = response.into_json_body()?;
    let raw: RawLegacyEnvelope = serde_json::from_slice(&body)?;
    if !raw.status.is_ok() {
        return Err(Error::new(ErrorKind::LegacyStatus {
            code: raw.status.code,
            message: raw.status.message,
        }));
    }
    Ok(LegacyEnvelope {
        data: serde_json::from_value(raw.data)?,
        status: raw.status,
    })
}
