//! Error types for megaplan-client.

use bytes::Bytes;

use crate::response::ApiErrors;

/// Result type alias for megaplan-client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for megaplan-client operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if the server rejected the request through `meta.errors`.
    pub fn is_api_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Api(_))
    }

    /// Returns true if the response used a `Content-Encoding` this crate cannot decode.
    pub fn is_unknown_compression(&self) -> bool {
        matches!(self.kind, ErrorKind::UnknownCompression { .. })
    }

    /// Field-level errors reported by the server, if this is an API error.
    pub fn api_errors(&self) -> Option<&ApiErrors> {
        match &self.kind {
            ErrorKind::Api(errors) => Some(errors),
            _ => None,
        }
    }

    /// The still-compressed body of a response with an unsupported encoding,
    /// so the caller can apply its own decoder.
    pub fn compressed_body(&self) -> Option<&Bytes> {
        match &self.kind {
            ErrorKind::UnknownCompression { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Request timeout.
    #[error("Request timeout")]
    Timeout,

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Any other transport failure.
    #[error("HTTP error: {0}")]
    Transport(String),

    /// Base domain or request path does not form a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid configuration or misuse of a scheme-specific operation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Parameters or body could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// JSON deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// The response was not `application/json`. The body is kept verbatim.
    #[error("{body}")]
    UnexpectedContent {
        content_type: Option<String>,
        body: String,
    },

    /// `Content-Encoding` other than gzip. The original body is kept.
    #[error("unknown compression method")]
    UnknownCompression { encoding: String, body: Bytes },

    /// Gzip stream could not be decoded.
    #[error("Decompression error: {0}")]
    Decompression(String),

    /// Field-level errors returned in `meta.errors`.
    #[error("{0}")]
    Api(ApiErrors),

    /// Legacy API answered with a status code other than `ok`.
    #[error("Megaplan API status {code}: {message}")]
    LegacyStatus { code: String, message: String },
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_connect() {
            ErrorKind::Connection(err.to_string())
        } else if err.is_builder() {
            ErrorKind::Config(err.to_string())
        } else {
            ErrorKind::Transport(err.to_string())
        };

        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<serde_urlencoded::ser::Error> for Error {
    fn from(err: serde_urlencoded::ser::Error) -> Self {
        Error::with_source(ErrorKind::Serialization(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::InvalidUrl(err.to_string()), err)
    }
}

impl From<reqwest::header::InvalidHeaderValue> for Error {
    fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
        Error::with_source(
            ErrorKind::Config(format!("Invalid header value: {}", err)),
            err,
        )
    }
}

impl From<reqwest::header::InvalidHeaderName> for Error {
    fn from(err: reqwest::header::InvalidHeaderName) -> Self {
        Error::with_source(
            ErrorKind::Config(format!("Invalid header name: {}", err)),
            err,
        )
    }
}
