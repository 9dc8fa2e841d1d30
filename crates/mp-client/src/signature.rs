//! Request signing for the legacy (v1) API.
//!
//! Every legacy request carries a `Date` header and an `X-Authorization`
//! header computed from the method, that date and the scheme-less request
//! URL:
//!
//! ```text
//! METHOD\n\napplication/x-www-form-urlencoded\n<date>\n<host/path?query>
//! ```
//!
//! The string is signed with HMAC-SHA1 keyed by the secret key. The server
//! expects the **hex** digest to be base64-encoded again, so the header is
//! `<access id>:<base64(hex(hmac))>`.

use base64::Engine;
use chrono::{DateTime, TimeZone};
use hmac::{Hmac, Mac};
use reqwest::Method;
use sha1::Sha1;
use url::Url;

use crate::error::{Error, ErrorKind, Result};

type HmacSha1 = Hmac<Sha1>;

/// `Mon, 02 Jan 2006 15:04:05 -0700`.
pub const RFC2822: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Content type bound into every canonical string.
pub const SIGNED_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Format a timestamp the way the `Date` header and the canonical string expect.
pub fn format_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(RFC2822).to_string()
}

/// The URL with its `<scheme>://` prefix removed.
pub fn scheme_less_url(url: &Url) -> &str {
    let full = url.as_str();
    full.strip_prefix(url.scheme())
        .and_then(|rest| rest.strip_prefix("://"))
        .unwrap_or(full)
}

/// The exact byte sequence that gets signed.
pub fn canonical_string(method: &Method, date: &str, url: &Url) -> String {
    format!(
        "{}\n\n{}\n{}\n{}",
        method.as_str(),
        SIGNED_CONTENT_TYPE,
        date,
        scheme_less_url(url)
    )
}

/// Signing key pair of the legacy API.
///
/// The secret key is redacted in Debug output.
#[derive(Clone)]
pub struct Signer {
    access_id: String,
    secret_key: Vec<u8>,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("access_id", &self.access_id)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

/// Headers produced by signing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Value of the `Date` header.
    pub date: String,
    /// Value of the `X-Authorization` header.
    pub authorization: String,
}

impl Signer {
    /// Create a signer. Both the access id and the secret key must be non-empty.
    pub fn new(access_id: impl Into<String>, secret_key: impl Into<Vec<u8>>) -> Result<Self> {
        let access_id = access_id.into();
        let secret_key = secret_key.into();
        if access_id.is_empty() {
            return Err(Error::new(ErrorKind::Config(
                "legacy scheme requires an access id".to_string(),
            )));
        }
        if secret_key.is_empty() {
            return Err(Error::new(ErrorKind::Config(
                "legacy scheme requires a secret key".to_string(),
            )));
        }
        Ok(Self {
            access_id,
            secret_key,
        })
    }

    pub fn access_id(&self) -> &str {
        &self.access_id
    }

    /// `base64(hex(hmac_sha1(secret, canonical)))`.
    pub fn digest(&self, canonical: &str) -> String {
        let mut mac = match HmacSha1::new_from_slice(&self.secret_key) {
            Ok(mac) => mac,
            Err(_) => unreachable!("HMAC-SHA1 accepts keys of any length"),
        };
        mac.update(canonical.as_bytes());
        let hex_digest = hex::encode(mac.finalize().into_bytes());
        base64::engine::general_purpose::STANDARD.encode(hex_digest)
    }

    /// Sign a request for the given URL at the given time.
    pub fn sign<Tz: TimeZone>(&self, method: &Method, url: &Url, at: &DateTime<Tz>) -> Signature
    where
        Tz::Offset: std::fmt::Display,
    {
        let date = format_date(at);
        let canonical = canonical_string(method, &date, url);
        Signature {
            authorization: format!("{}:{}", self.access_id, self.digest(&canonical)),
            date,
        }
    }
}
