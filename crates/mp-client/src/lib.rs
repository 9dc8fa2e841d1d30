//! # megaplan-client
//!
//! Core HTTP client infrastructure for the Megaplan API.
//!
//! This crate provides:
//! - Typed request parameters with form and JSON encodings
//! - HMAC-SHA1 request signing for the legacy (v1) API
//! - Bearer-token requests for the current (v3) API
//! - Tolerant envelope decoding: gzip, pagination shapes, field errors
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   MegaplanClient                            │
//! │  - Base URL + AuthScheme (legacy signer or bearer token)    │
//! │  - Typed helpers (get_json, post_json, legacy_get, upload)  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!              RequestBuilder  │  ResponseDecoder
//!      (QueryParams, Signer)   │  (RawResponse → Envelope<T>)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    MpHttpClient                             │
//! │  - reqwest client built from ClientConfig                   │
//! │  - Default headers, raw send                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use megaplan_client::{AuthScheme, Envelope, MegaplanClient, QueryParams};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), megaplan_client::Error> {
//!     let client = MegaplanClient::new("company.megaplan.ru", AuthScheme::bearer("token")?)?;
//!
//!     let tasks: Envelope<serde_json::Value> = client
//!         .get_json("/api/v3/task", QueryParams::new().with("limit", 10))
//!         .await?;
//!     println!("more pages: {}", tasks.next());
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
pub mod entity;
mod error;
mod megaplan_client;
pub mod query;
mod request;
pub mod response;
pub mod signature;

pub use client::MpHttpClient;
pub use config::{ClientConfig, ClientConfigBuilder, X_USER_ID};
pub use entity::{
    build_query_params, date_interval, date_only, date_time, entity_ref, set_entity_array,
    set_entity_field, set_raw_field, DateOnly, FieldSetter,
};
pub use error::{Error, ErrorKind, Result};
pub use megaplan_client::{MegaplanClient, FILE_UPLOAD_FIELD, FILE_UPLOAD_PATH};
pub use query::{Encoding, FormEncoded, QueryParams, QueryValue};
pub use request::{
    endpoint_url, parse_base_url, AuthScheme, BearerToken, RequestBuilder, SignedRequest,
    X_AUTHORIZATION,
};
pub use response::{
    decode_envelope, decode_legacy, parse_envelope, parse_legacy, ApiErrors, ApiFieldError,
    Envelope, LegacyEnvelope, LegacyStatus, Meta, Pagination, RawResponse,
};
pub use signature::Signer;

pub use reqwest::Method;

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("megaplan-api/", env!("CARGO_PKG_VERSION"));
