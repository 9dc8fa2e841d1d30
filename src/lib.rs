//! # megaplan-api
//!
//! A Megaplan API client library for Rust.
//!
//! Both API generations are supported: the legacy v1 API with HMAC-signed
//! requests and the current v3 API with bearer tokens. Responses are decoded
//! into a typed envelope with pagination and field errors.
//!
//! ## Security
//!
//! - Secret keys and tokens are redacted in Debug output
//! - Tracing spans skip credentials, passwords and request bodies
//!
//! ## Crates
//!
//! - **megaplan-client** - Parameter encoding, request signing, transport, envelope decoding
//! - **megaplan-auth** - Credentials, environment loading, legacy login exchange
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use megaplan_api::{BearerCredentials, Credentials, Envelope, QueryParams};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BearerCredentials::from_env()?.client()?;
//!
//!     let tasks: Envelope<Vec<serde_json::Value>> = client
//!         .get_json("/api/v3/task", QueryParams::new().with("limit", 10))
//!         .await?;
//!
//!     for task in &tasks.data {
//!         println!("{}", task["name"]);
//!     }
//!     if tasks.next() {
//!         println!("more tasks available");
//!     }
//!
//!     Ok(())
//! }
//! ```

#[cfg(feature = "auth")]
pub use megaplan_auth as auth;
#[cfg(feature = "client")]
pub use megaplan_client as client;

#[cfg(feature = "auth")]
pub use megaplan_auth::{BearerCredentials, Credentials, LegacyCredentials, LoginExchange};
#[cfg(feature = "client")]
pub use megaplan_client::{
    AuthScheme, ClientConfig, Envelope, MegaplanClient, Pagination, QueryParams, QueryValue,
};
