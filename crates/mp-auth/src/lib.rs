//! # megaplan-auth
//!
//! Credentials for the Megaplan API.
//!
//! ## Security
//!
//! - Secret keys, tokens and passwords are redacted in Debug output
//! - Tracing spans skip passwords, password hashes and one-time keys
//!
//! ## Supported Authentication Methods
//!
//! - **Bearer token** - static token of the current (v3) API
//! - **Legacy access id + secret key** - HMAC-signed requests of the v1 API,
//!   obtained with the login exchange
//!
//! ## Example
//!
//! ```rust,ignore
//! use megaplan_auth::{BearerCredentials, Credentials, LoginExchange};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), megaplan_auth::Error> {
//!     // From environment variables
//!     let client = BearerCredentials::from_env()?.client()?;
//!
//!     // Legacy credentials from a login and password
//!     let creds = LoginExchange::new("company.megaplan.ru")?
//!         .login("ivanov", "password")
//!         .await?;
//!     let legacy_client = creds.client()?;
//!
//!     Ok(())
//! }
//! ```

mod credentials;
mod error;
mod login;

pub use credentials::{
    BearerCredentials, Credentials, LegacyCredentials, ENV_ACCESS_ID, ENV_DOMAIN, ENV_SECRET_KEY,
    ENV_TOKEN,
};
pub use error::{Error, ErrorKind, Result};
pub use login::{md5_password, Authorization, LoginExchange, AUTHORIZE_PATH, ONE_TIME_KEY_PATH};
