//! Credentials for both API generations.
//!
//! All credential types implement custom Debug to redact secrets.

use megaplan_client::{AuthScheme, ClientConfig, MegaplanClient};

use crate::error::{Error, ErrorKind, Result};

pub const ENV_DOMAIN: &str = "MEGAPLAN_DOMAIN";
pub const ENV_TOKEN: &str = "MEGAPLAN_TOKEN";
pub const ENV_ACCESS_ID: &str = "MEGAPLAN_ACCESS_ID";
pub const ENV_SECRET_KEY: &str = "MEGAPLAN_SECRET_KEY";

/// Trait for Megaplan credentials.
pub trait Credentials: Send + Sync {
    /// Account domain, e.g. `company.megaplan.ru`.
    fn domain(&self) -> &str;

    /// The authentication scheme these credentials select.
    fn scheme(&self) -> Result<AuthScheme>;

    /// Returns true if the credentials appear to be valid (non-empty).
    fn is_valid(&self) -> bool;

    /// Build a client for these credentials.
    fn client_with_config(&self, config: ClientConfig) -> Result<MegaplanClient> {
        Ok(MegaplanClient::with_config(
            self.domain(),
            self.scheme()?,
            config,
        )?)
    }

    /// Build a client with the default configuration.
    fn client(&self) -> Result<MegaplanClient> {
        self.client_with_config(ClientConfig::default())
    }
}

fn required_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::new(ErrorKind::EnvVar(name.to_string()))),
    }
}

/// Access id and secret key of the legacy API, as issued by the login
/// exchange.
#[derive(Clone)]
pub struct LegacyCredentials {
    domain: String,
    access_id: String,
    secret_key: String,
    user_id: Option<i64>,
    employee_id: Option<i64>,
}

impl std::fmt::Debug for LegacyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegacyCredentials")
            .field("domain", &self.domain)
            .field("access_id", &self.access_id)
            .field("secret_key", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("employee_id", &self.employee_id)
            .finish()
    }
}

impl LegacyCredentials {
    pub fn new(
        domain: impl Into<String>,
        access_id: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            access_id: access_id.into(),
            secret_key: secret_key.into(),
            user_id: None,
            employee_id: None,
        }
    }

    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_employee_id(mut self, employee_id: i64) -> Self {
        self.employee_id = Some(employee_id);
        self
    }

    pub fn access_id(&self) -> &str {
        &self.access_id
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }

    pub fn employee_id(&self) -> Option<i64> {
        self.employee_id
    }

    /// Load credentials from environment variables.
    ///
    /// Required: `MEGAPLAN_DOMAIN`, `MEGAPLAN_ACCESS_ID`, `MEGAPLAN_SECRET_KEY`.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(
            required_env(ENV_DOMAIN)?,
            required_env(ENV_ACCESS_ID)?,
            required_env(ENV_SECRET_KEY)?,
        ))
    }
}

impl Credentials for LegacyCredentials {
    fn domain(&self) -> &str {
        &self.domain
    }

    fn scheme(&self) -> Result<AuthScheme> {
        if !self.is_valid() {
            return Err(Error::new(ErrorKind::InvalidCredentials(
                "legacy credentials need a domain, an access id and a secret key".to_string(),
            )));
        }
        Ok(AuthScheme::legacy(
            self.access_id.as_str(),
            self.secret_key.as_bytes(),
        )?)
    }

    fn is_valid(&self) -> bool {
        !self.domain.is_empty() && !self.access_id.is_empty() && !self.secret_key.is_empty()
    }
}

/// Static token of the current API.
#[derive(Clone)]
pub struct BearerCredentials {
    domain: String,
    token: String,
}

impl std::fmt::Debug for BearerCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerCredentials")
            .field("domain", &self.domain)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl BearerCredentials {
    pub fn new(domain: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Set a new token (e.g., after the old one was revoked).
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = token.into();
    }

    /// Load credentials from environment variables.
    ///
    /// Required: `MEGAPLAN_DOMAIN`, `MEGAPLAN_TOKEN`.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(required_env(ENV_DOMAIN)?, required_env(ENV_TOKEN)?))
    }
}

impl Credentials for BearerCredentials {
    fn domain(&self) -> &str {
        &self.domain
    }

    fn scheme(&self) -> Result<AuthScheme> {
        if !self.is_valid() {
            return Err(Error::new(ErrorKind::InvalidCredentials(
                "bearer credentials need a domain and a token".to_string(),
            )));
        }
        Ok(AuthScheme::bearer(self.token.as_str())?)
    }

    fn is_valid(&self) -> bool {
        !self.domain.is_empty() && !self.token.is_empty()
    }
}
