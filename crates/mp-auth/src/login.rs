//! Login exchange of the legacy API.
//!
//! A user's login and password are traded for legacy credentials in two
//! form-encoded POSTs:
//!
//! 1. `createOneTimeKeyAuth.api` with `Login` and the md5 of the password
//!    returns a one-time key;
//! 2. `authorize.api` with the same fields plus `OneTimeKey` returns the
//!    access id and secret key.
//!
//! Both requests are unsigned and go through the raw-send path of the client.

use md5::{Digest, Md5};
use megaplan_client::{
    endpoint_url, parse_base_url, parse_legacy, ClientConfig, LegacyEnvelope, Method, MpHttpClient,
    QueryParams,
};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::credentials::LegacyCredentials;
use crate::error::{Error, ErrorKind, Result};

pub const ONE_TIME_KEY_PATH: &str = "/BumsCommonApiV01/User/createOneTimeKeyAuth.api";
pub const AUTHORIZE_PATH: &str = "/BumsCommonApiV01/User/authorize.api";

/// Lowercase hex md5 of the password, the form the login endpoints expect.
pub fn md5_password(password: &str) -> String {
    hex::encode(Md5::digest(password.as_bytes()))
}

#[derive(Debug, Default, Deserialize)]
struct OneTimeKeyData {
    #[serde(rename = "OneTimeKey", default)]
    one_time_key: String,
}

/// Successful answer of `authorize.api`.
#[derive(Clone, Default, Deserialize)]
pub struct Authorization {
    #[serde(rename = "AccessId", default)]
    pub access_id: String,
    #[serde(rename = "SecretKey", default)]
    pub secret_key: String,
    #[serde(rename = "UserId", default)]
    pub user_id: Option<i64>,
    #[serde(rename = "EmployeeId", default)]
    pub employee_id: Option<i64>,
    #[serde(rename = "ContractorId", default)]
    pub contractor_id: Option<String>,
}

impl std::fmt::Debug for Authorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorization")
            .field("access_id", &self.access_id)
            .field("secret_key", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("employee_id", &self.employee_id)
            .field("contractor_id", &self.contractor_id)
            .finish()
    }
}

/// The login endpoints answer failures with `"data": []`; anything but an
/// object yields the default.
fn data_object<T: DeserializeOwned + Default>(data: Value) -> Result<T> {
    match data {
        Value::Object(_) => Ok(serde_json::from_value(data)?),
        _ => Ok(T::default()),
    }
}

/// Client for the login exchange.
#[derive(Debug, Clone)]
pub struct LoginExchange {
    http: MpHttpClient,
    domain: String,
    base: Url,
}

impl LoginExchange {
    /// Create a login client for a domain with the default configuration.
    pub fn new(domain: &str) -> Result<Self> {
        Self::with_config(domain, ClientConfig::default())
    }

    pub fn with_config(domain: &str, config: ClientConfig) -> Result<Self> {
        Self::with_http_client(domain, MpHttpClient::new(config)?)
    }

    pub fn with_http_client(domain: &str, http: MpHttpClient) -> Result<Self> {
        Ok(Self {
            http,
            domain: domain.to_string(),
            base: parse_base_url(domain)?,
        })
    }

    async fn post_form(&self, path: &str, form: QueryParams) -> Result<LegacyEnvelope<Value>> {
        let body = form.to_form().to_urlencoded()?;
        let request = self
            .http
            .request(Method::POST, endpoint_url(&self.base, path))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body);
        let response = self.http.send_raw(request).await?;
        Ok(parse_legacy(response)?)
    }

    /// Request a one-time key. `password_md5` is the output of [`md5_password`].
    #[instrument(skip(self, password_md5))]
    pub async fn one_time_key(&self, login: &str, password_md5: &str) -> Result<String> {
        let envelope = self
            .post_form(
                ONE_TIME_KEY_PATH,
                QueryParams::new()
                    .with("Login", login)
                    .with("Password", password_md5),
            )
            .await?;

        let data: OneTimeKeyData = data_object(envelope.data)?;
        if data.one_time_key.is_empty() {
            return Err(Error::new(ErrorKind::Authentication(format!(
                "invalid login or password ({})",
                envelope.status.message
            ))));
        }
        Ok(data.one_time_key)
    }

    /// Trade a one-time key for an access id and secret key.
    #[instrument(skip(self, password_md5, one_time_key))]
    pub async fn authorize(
        &self,
        login: &str,
        password_md5: &str,
        one_time_key: &str,
    ) -> Result<Authorization> {
        let envelope = self
            .post_form(
                AUTHORIZE_PATH,
                QueryParams::new()
                    .with("Login", login)
                    .with("Password", password_md5)
                    .with("OneTimeKey", one_time_key),
            )
            .await?;

        let auth: Authorization = data_object(envelope.data)?;
        if auth.access_id.is_empty() || auth.secret_key.is_empty() {
            return Err(Error::new(ErrorKind::Authentication(format!(
                "invalid login or password, no access token issued ({})",
                envelope.status.message
            ))));
        }
        Ok(auth)
    }

    /// Full exchange: hash the password, fetch a one-time key, authorize.
    #[instrument(skip(self, password))]
    pub async fn login(&self, login: &str, password: &str) -> Result<LegacyCredentials> {
        let password_md5 = md5_password(password);
        let one_time_key = self.one_time_key(login, &password_md5).await?;
        let auth = self.authorize(login, &password_md5, &one_time_key).await?;

        debug!(user_id = ?auth.user_id, employee_id = ?auth.employee_id, "Login exchange completed");

        let mut creds = LegacyCredentials::new(self.domain.as_str(), auth.access_id, auth.secret_key);
        if let Some(user_id) = auth.user_id {
            creds = creds.with_user_id(user_id);
        }
        if let Some(employee_id) = auth.employee_id {
            creds = creds.with_employee_id(employee_id);
        }
        Ok(creds)
    }
}
