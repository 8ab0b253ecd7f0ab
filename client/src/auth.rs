//! Request signing for the OKX Web3 API.
//!
//! Every authenticated request carries four headers. `OK-ACCESS-SIGN` is the
//! base64 HMAC-SHA256 of `timestamp + method + requestPath + body`, keyed by
//! the API secret. GET requests always sign an empty body.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

// Header names are case-insensitive on the wire; `http` stores them lowercase.
pub const HEADER_ACCESS_KEY: HeaderName = HeaderName::from_static("ok-access-key");
pub const HEADER_ACCESS_SIGN: HeaderName = HeaderName::from_static("ok-access-sign");
pub const HEADER_ACCESS_PASSPHRASE: HeaderName =
    HeaderName::from_static("ok-access-passphrase");
pub const HEADER_ACCESS_TIMESTAMP: HeaderName =
    HeaderName::from_static("ok-access-timestamp");

/// Current UTC time as ISO-8601 with millisecond precision, e.g. `2024-01-01T00:00:00.000Z`.
pub fn timestamp_now() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Compute the `OK-ACCESS-SIGN` value.
///
/// `method` is concatenated exactly as passed; only the GET check is
/// case-insensitive. `request_path` must include the query string.
pub fn sign(
    secret_key: &str,
    timestamp: &str,
    method: &str,
    request_path: &str,
    body: &str,
) -> String {
    let body = if method.eq_ignore_ascii_case("GET") { "" } else { body };

    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(timestamp.as_bytes());
    mac.update(method.as_bytes());
    mac.update(request_path.as_bytes());
    mac.update(body.as_bytes());

    BASE64.encode(mac.finalize().into_bytes())
}

/// API credentials. Never mutated after construction.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    secret_key: String,
    passphrase: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret_key", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(api_key: &str, secret_key: &str, passphrase: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            secret_key: secret_key.to_string(),
            passphrase: passphrase.to_string(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Sign a request with a freshly generated timestamp.
    pub fn sign_request(&self, method: &str, request_path: &str, body: &str) -> AuthHeaders {
        self.sign_request_at(&timestamp_now(), method, request_path, body)
    }

    pub fn sign_request_at(
        &self,
        timestamp: &str,
        method: &str,
        request_path: &str,
        body: &str,
    ) -> AuthHeaders {
        AuthHeaders {
            key: self.api_key.clone(),
            sign: sign(&self.secret_key, timestamp, method, request_path, body),
            passphrase: self.passphrase.clone(),
            timestamp: timestamp.to_string(),
        }
    }
}

/// The four `OK-ACCESS-*` header values for one request.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    pub key: String,
    pub sign: String,
    pub passphrase: String,
    pub timestamp: String,
}

impl std::fmt::Debug for AuthHeaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthHeaders")
            .field("key", &self.key)
            .field("sign", &self.sign)
            .field("passphrase", &"<redacted>")
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

impl TryFrom<AuthHeaders> for HeaderMap {
    type Error = InvalidHeaderValue;

    fn try_from(auth: AuthHeaders) -> Result<Self, Self::Error> {
        let mut headers = HeaderMap::with_capacity(4);
        headers.insert(HEADER_ACCESS_KEY, HeaderValue::from_str(&auth.key)?);
        headers.insert(HEADER_ACCESS_SIGN, HeaderValue::from_str(&auth.sign)?);
        let mut passphrase = HeaderValue::from_str(&auth.passphrase)?;
        passphrase.set_sensitive(true);
        headers.insert(HEADER_ACCESS_PASSPHRASE, passphrase);
        headers.insert(HEADER_ACCESS_TIMESTAMP, HeaderValue::from_str(&auth.timestamp)?);
        Ok(headers)
    }
}
