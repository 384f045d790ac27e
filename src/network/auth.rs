//! Bearer token acquisition and caching.
//!
//! One token is cached per [`AuthTokenCache`]. It is reused while its `exp`
//! claim lies strictly beyond now plus the refresh buffer; otherwise a new
//! login is performed. The check-then-refresh sequence runs under an async
//! mutex, so concurrent callers share a single in-flight login.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::balancer::DEFAULT_REQUEST_TIMEOUT;
use super::endpoint::HttpMethod;
use super::transport::{HttpRequest, HttpTransport};
use crate::error::AuthError;

/// Minimum remaining lifetime for a cached token to be reused
pub const DEFAULT_REFRESH_BUFFER: Duration = Duration::from_secs(5 * 60);

const ACCESS_TOKEN: &str = "access_token";

/// Login user and password
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// A bearer token and the expiry read from its claims, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl AuthToken {
    pub fn new(value: String) -> Self {
        let expires_at = decode_expiry(&value);
        Self { value, expires_at }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

/// Reads the `exp` claim of a JWT without checking its signature.
///
/// Returns `None` when the token is not a JWT or carries no expiry.
fn decode_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut segments = token.split('.');
    let _header = segments.next()?;
    let payload = segments.next()?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claims.exp?, 0)
}

/// Outcome of inspecting the cached token
#[derive(Debug, PartialEq, Eq)]
enum CacheLookup {
    Fresh(String),
    Miss(&'static str),
}

/// Obtains and caches the bearer token used against network nodes
pub struct AuthTokenCache {
    transport: Arc<dyn HttpTransport>,
    login_url: String,
    credentials: Option<Credentials>,
    refresh_buffer: Duration,
    request_timeout: Duration,
    token: Mutex<Option<AuthToken>>,
}

impl std::fmt::Debug for AuthTokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTokenCache")
            .field("login_url", &self.login_url)
            .field("credentials", &self.credentials)
            .field("refresh_buffer", &self.refresh_buffer)
            .finish()
    }
}

impl AuthTokenCache {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        login_url: impl Into<String>,
        credentials: Option<Credentials>,
    ) -> Self {
        Self {
            transport,
            login_url: login_url.into(),
            credentials,
            refresh_buffer: DEFAULT_REFRESH_BUFFER,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            token: Mutex::new(None),
        }
    }

    pub fn with_refresh_buffer(mut self, buffer: Duration) -> Self {
        self.refresh_buffer = buffer;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// The currently cached token, without refreshing it
    pub async fn cached(&self) -> Option<AuthToken> {
        self.token.lock().await.clone()
    }

    /// Returns a usable bearer token, logging in again when needed
    ///
    /// # Errors
    /// * [`AuthError::CredentialsMissing`] when user or password is absent
    /// * [`AuthError::LoginUnreachable`] on transport failure, timeout or non-2xx status
    /// * [`AuthError::LoginResponseInvalid`] when the body is not JSON or lacks `access_token`
    pub async fn authenticate(&self) -> Result<String, AuthError> {
        let mut slot = self.token.lock().await;

        match self.lookup(slot.as_ref()) {
            CacheLookup::Fresh(value) => return Ok(value),
            CacheLookup::Miss(reason) => debug!(reason, "Bearer token cache miss"),
        }

        let token = self.login().await?;
        let value = token.value.clone();
        info!(expires_at = ?token.expires_at, "Obtained new bearer token");
        *slot = Some(token);
        Ok(value)
    }

    fn lookup(&self, cached: Option<&AuthToken>) -> CacheLookup {
        let Some(token) = cached else {
            return CacheLookup::Miss("no token cached");
        };
        let Some(expires_at) = token.expires_at else {
            return CacheLookup::Miss("cached token has no readable expiry");
        };
        let Ok(buffer) = chrono::Duration::from_std(self.refresh_buffer) else {
            return CacheLookup::Miss("refresh buffer out of range");
        };
        match Utc::now().checked_add_signed(buffer) {
            Some(deadline) if expires_at > deadline => CacheLookup::Fresh(token.value.clone()),
            Some(_) => CacheLookup::Miss("cached token expires within the refresh buffer"),
            None => CacheLookup::Miss("refresh buffer out of range"),
        }
    }

    async fn login(&self) -> Result<AuthToken, AuthError> {
        let credentials = self.credentials.as_ref().ok_or(AuthError::CredentialsMissing)?;

        let mut request = HttpRequest::new(HttpMethod::Post, self.login_url.clone());
        request.headers.push(("Content-Type".to_string(), "application/json".to_string()));
        request.body = Some(json!({
            "email": credentials.user,
            "password": credentials.password,
        }));

        let response = tokio::time::timeout(self.request_timeout, self.transport.send(request))
            .await
            .map_err(|_| {
                AuthError::LoginUnreachable(format!(
                    "timed out after {}ms",
                    self.request_timeout.as_millis()
                ))
            })?
            .map_err(|e| AuthError::LoginUnreachable(e.to_string()))?;

        if !response.is_success() {
            error!(url = %self.login_url, status = response.status, "Login rejected");
            return Err(AuthError::LoginUnreachable(format!(
                "HTTP {} from {}",
                response.status, self.login_url
            )));
        }

        let body: Value = serde_json::from_str(&response.body)
            .map_err(|e| AuthError::LoginResponseInvalid(e.to_string()))?;
        let value = body
            .get(ACCESS_TOKEN)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AuthError::LoginResponseInvalid(format!("missing '{}'", ACCESS_TOKEN))
            })?;

        Ok(AuthToken::new(value.to_string()))
    }
}

#[cfg(test)]
pub(crate) fn jwt_expiring_at(exp: DateTime<Utc>) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"driver","exp":{}}}"#, exp.timestamp()));
    format!("{}.{}.signature", header, payload)
}
