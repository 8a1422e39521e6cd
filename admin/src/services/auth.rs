//! Authentication endpoints

use crate::envelope::unwrap_envelope;
use crate::error::ApiError;
use crate::transport::HttpTransport;
use async_trait::async_trait;
use freekick_core::environment::TokenPair;
use reqwest::Method;
use serde_json::{Value, json};

const LOGIN_PATH: &str = "/auth/jwt/create/";
const CURRENT_USER_PATH: &str = "/auth/users/me/";
const LOGOUT_PATH: &str = "/auth/logout/";
const REFRESH_PATH: &str = "/auth/jwt/refresh/";

/// Session endpoints
///
/// The client only talks to the server. Persisting or clearing tokens is the
/// auth slice's job.
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Exchange credentials for a token pair
    async fn login(&self, phone: &str, password: &str) -> Result<TokenPair, ApiError>;

    /// Profile of the authenticated user
    async fn current_user(&self) -> Result<Value, ApiError>;

    /// End the server-side session
    async fn logout(&self) -> Result<(), ApiError>;

    /// Exchange a refresh token for a new pair
    async fn refresh(&self, refresh: &str) -> Result<TokenPair, ApiError>;
}

/// [`AuthClient`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpAuthClient {
    transport: HttpTransport,
}

impl HttpAuthClient {
    /// Auth client over `transport`
    #[must_use]
    pub const fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl AuthClient for HttpAuthClient {
    async fn login(&self, phone: &str, password: &str) -> Result<TokenPair, ApiError> {
        let body = self
            .transport
            .post(LOGIN_PATH, &json!({ "phone": phone, "password": password }))
            .await?;
        let data = unwrap_envelope(body);

        let token = data
            .get("token")
            .ok_or_else(|| ApiError::Decode("No token in response".into()))?;
        token_pair(token, None)
    }

    async fn current_user(&self) -> Result<Value, ApiError> {
        let body = self.transport.get(CURRENT_USER_PATH, &[]).await?;
        Ok(unwrap_envelope(body))
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.transport
            .request(Method::POST, LOGOUT_PATH, &[], None)
            .await?;
        Ok(())
    }

    async fn refresh(&self, refresh: &str) -> Result<TokenPair, ApiError> {
        let body = self
            .transport
            .post(REFRESH_PATH, &json!({ "refresh": refresh }))
            .await?;
        let data = unwrap_envelope(body);
        let token = data.get("token").unwrap_or(&data);
        token_pair(token, Some(refresh))
    }
}

/// Read `{access, refresh}`; a refresh response may omit `refresh`
fn token_pair(token: &Value, current_refresh: Option<&str>) -> Result<TokenPair, ApiError> {
    let field = |key: &str| token.get(key).and_then(Value::as_str).map(str::to_string);

    let access = field("access").ok_or_else(|| ApiError::Decode("No token in response".into()))?;
    let refresh = field("refresh")
        .or_else(|| current_refresh.map(str::to_string))
        .ok_or_else(|| ApiError::Decode("No refresh token in response".into()))?;

    Ok(TokenPair { access, refresh })
}

/// Canonical phone form: digits and `+` only, with a leading `+`
#[must_use]
pub fn normalize_phone(phone: &str) -> String {
    let kept: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    if kept.starts_with('+') {
        kept
    } else {
        format!("+{kept}")
    }
}

/// Phone prefix safe to log
#[must_use]
pub fn redact_phone(phone: &str) -> String {
    let prefix: String = phone.chars().take(5).collect();
    format!("{prefix}***")
}
