//! HTTP transport shared by every service client
//!
//! Decorates requests with the bearer token, enforces the timeout and maps
//! responses into [`ApiError`]. A 401 clears the persisted session before the
//! error is returned; redirecting to a login view is the caller's business.

use crate::config::AdminConfig;
use crate::error::ApiError;
use freekick_core::environment::TokenStore;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Query pairs appended to a request URL
pub type Query = [(String, String)];

/// Authenticated JSON transport
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Build a transport for `config`, reading tokens from `tokens`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] if the HTTP client cannot be built.
    pub fn new(config: &AdminConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    /// Base URL requests are resolved against
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Token store used for request decoration
    #[must_use]
    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// `GET path?query`
    ///
    /// # Errors
    ///
    /// See [`HttpTransport::request`].
    pub async fn get(&self, path: &str, query: &Query) -> Result<Value, ApiError> {
        self.request(Method::GET, path, query, None).await
    }

    /// `POST path` with a JSON body
    ///
    /// # Errors
    ///
    /// See [`HttpTransport::request`].
    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.request(Method::POST, path, &[], Some(body)).await
    }

    /// `PUT path` with a JSON body
    ///
    /// # Errors
    ///
    /// See [`HttpTransport::request`].
    pub async fn put(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.request(Method::PUT, path, &[], Some(body)).await
    }

    /// `PATCH path` with a JSON body
    ///
    /// # Errors
    ///
    /// See [`HttpTransport::request`].
    pub async fn patch(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.request(Method::PATCH, path, &[], Some(body)).await
    }

    /// `DELETE path`
    ///
    /// # Errors
    ///
    /// See [`HttpTransport::request`].
    pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::DELETE, path, &[], None).await
    }

    /// Send one request and return the raw JSON body (`Null` when empty)
    ///
    /// # Errors
    ///
    /// - [`ApiError::Timeout`] when the configured timeout elapses
    /// - [`ApiError::Network`] when no response was received
    /// - [`ApiError::Unauthorized`] on 401, after clearing the token store
    /// - [`ApiError::Status`] on any other non-2xx status
    /// - [`ApiError::Decode`] when a 2xx body is not JSON
    #[tracing::instrument(skip(self, method, query, body), fields(method = %method))]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &Query,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.client.request(method.clone(), url.as_str());

        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let token = self.tokens.access_token();
        let authenticated = token.is_some();
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        tracing::debug!(authenticated, "Sending request");
        let start = Instant::now();

        let response = match builder.send().await {
            Ok(response) => response,
            Err(error) => {
                record(&method, "error", start);
                tracing::warn!(%error, "Request failed without a response");
                return Err(if error.is_timeout() {
                    ApiError::Timeout
                } else {
                    ApiError::Network(error.to_string())
                });
            },
        };

        let status = response.status();
        record(&method, status.as_str(), start);
        tracing::debug!(
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis(),
            "Received response"
        );

        let text = response.text().await.map_err(|error| {
            if error.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::Network(error.to_string())
            }
        })?;

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&text)
                .map_err(|e| ApiError::Decode(format!("response body: {e}")));
        }

        let body = serde_json::from_str::<Value>(&text).ok();

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("Received 401, clearing persisted tokens");
            self.tokens.clear();
            return Err(ApiError::Unauthorized { body });
        }

        tracing::warn!(status = status.as_u16(), "Request rejected");
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

fn record(method: &Method, status: &str, start: Instant) {
    metrics::counter!(
        "api.requests.total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("api.request.duration_seconds").record(start.elapsed().as_secs_f64());
}
