//! Error types for the admin service clients

use serde_json::Value;
use thiserror::Error;

/// Message shown when no response was received at all
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";

/// Errors that can occur when talking to the Freekick API
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// No response received (connection refused, DNS, TLS, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// The request exceeded the transport timeout
    #[error("Request timed out")]
    Timeout,

    /// 401 response; persisted tokens have already been cleared
    #[error("Unauthorized")]
    Unauthorized {
        /// Response body, if it was JSON
        body: Option<Value>,
    },

    /// Any other non-2xx response
    #[error("API error (status {status})")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, if it was JSON
        body: Option<Value>,
    },

    /// The response body could not be interpreted
    #[error("Response parsing failed: {0}")]
    Decode(String),

    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// HTTP status of the failed response, if one was received
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body of the failed response, if it was JSON
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        match self {
            Self::Unauthorized { body } | Self::Status { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Human-readable message for slice error state
    ///
    /// Priority: body `message`, first `details[].message`, body `detail`,
    /// then `fallback`. Transport failures without a response get a generic
    /// network message.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        if matches!(self, Self::Network(_) | Self::Timeout) {
            return NETWORK_ERROR_MESSAGE.to_string();
        }

        self.body()
            .and_then(message_from_body)
            .unwrap_or_else(|| fallback.to_string())
    }
}

fn message_from_body(body: &Value) -> Option<String> {
    let non_empty = |v: Option<&Value>| {
        v.and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    non_empty(body.get("message"))
        .or_else(|| {
            non_empty(
                body.get("details")
                    .and_then(Value::as_array)
                    .and_then(|details| details.first())
                    .and_then(|first| first.get("message")),
            )
        })
        .or_else(|| non_empty(body.get("detail")))
}
