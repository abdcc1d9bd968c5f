use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Fallback wait for a `429` response without a usable `Retry-After` header.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

const UNKNOWN_ERROR: &str = "Unknown error";

/// Failure payload reported by the remote API.
#[derive(Clone, Debug)]
pub struct ApiError {
    /// HTTP status of the response.
    pub status: StatusCode,
    /// Human readable message extracted from the response body.
    pub message: String,
    /// Parsed response body, or [`Value::Null`] when it was not JSON.
    pub body: Value,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.status.as_u16(), self.message)
    }
}

/// Errors returned by client and repository operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Base URL is not a valid absolute URL.
    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),

    /// Endpoint path could not be joined to the base URL.
    #[error("invalid endpoint path '{0}'")]
    InvalidPath(String),

    /// The configured token cannot be sent as an HTTP header value.
    #[error("access token contains characters not allowed in an HTTP header")]
    InvalidToken,

    /// An update was requested for an entity without an id.
    #[error("entity for '{endpoint}' must have an id for this operation")]
    MissingEntityId { endpoint: &'static str },

    /// HTTP transport-layer request failure.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Response body could not be parsed as JSON or mapped onto a type.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Response was valid JSON but did not have the expected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// `401`: the token was rejected.
    #[error("authentication failed: {0}")]
    Authentication(ApiError),

    /// `404`: the requested resource does not exist.
    #[error("resource not found: {0}")]
    NotFound(ApiError),

    /// `429`: the API rate limit was exceeded.
    #[error("rate limit exceeded, retry after {}s: {error}", .retry_after.as_secs())]
    RateLimited {
        retry_after: Duration,
        error: ApiError,
    },

    /// Any other `4xx`: the request was rejected as invalid.
    #[error("request rejected: {0}")]
    Validation(ApiError),

    /// Any other non-success status.
    #[error("server returned error: {0}")]
    Api(ApiError),
}

impl ClientError {
    /// Returns the remote failure payload for status-mapped errors.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Authentication(error)
            | Self::NotFound(error)
            | Self::Validation(error)
            | Self::Api(error)
            | Self::RateLimited { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Returns the HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Request(error) => error.status(),
            other => other.api_error().map(|error| error.status),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Maps a non-success response onto the matching error variant.
    ///
    /// `retry_after` is the raw `Retry-After` header value, if present.
    pub(crate) fn from_response(status: StatusCode, retry_after: Option<&str>, payload: &str) -> Self {
        let (message, body) = extract_message(payload);
        let error = ApiError {
            status,
            message,
            body,
        };

        match status {
            StatusCode::UNAUTHORIZED => Self::Authentication(error),
            StatusCode::NOT_FOUND => Self::NotFound(error),
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited {
                retry_after: parse_retry_after(retry_after),
                error,
            },
            status if status.is_client_error() => Self::Validation(error),
            _ => Self::Api(error),
        }
    }
}

fn extract_message(payload: &str) -> (String, Value) {
    let Ok(body) = serde_json::from_str::<Value>(payload) else {
        let text = payload.trim();
        let message = if text.is_empty() { UNKNOWN_ERROR } else { text };
        return (message.to_owned(), Value::Null);
    };

    let joined = body
        .get("errors")
        .and_then(Value::as_array)
        .filter(|errors| !errors.is_empty())
        .map(|errors| {
            errors
                .iter()
                .map(|entry| entry.get("error").and_then(Value::as_str).unwrap_or_default())
                .collect::<Vec<_>>()
                .join("; ")
        });

    let message = match joined {
        Some(message) => message,
        None => match body.get("error") {
            Some(Value::String(message)) => message.clone(),
            Some(other) => other.to_string(),
            None => UNKNOWN_ERROR.to_owned(),
        },
    };

    (message, body)
}

fn parse_retry_after(header: Option<&str>) -> Duration {
    header
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map_or(DEFAULT_RETRY_AFTER, Duration::from_secs)
}
