use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Error as JsonError, Value};

#[derive(Debug)]
pub enum ChatApiError {
    InvalidBaseUrl(String),
    InvalidHeader(String),
    Request(reqwest::Error),
    Status(StatusCode, String),
    Serde(JsonError),
    InvalidAudio(base64::DecodeError),
    InvalidImage(base64::DecodeError),
    /// The endpoint answered successfully but reported an error in its body.
    Backend(String),
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    detail: Option<Value>,
    error: Option<Value>,
    message: Option<String>,
}

impl fmt::Display for ChatApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBaseUrl(value) => write!(f, "invalid base URL: {value}"),
            Self::InvalidHeader(value) => write!(f, "invalid header value: {value}"),
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(status, message) => write!(f, "HTTP {status} {message}"),
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::InvalidAudio(error) => write!(f, "audio payload is not valid base64: {error}"),
            Self::InvalidImage(error) => write!(f, "image payload is not valid base64: {error}"),
            Self::Backend(message) => write!(f, "backend error: {message}"),
        }
    }
}

impl std::error::Error for ChatApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(error) => Some(error),
            Self::Serde(error) => Some(error),
            Self::InvalidAudio(error) | Self::InvalidImage(error) => Some(error),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ChatApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for ChatApiError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

/// Extracts a human-readable message from a non-success response body.
///
/// Understands `{"detail": "..."}`, validation-style
/// `{"detail": [{"msg": "..."}]}`, `{"error": ...}` and `{"message": "..."}`;
/// anything else falls back to the raw body or the status reason.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    let fallback = || {
        if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            body.to_string()
        }
    };

    let Ok(payload) = serde_json::from_str::<ErrorPayload>(body) else {
        return fallback();
    };

    payload
        .detail
        .as_ref()
        .and_then(message_from_value)
        .or_else(|| payload.error.as_ref().and_then(message_from_value))
        .or_else(|| payload.message.and_then(non_empty))
        .unwrap_or_else(fallback)
}

fn message_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => non_empty(text.clone()),
        Value::Array(items) => {
            let messages = items
                .iter()
                .filter_map(|item| {
                    item.get("msg")
                        .or_else(|| item.get("message"))
                        .and_then(Value::as_str)
                })
                .collect::<Vec<_>>();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        Value::Object(fields) => fields
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .and_then(non_empty),
        _ => None,
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
