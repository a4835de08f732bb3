use std::borrow::Cow;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Message used when a failed response carries no usable `errors` entry.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error occured";

#[derive(Error, Debug)]
pub enum ScreenshotApiError {
    /// No response was received; the transport error is kept as-is.
    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid capture parameters: {0}")]
    InvalidParameters(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The server answered with a non-success status.
    ///
    /// `parameter` repeats `message` when the server reported a field error;
    /// it is not the field name.
    #[error("API error (status {status}): {message}")]
    ApiError {
        status: u16,
        message: String,
        parameter: Option<String>,
    },
}

impl ScreenshotApiError {
    /// HTTP status of the failed response, absent when none was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ScreenshotApiError::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn message(&self) -> Cow<'_, str> {
        match self {
            ScreenshotApiError::ApiError { message, .. } => Cow::Borrowed(message),
            other => Cow::Owned(other.to_string()),
        }
    }

    pub fn parameter(&self) -> Option<&str> {
        match self {
            ScreenshotApiError::ApiError { parameter, .. } => parameter.as_deref(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScreenshotApiError>;

/// Maps a non-success response onto [`ScreenshotApiError::ApiError`].
///
/// The first entry of the body's `errors` collection (document order) becomes
/// both `message` and `parameter`; a list-valued entry contributes its first
/// element. Any body without such an entry yields [`UNKNOWN_ERROR_MESSAGE`]
/// and no parameter.
pub fn normalize_response(status: StatusCode, body: &[u8]) -> ScreenshotApiError {
    let detail = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|body| first_error_detail(body.get("errors")?));

    match detail {
        Some(message) => ScreenshotApiError::ApiError {
            status: status.as_u16(),
            parameter: Some(message.clone()),
            message,
        },
        None => ScreenshotApiError::ApiError {
            status: status.as_u16(),
            message: UNKNOWN_ERROR_MESSAGE.to_string(),
            parameter: None,
        },
    }
}

fn first_error_detail(errors: &Value) -> Option<String> {
    let first = match errors {
        Value::Object(fields) => fields.values().next()?,
        Value::Array(items) => items.first()?,
        _ => return None,
    };

    let detail = match first {
        Value::Array(items) => items.first()?,
        other => other,
    };

    match detail {
        Value::String(s) => Some(s.clone()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
        scalar => Some(scalar.to_string()),
    }
}
