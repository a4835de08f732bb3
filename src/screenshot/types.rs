use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{Result, ScreenshotApiError};

/// Layout of `created_at` in metadata responses (`YYYY-MM-DD HH:ii:ss`).
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Value of the `output` field injected into every capture request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Json,
    Image,
}

impl OutputMode {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputMode::Json => "json",
            OutputMode::Image => "image",
        }
    }
}

/// Options for a single capture.
///
/// Only `url` is required. Every unset field is left out of the request body,
/// so the server applies its own default (noted on each field).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CaptureParameters {
    /// Page to capture. The scheme may be omitted (`example.com`); the
    /// value is sent as given.
    pub url: String,
    /// Browser width in pixels. Server default: 1680.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Browser height in pixels. Server default: 876.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Capture the entire page instead of the viewport. Server default: false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_page: Option<bool>,
    /// Bypass the server-side cache. Server default: false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fresh: Option<bool>,
    /// Width of the output image; the aspect ratio is kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_width: Option<u32>,
    /// Milliseconds to wait before capturing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
    /// Accept-Language header. Server default: `en-US,en;q=0.8`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_languages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Cache lifetime in seconds. Server default: 30 days.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    /// Stylesheet URL injected into the page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css_url: Option<String>,
    /// Inline CSS injected into the page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
    /// Capture only the first element matching this selector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
}

impl CaptureParameters {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Checks the target URL before anything goes over the wire.
    ///
    /// # Errors
    ///
    /// Returns [`ScreenshotApiError::InvalidParameters`] when `url` is blank or
    /// cannot be parsed, with or without a scheme.
    pub fn validate(&self) -> Result<()> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ScreenshotApiError::InvalidParameters(
                "url is required".to_string(),
            ));
        }
        // Host-only targets are left for the server to resolve.
        let candidate = if url.contains("://") {
            url.to_string()
        } else {
            format!("http://{}", url)
        };
        reqwest::Url::parse(&candidate).map_err(|e| {
            ScreenshotApiError::InvalidParameters(format!("url {:?} is not valid: {}", url, e))
        })?;
        Ok(())
    }
}

/// Body posted to the capture endpoint: the caller's parameters plus the two
/// fields the client always controls.
#[derive(Debug, Serialize)]
pub(crate) struct CaptureRequest<'a> {
    #[serde(flatten)]
    pub params: &'a CaptureParameters,
    pub output: OutputMode,
    pub token: &'a str,
}

/// Response body of a `json` capture.
///
/// Fields the server adds beyond the documented four are kept in `extra`, so
/// serializing the value yields the upstream body unchanged. The four
/// documented fields are required: a success body missing any of them is
/// reported as [`ScreenshotApiError::ParseError`] rather than passed through.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScreenshotMetadata {
    /// URL of the stored screenshot.
    pub screenshot: String,
    /// URL of the captured page.
    pub url: String,
    pub created_at: String,
    /// `false` when the screenshot was served from cache.
    pub is_fresh: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ScreenshotMetadata {
    pub fn created_at_time(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.created_at, CREATED_AT_FORMAT).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn request_body_contains_only_set_fields() {
        let params = CaptureParameters::new("https://example.com");
        let body = CaptureRequest {
            params: &params,
            output: OutputMode::Json,
            token: "abc123",
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"url": "https://example.com", "output": "json", "token": "abc123"})
        );
    }

    #[test]
    fn request_body_carries_every_capture_option() {
        let params = CaptureParameters {
            width: Some(1024),
            height: Some(768),
            full_page: Some(true),
            fresh: Some(false),
            thumbnail_width: Some(320),
            delay: Some(1500),
            accept_languages: Some("nl-NL".to_string()),
            user_agent: Some("bot/1.0".to_string()),
            ttl: Some(3600),
            css_url: Some("https://example.com/print.css".to_string()),
            css: Some("body { background: red }".to_string()),
            selector: Some("#main".to_string()),
            ..CaptureParameters::new("https://example.com")
        };
        let body = CaptureRequest {
            params: &params,
            output: OutputMode::Image,
            token: "t",
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "url": "https://example.com",
                "width": 1024,
                "height": 768,
                "full_page": true,
                "fresh": false,
                "thumbnail_width": 320,
                "delay": 1500,
                "accept_languages": "nl-NL",
                "user_agent": "bot/1.0",
                "ttl": 3600,
                "css_url": "https://example.com/print.css",
                "css": "body { background: red }",
                "selector": "#main",
                "output": "image",
                "token": "t",
            })
        );
    }

    #[test]
    fn validate_rejects_blank_url() {
        let err = CaptureParameters::new("   ").validate().unwrap_err();
        assert!(matches!(err, ScreenshotApiError::InvalidParameters(_)));
    }

    #[test]
    fn validate_accepts_host_without_scheme() {
        assert!(CaptureParameters::new("example.com").validate().is_ok());
        assert!(CaptureParameters::new("example.com/page?x=1").validate().is_ok());
    }

    #[test]
    fn validate_rejects_unparsable_url() {
        let err = CaptureParameters::new("https://exa mple.com")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ScreenshotApiError::InvalidParameters(_)));
    }

    #[test]
    fn validate_accepts_absolute_url() {
        assert!(CaptureParameters::new("https://example.com/a?b=c")
            .validate()
            .is_ok());
    }

    #[test]
    fn metadata_keeps_unknown_fields() {
        let body = json!({
            "screenshot": "https://cdn.example.com/shot.png",
            "url": "https://example.com",
            "created_at": "2024-02-29 13:45:07",
            "is_fresh": true,
            "ttl": "2024-03-30 13:45:07",
        });

        let metadata: ScreenshotMetadata = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(metadata.extra.get("ttl"), Some(&json!("2024-03-30 13:45:07")));
        assert_eq!(serde_json::to_value(&metadata).unwrap(), body);
    }

    #[test]
    fn metadata_missing_documented_field_is_rejected() {
        let body = json!({
            "screenshot": "https://cdn.example.com/shot.png",
            "url": "https://example.com",
            "created_at": "2024-02-29 13:45:07",
        });

        let err = serde_json::from_value::<ScreenshotMetadata>(body).unwrap_err();
        assert!(err.to_string().contains("is_fresh"));
    }

    #[test]
    fn created_at_time_parses_server_format() {
        let metadata = ScreenshotMetadata {
            screenshot: String::new(),
            url: String::new(),
            created_at: "2024-02-29 13:45:07".to_string(),
            is_fresh: false,
            extra: Map::new(),
        };

        let time = metadata.created_at_time().unwrap();
        assert_eq!((time.year(), time.month(), time.day()), (2024, 2, 29));
        assert_eq!((time.hour(), time.minute(), time.second()), (13, 45, 7));
    }

    #[test]
    fn created_at_time_is_none_for_other_formats() {
        let metadata = ScreenshotMetadata {
            screenshot: String::new(),
            url: String::new(),
            created_at: "2024-02-29T13:45:07Z".to_string(),
            is_fresh: false,
            extra: Map::new(),
        };

        assert!(metadata.created_at_time().is_none());
    }
}
