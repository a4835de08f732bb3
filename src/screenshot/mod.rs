pub mod client;
pub mod error;
pub mod types;

pub use client::{BASE_API_URL, SaveTask, ScreenshotClient};
pub use error::{Result, ScreenshotApiError, UNKNOWN_ERROR_MESSAGE, normalize_response};
pub use types::{CREATED_AT_FORMAT, CaptureParameters, OutputMode, ScreenshotMetadata};
