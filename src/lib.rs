pub mod config;
pub mod screenshot;

pub use config::{ConfigError, Settings};
pub use screenshot::{
    CaptureParameters, OutputMode, Result, SaveTask, ScreenshotApiError, ScreenshotClient,
    ScreenshotMetadata,
};
