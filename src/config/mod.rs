use json_comments::StripComments;
use serde::Deserialize;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::screenshot::{ScreenshotApiError, ScreenshotClient};

/// Environment variable that overrides the token from the settings file.
pub const TOKEN_ENV: &str = "SCREENSHOTAPI_TOKEN";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("HOME directory not found")]
    HomeNotFound,

    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No API token configured (use --token, SCREENSHOTAPI_TOKEN, or ~/.screenshotapi/settings.json)")]
    MissingToken,

    #[error("Failed to create client: {0}")]
    Client(#[from] ScreenshotApiError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub token: Option<String>,
    pub base_url: Option<String>,
}

impl Settings {
    /// Reads `~/.screenshotapi/settings.json` (comments allowed), then applies
    /// the token from the environment.
    ///
    /// # Errors
    ///
    /// Fails when the home directory is unknown or the settings file cannot
    /// be read or parsed.
    pub fn load() -> Result<Self> {
        let path = Self::settings_path()?;
        let settings = Self::load_from(&path)?;
        Ok(settings.with_token(std::env::var(TOKEN_ENV).ok()))
    }

    /// Missing files yield the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] or [`ConfigError::Parse`] for an existing
    /// file that cannot be read or is not valid JSON.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Settings::default());
        }
        let file = std::fs::File::open(path)?;
        let settings: Settings = serde_json::from_reader(StripComments::new(BufReader::new(file)))?;
        Ok(settings)
    }

    /// Replaces the token when `token` is present and non-empty.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.token = Some(token);
        }
        self
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::MissingToken`] when no non-blank token is set.
    pub fn token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingToken)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::MissingToken`] without a token, or
    /// [`ConfigError::Client`] when the HTTP client cannot be built.
    pub fn client(&self) -> Result<ScreenshotClient> {
        let token = self.token()?;
        let client = match &self.base_url {
            Some(base_url) => ScreenshotClient::with_base_url(token, base_url)?,
            None => ScreenshotClient::new(token)?,
        };
        Ok(client)
    }

    fn settings_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".screenshotapi").join("settings.json"))
    }
}
