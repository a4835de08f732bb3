use std::fmt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::error::{Result, normalize_response};
use super::types::{CaptureParameters, CaptureRequest, OutputMode, ScreenshotMetadata};

pub const BASE_API_URL: &str = "https://screenshotapi.net/api/v1/";

const USER_AGENT: &str = concat!("screenshotapi-rs/", env!("CARGO_PKG_VERSION"));

/// Handle to a capture endpoint authenticated with one API token.
///
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Clone)]
pub struct ScreenshotClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl fmt::Debug for ScreenshotClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScreenshotClient")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl ScreenshotClient {
    /// # Errors
    ///
    /// Fails only if the HTTP client cannot be initialised.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(token, BASE_API_URL)
    }

    /// Like [`ScreenshotClient::new`], but sends requests to `base_url` instead
    /// of the public API.
    ///
    /// # Errors
    ///
    /// Fails only if the HTTP client cannot be initialised.
    pub fn with_base_url(token: impl Into<String>, base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        let endpoint = format!("{}/screenshot", base_url.trim_end_matches('/'));

        Ok(Self {
            http,
            endpoint,
            token: token.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Captures a page and returns the stored screenshot's metadata.
    ///
    /// # Errors
    ///
    /// Returns the normalized API error for non-success responses, the
    /// untouched transport error when no response arrived, and a parse error
    /// when the body is not metadata.
    pub async fn fetch_metadata(&self, params: &CaptureParameters) -> Result<ScreenshotMetadata> {
        let response = self.send(params, OutputMode::Json).await?;
        let body = response.bytes().await?;
        let metadata: ScreenshotMetadata = serde_json::from_slice(&body)?;
        Ok(metadata)
    }

    /// Captures a page and returns the encoded image.
    ///
    /// # Errors
    ///
    /// Same as [`ScreenshotClient::fetch_metadata`], minus the parse error.
    pub async fn fetch_image(&self, params: &CaptureParameters) -> Result<Bytes> {
        let response = self.send(params, OutputMode::Image).await?;
        Ok(response.bytes().await?)
    }

    /// Captures a page and streams the image into `path`.
    ///
    /// Returns once the response headers arrived and the file was created. The
    /// body is copied by a background task; failures during the copy are only
    /// logged and never reach the caller, even through [`SaveTask::finished`].
    ///
    /// # Errors
    ///
    /// Same as [`ScreenshotClient::fetch_image`], plus an I/O error when the
    /// destination file cannot be created.
    pub async fn save_to_file(
        &self,
        path: impl AsRef<Path>,
        params: &CaptureParameters,
    ) -> Result<SaveTask> {
        let response = self.send(params, OutputMode::Image).await?;

        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).await?;

        let task_path = path.clone();
        let handle = tokio::spawn(async move {
            match pipe_to_file(response, file).await {
                Ok(written) => debug!(path = %task_path.display(), bytes = written, "screenshot saved"),
                Err(e) => warn!(path = %task_path.display(), error = %e, "screenshot copy failed"),
            }
        });

        Ok(SaveTask { path, handle })
    }

    async fn send(&self, params: &CaptureParameters, output: OutputMode) -> Result<reqwest::Response> {
        params.validate()?;

        let body = CaptureRequest {
            params,
            output,
            token: &self.token,
        };

        debug!(endpoint = %self.endpoint, output = output.as_str(), "sending capture request");
        let response = self.http.post(&self.endpoint).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let error = normalize_response(status, &body);
            warn!(status = status.as_u16(), error = %error, "capture request rejected");
            return Err(error);
        }

        Ok(response)
    }
}

async fn pipe_to_file(response: reqwest::Response, mut file: File) -> std::io::Result<u64> {
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    let mut outcome = Ok(());

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(chunk) => {
                file.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            Err(e) => {
                outcome = Err(std::io::Error::other(e));
                break;
            }
        }
    }

    // Whatever arrived before a stream error stays on disk.
    file.flush().await?;
    outcome.map(|()| written)
}

/// Background copy started by [`ScreenshotClient::save_to_file`].
#[derive(Debug)]
pub struct SaveTask {
    path: PathBuf,
    handle: JoinHandle<()>,
}

impl SaveTask {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Waits for the copy to stop, whether it completed or failed.
    pub async fn finished(self) {
        if let Err(e) = self.handle.await {
            warn!(path = %self.path.display(), error = %e, "screenshot copy task aborted");
        }
    }
}
