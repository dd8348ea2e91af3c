//! Fetching resources over HTTP or from the file store

use crate::error::{AnalysisError, Result};
use content_file_store::Files;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
/// Default cap on response bodies
pub const DEFAULT_MAX_SIZE: usize = 5 * 1024 * 1024;
const USER_AGENT: &str = concat!("resource-analyzer/", env!("CARGO_PKG_VERSION"));

/// A fetched resource
#[derive(Debug, Clone)]
pub struct Fetched {
    pub data: Vec<u8>,
    /// Media type without parameters
    pub content_type: String,
    /// URL after following redirects
    pub effective_url: String,
}

/// HTTP client that classifies failures into [`AnalysisError`]s
///
/// `file:` URLs are served from the file store, if there is one.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    files: Option<Files>,
    max_size: usize,
}

impl Fetcher {
    pub fn new(timeout: Duration, files: Option<Files>) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            files,
            max_size: DEFAULT_MAX_SIZE,
        }
    }

    /// Reject response bodies larger than `max_size` bytes
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn files(&self) -> Option<&Files> {
        self.files.as_ref()
    }

    /// Fetch `url`, returning its data, media type and effective URL
    pub async fn fetch(&self, url: &str) -> Result<Fetched> {
        let parsed = Url::parse(url)
            .map_err(|e| AnalysisError::Validation(format!("Bad URL {}: {}", url, e)))?;

        match parsed.scheme() {
            "http" | "https" => self.fetch_http(parsed).await,
            "file" => match &self.files {
                Some(files) => {
                    let (data, content_type) = files.read(url).await?;
                    Ok(Fetched {
                        data,
                        content_type,
                        effective_url: url.to_string(),
                    })
                }
                None => Err(AnalysisError::Validation(format!(
                    "No file store for {}",
                    url
                ))),
            },
            scheme => Err(AnalysisError::Validation(format!(
                "Unsupported URL scheme {} in {}",
                scheme, url
            ))),
        }
    }

    async fn fetch_http(&self, url: Url) -> Result<Fetched> {
        debug!(url = %url, "Fetching resource");

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, url = %url, "Failed to fetch resource");
            return Err(classify_status(url.as_str(), status));
        }

        let effective_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(media_type)
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        if response
            .content_length()
            .is_some_and(|length| length > self.max_size as u64)
        {
            return Err(self.too_large(&effective_url));
        }
        let mut data = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| transport_error(url.as_str(), e))?
        {
            if data.len() + chunk.len() > self.max_size {
                return Err(self.too_large(&effective_url));
            }
            data.extend_from_slice(&chunk);
        }

        debug!(
            url = %effective_url,
            size = data.len(),
            content_type = %content_type,
            "Fetched resource"
        );

        Ok(Fetched {
            data,
            content_type,
            effective_url,
        })
    }

    fn too_large(&self, url: &str) -> AnalysisError {
        warn!(url, max_size = self.max_size, "Resource too large");
        AnalysisError::BrokenResource(format!(
            "{}: Resource exceeds {} bytes",
            url, self.max_size
        ))
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS), None)
    }
}

/// Media type of a `Content-Type` value, without parameters
pub fn media_type(content_type: &str) -> String {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if essence.is_empty() {
        DEFAULT_CONTENT_TYPE.to_string()
    } else {
        essence
    }
}

/// Map a non-success HTTP status to an error
fn classify_status(url: &str, status: StatusCode) -> AnalysisError {
    match status.as_u16() {
        404 | 410 => AnalysisError::NoResource(url.to_string()),
        401 | 402 | 403 | 405 | 451 => AnalysisError::ForbiddenResource(url.to_string()),
        code => AnalysisError::communication(format!("Server responded with status {}", code), url),
    }
}

fn transport_error(url: &str, err: reqwest::Error) -> AnalysisError {
    if err.is_builder() {
        return AnalysisError::Validation(format!("Bad URL {}: {}", url, err));
    }
    warn!(url, error = %err, "Request failed");
    let message = if err.is_timeout() {
        "Request timed out".to_string()
    } else {
        err.to_string()
    };
    AnalysisError::communication(message, url)
}
