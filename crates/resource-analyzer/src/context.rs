//! Services available to content handlers

use crate::error::{AnalysisError, Result};
use crate::fetch::{media_type, Fetched, Fetcher};
use crate::thumbnail::{self, RASTER_TYPES, SVG_TYPE};
use content_file_store::Files;
use tracing::debug;
use web_resource::Thumbnail;

/// What a handler may do while analyzing a resource
///
/// Handlers can fetch and thumbnail a single embedded image, but cannot run a
/// full analysis, so one `analyze` call never recurses into another.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    fetcher: Fetcher,
}

impl HandlerContext {
    pub(crate) fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    /// The file store thumbnails are written to, if any
    pub fn files(&self) -> Option<&Files> {
        self.fetcher.files()
    }

    pub async fn fetch(&self, url: &str) -> Result<Fetched> {
        self.fetcher.fetch(url).await
    }

    /// Create a thumbnail from image data and store it
    ///
    /// Raster images are scaled down on the blocking pool, SVG images are
    /// stored as is. Other types are rejected as broken.
    pub async fn thumbnail(&self, data: &[u8], content_type: &str) -> Result<Thumbnail> {
        let files = self.files().ok_or_else(|| {
            AnalysisError::Validation("No file store for thumbnails".to_string())
        })?;
        let content_type = media_type(content_type);

        let data = if content_type == SVG_TYPE {
            data.to_vec()
        } else if RASTER_TYPES.contains(&content_type.as_str()) {
            let data = data.to_vec();
            let raster_type = content_type.clone();
            tokio::task::spawn_blocking(move || thumbnail::downscale(&data, &raster_type))
                .await
                .map_err(|e| {
                    AnalysisError::BrokenResource(format!("Thumbnail worker failed: {}", e))
                })??
        } else {
            return Err(AnalysisError::BrokenResource(format!(
                "Unsupported image type {}",
                content_type
            )));
        };

        let url = files.write(&data, &content_type).await?;
        debug!(url = %url, content_type = %content_type, "Stored thumbnail");
        Ok(Thumbnail::new(url)?)
    }

    /// Fetch an image and create a thumbnail from it
    pub async fn thumbnail_url(&self, url: &str) -> Result<Thumbnail> {
        let fetched = self.fetch(url).await?;
        self.thumbnail(&fetched.data, &fetched.content_type)
            .await
            .map_err(|e| e.for_url(&fetched.effective_url))
    }
}
