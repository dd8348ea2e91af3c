use crate::context::HandlerContext;
use crate::error::{AnalysisError, Result};
use crate::handlers::Handler;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;
use web_resource::Resource;

pub const YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3";
const YOUTUBE_HOSTS: &[&str] = &["youtube.com", "www.youtube.com", "m.youtube.com"];

/// Describes YouTube videos via the YouTube Data API
pub struct YoutubeHandler {
    key: String,
    api_url: String,
}

impl YoutubeHandler {
    pub fn new(key: impl Into<String>) -> Self {
        Self::with_api_url(key, YOUTUBE_API_URL)
    }

    /// Create a handler talking to a custom API endpoint
    pub fn with_api_url(key: impl Into<String>, api_url: &str) -> Self {
        Self {
            key: key.into(),
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Handler for YoutubeHandler {
    async fn handle(
        &self,
        url: &str,
        content_type: &str,
        _data: &[u8],
        context: &HandlerContext,
    ) -> Result<Option<Resource>> {
        let Some(video_id) = video_id(url) else {
            return Ok(None);
        };

        let query = format!(
            "{}/videos?id={}&part=snippet",
            self.api_url,
            urlencoding::encode(&video_id)
        );
        let request = format!("{}&key={}", query, urlencoding::encode(&self.key));
        debug!(video_id = %video_id, "Looking up video");

        // Errors reference the query without the key
        let fetched = context.fetch(&request).await.map_err(|e| {
            AnalysisError::communication(
                format!("Video service lookup failed [{}]", e.code()),
                query.as_str(),
            )
        })?;
        let reply: VideosResponse =
            serde_json::from_slice(&fetched.data).map_err(|e| AnalysisError::Communication {
                message: format!("Bad video service response: {}", e),
                request: query.clone(),
                response: Some(String::from_utf8_lossy(&fetched.data).into_owned()),
            })?;

        let Some(item) = reply.items.into_iter().next() else {
            return Err(AnalysisError::NoResource(url.to_string()));
        };
        let snippet = item.snippet;
        let preview = snippet
            .thumbnails
            .high
            .or(snippet.thumbnails.medium)
            .or(snippet.thumbnails.default)
            .ok_or_else(|| AnalysisError::Communication {
                message: "Bad video service response: no thumbnail".to_string(),
                request: query.clone(),
                response: None,
            })?;

        let thumbnail = match context.files() {
            Some(_) => Some(context.thumbnail_url(&preview.url).await?),
            None => None,
        };

        Ok(Some(
            Resource::video(url, content_type)?
                .with_description(Some(snippet.title))
                .with_thumbnail(thumbnail),
        ))
    }
}

/// Video ID of a YouTube watch URL
fn video_id(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    if !YOUTUBE_HOSTS.contains(&url.host_str()?) || url.path() != "/watch" {
        return None;
    }
    url.query_pairs()
        .find(|(name, _)| name == "v")
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
    thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    default: Option<ThumbnailInfo>,
    medium: Option<ThumbnailInfo>,
    high: Option<ThumbnailInfo>,
}

#[derive(Debug, Deserialize)]
struct ThumbnailInfo {
    url: String,
}
