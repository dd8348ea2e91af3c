//! Resource analysis: fetch, classify, dispatch to handlers, cache

use crate::cache::{CacheStats, ResourceCache, CACHE_SIZE, CACHE_TTL_SECS};
use crate::config::AnalyzerConfig;
use crate::context::HandlerContext;
use crate::error::Result;
use crate::fetch::{Fetched, Fetcher, DEFAULT_MAX_SIZE, DEFAULT_TIMEOUT_SECS};
use crate::handlers::{default_handlers, Handler, YoutubeHandler};
use content_file_store::Files;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use web_resource::{Resource, Thumbnail};

/// Analyzes web resources
///
/// Safe to share between tasks; concurrent analyses of one URL may each fetch
/// it, the last result wins in the cache.
pub struct Analyzer {
    context: HandlerContext,
    handlers: Vec<Arc<dyn Handler>>,
    cache: ResourceCache,
}

impl Analyzer {
    /// Analyzer with the default handlers and no file store
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::default()
    }

    /// Build an analyzer from configuration, initializing its file store
    pub async fn from_config(config: &AnalyzerConfig) -> Result<Self> {
        let mut builder = Self::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .cache_size(config.cache_size)
            .cache_ttl(Duration::from_secs(config.cache_ttl_secs))
            .max_size(config.max_resource_size);

        if let Some(path) = &config.files_path {
            let files = Files::new(path);
            files.init().await?;
            info!(path = %path.display(), "Using file store");
            builder = builder.files(files);
        }

        if let Some(key) = config.video_service_keys.get("youtube") {
            builder = builder.handler(Arc::new(YoutubeHandler::new(key.clone())));
        }

        Ok(builder.build())
    }

    pub fn files(&self) -> Option<&Files> {
        self.context.files()
    }

    pub fn handlers(&self) -> &[Arc<dyn Handler>] {
        &self.handlers
    }

    #[cfg(test)]
    pub(crate) fn context(&self) -> &HandlerContext {
        &self.context
    }

    /// Analyze the resource at `url`
    ///
    /// The result is cached under `url` and, after redirects, under the
    /// resource's own URL.
    pub async fn analyze(&self, url: &str) -> Result<Arc<Resource>> {
        if let Some(resource) = self.cache.get(url).await {
            debug!(url, "Cache hit");
            return Ok(resource);
        }

        let Fetched {
            data,
            content_type,
            effective_url,
        } = self.context.fetch(url).await?;

        let mut found = None;
        for handler in &self.handlers {
            if let Some(resource) = handler
                .handle(&effective_url, &content_type, &data, &self.context)
                .await?
            {
                found = Some(resource);
                break;
            }
        }
        let resource = match found {
            Some(resource) => resource,
            None => Resource::new(effective_url.as_str(), content_type.as_str())?,
        };

        let resource = Arc::new(resource);
        self.cache.set(url, resource.clone()).await;
        if resource.url() != url {
            self.cache.set(resource.url(), resource.clone()).await;
        }

        info!(
            url,
            kind = ?resource.kind(),
            content_type = %resource.content_type(),
            thumbnail = resource.thumbnail().is_some(),
            "Analyzed resource"
        );
        Ok(resource)
    }

    pub async fn fetch(&self, url: &str) -> Result<Fetched> {
        self.context.fetch(url).await
    }

    /// Create and store a thumbnail from image data
    pub async fn thumbnail(&self, data: &[u8], content_type: &str) -> Result<Thumbnail> {
        self.context.thumbnail(data, content_type).await
    }

    /// Fetch an image and create a thumbnail from it
    pub async fn thumbnail_url(&self, url: &str) -> Result<Thumbnail> {
        self.context.thumbnail_url(url).await
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`Analyzer`]
pub struct AnalyzerBuilder {
    handlers: Vec<Arc<dyn Handler>>,
    files: Option<Files>,
    timeout: Duration,
    max_size: usize,
    cache_size: usize,
    cache_ttl: Duration,
}

impl Default for AnalyzerBuilder {
    fn default() -> Self {
        Self {
            handlers: default_handlers(),
            files: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_size: DEFAULT_MAX_SIZE,
            cache_size: CACHE_SIZE,
            cache_ttl: Duration::from_secs(CACHE_TTL_SECS),
        }
    }
}

impl AnalyzerBuilder {
    /// Replace the handler chain
    pub fn handlers(mut self, handlers: Vec<Arc<dyn Handler>>) -> Self {
        self.handlers = handlers;
        self
    }

    /// Add a handler, tried before those already configured
    pub fn handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handlers.insert(0, handler);
        self
    }

    /// File store for thumbnails and `file:` URLs
    pub fn files(mut self, files: Files) -> Self {
        self.files = Some(files);
        self
    }

    /// Timeout of each outbound request
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Largest accepted response body in bytes
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = cache_size;
        self
    }

    pub fn cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    pub fn build(self) -> Analyzer {
        Analyzer {
            context: HandlerContext::new(
                Fetcher::new(self.timeout, self.files).with_max_size(self.max_size),
            ),
            handlers: self.handlers,
            cache: ResourceCache::new(self.cache_size, self.cache_ttl),
        }
    }
}
