//! Content handlers
//!
//! A handler looks at a fetched resource and either produces a [`Resource`]
//! for it or declines with `None`. The analyzer tries its handlers in order
//! and the first result wins.

mod image;
mod webpage;
mod youtube;

pub use self::image::{ImageHandler, IMAGE_TYPES};
pub use self::webpage::{WebpageHandler, WEBPAGE_TYPES};
pub use self::youtube::{YoutubeHandler, YOUTUBE_API_URL};

use crate::context::HandlerContext;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use web_resource::Resource;

#[async_trait]
pub trait Handler: Send + Sync {
    /// Produce a resource for `(url, content_type, data)`, or `None` if the
    /// handler does not apply
    async fn handle(
        &self,
        url: &str,
        content_type: &str,
        data: &[u8],
        context: &HandlerContext,
    ) -> Result<Option<Resource>>;
}

/// Handler backed by a synchronous function
pub struct FnHandler<F>(F);

#[async_trait]
impl<F> Handler for FnHandler<F>
where
    F: Fn(&str, &str, &[u8], &HandlerContext) -> Result<Option<Resource>> + Send + Sync,
{
    async fn handle(
        &self,
        url: &str,
        content_type: &str,
        data: &[u8],
        context: &HandlerContext,
    ) -> Result<Option<Resource>> {
        (self.0)(url, content_type, data, context)
    }
}

/// Wrap a synchronous function as a handler
pub fn handler_fn<F>(f: F) -> Arc<dyn Handler>
where
    F: Fn(&str, &str, &[u8], &HandlerContext) -> Result<Option<Resource>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(FnHandler(f))
}

/// The image and webpage handlers, in that order
pub fn default_handlers() -> Vec<Arc<dyn Handler>> {
    vec![Arc::new(ImageHandler), Arc::new(WebpageHandler)]
}
