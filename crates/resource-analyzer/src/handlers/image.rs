use crate::context::HandlerContext;
use crate::error::Result;
use crate::handlers::Handler;
use async_trait::async_trait;
use web_resource::Resource;

pub const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/svg+xml", "image/gif"];

/// Recognizes images, thumbnailing them when a file store is available
pub struct ImageHandler;

#[async_trait]
impl Handler for ImageHandler {
    async fn handle(
        &self,
        url: &str,
        content_type: &str,
        data: &[u8],
        context: &HandlerContext,
    ) -> Result<Option<Resource>> {
        if !IMAGE_TYPES.contains(&content_type) {
            return Ok(None);
        }

        let thumbnail = match context.files() {
            Some(_) => Some(
                context
                    .thumbnail(data, content_type)
                    .await
                    .map_err(|e| e.for_url(url))?,
            ),
            None => None,
        };

        Ok(Some(
            Resource::image(url, content_type)?.with_thumbnail(thumbnail),
        ))
    }
}
