use crate::context::HandlerContext;
use crate::error::{AnalysisError, Result};
use crate::handlers::Handler;
use async_trait::async_trait;
use html_escape::decode_html_entities;
use lol_html::errors::RewritingError;
use lol_html::{element, text, HtmlRewriter, Settings};
use std::cell::RefCell;
use std::collections::HashMap;
use url::Url;
use web_resource::Resource;

pub const WEBPAGE_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

const TITLE_KEYS: &[&str] = &["og:title", "twitter:title"];
const SUMMARY_KEYS: &[&str] = &["og:description", "description"];
const IMAGE_KEYS: &[&str] = &["og:image", "og:image:url", "twitter:image"];

/// Describes HTML pages by their title and preview image
pub struct WebpageHandler;

#[async_trait]
impl Handler for WebpageHandler {
    async fn handle(
        &self,
        url: &str,
        content_type: &str,
        data: &[u8],
        context: &HandlerContext,
    ) -> Result<Option<Resource>> {
        if !WEBPAGE_TYPES.contains(&content_type) {
            return Ok(None);
        }

        let html = std::str::from_utf8(data).map_err(|e| {
            AnalysisError::BrokenResource(format!("Bad encoding in {}: {}", url, e))
        })?;
        let meta = PageMeta::scan(html)
            .map_err(|e| AnalysisError::BrokenResource(format!("Broken HTML in {}: {}", url, e)))?;

        let thumbnail = match (context.files(), meta.image()) {
            (Some(_), Some(image)) => {
                let image_url = Url::parse(url).and_then(|base| base.join(&image)).map_err(|e| {
                    AnalysisError::BrokenResource(format!(
                        "Bad image URL {} in {}: {}",
                        image, url, e
                    ))
                })?;
                let thumbnail = context
                    .thumbnail_url(image_url.as_str())
                    .await
                    .map_err(|e| embedded_image_error(url, e))?;
                Some(thumbnail)
            }
            _ => None,
        };

        let description = meta.title().or_else(|| meta.summary());
        Ok(Some(
            Resource::new(url, content_type)?
                .with_description(description)
                .with_thumbnail(thumbnail),
        ))
    }
}

/// Failures of the page's image break the page, unless they may be transient
fn embedded_image_error(page_url: &str, err: AnalysisError) -> AnalysisError {
    match err {
        err @ AnalysisError::Communication { .. } => err,
        AnalysisError::BrokenResource(msg) => {
            AnalysisError::BrokenResource(format!("Broken image in {}: {}", page_url, msg))
        }
        err => AnalysisError::BrokenResource(format!("Broken image in {}: {}", page_url, err)),
    }
}

/// Metadata found in a page's markup
#[derive(Debug, Default)]
struct PageMeta {
    title: Option<String>,
    /// First `content` per `<meta name|property>` key, keys lowercased
    meta: HashMap<String, String>,
}

impl PageMeta {
    /// Stream through `html` once, keeping the first `<title>` and the first
    /// value of each meta key
    fn scan(html: &str) -> std::result::Result<Self, RewritingError> {
        let title: RefCell<Option<String>> = RefCell::new(None);
        let title_text = RefCell::new(String::new());
        let meta: RefCell<HashMap<String, String>> = RefCell::new(HashMap::new());

        {
            let mut rewriter = HtmlRewriter::new(
                Settings {
                    element_content_handlers: vec![
                        text!("title", |chunk| {
                            if title.borrow().is_none() {
                                title_text.borrow_mut().push_str(chunk.as_str());
                                if chunk.last_in_text_node() {
                                    *title.borrow_mut() = Some(title_text.take());
                                }
                            }
                            Ok(())
                        }),
                        element!("meta[content]", |el| {
                            let key = el
                                .get_attribute("property")
                                .or_else(|| el.get_attribute("name"));
                            if let (Some(key), Some(content)) = (key, el.get_attribute("content"))
                            {
                                meta.borrow_mut()
                                    .entry(key.trim().to_ascii_lowercase())
                                    .or_insert(content);
                            }
                            Ok(())
                        }),
                    ],
                    ..Settings::default()
                },
                |_: &[u8]| {},
            );
            rewriter.write(html.as_bytes())?;
            rewriter.end()?;
        }

        Ok(Self {
            title: title.into_inner(),
            meta: meta.into_inner(),
        })
    }

    fn lookup(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|key| self.meta.get(*key))
            .find_map(|value| clean_text(value))
    }

    fn title(&self) -> Option<String> {
        self.lookup(TITLE_KEYS)
            .or_else(|| self.title.as_deref().and_then(clean_text))
    }

    fn summary(&self) -> Option<String> {
        self.lookup(SUMMARY_KEYS)
    }

    /// Preview image reference, entities decoded
    fn image(&self) -> Option<String> {
        IMAGE_KEYS
            .iter()
            .filter_map(|key| self.meta.get(*key))
            .map(|value| decode_html_entities(value.trim()).into_owned())
            .find(|value| !value.is_empty())
    }
}

/// Decode entities and collapse whitespace; blank text is `None`
fn clean_text(text: &str) -> Option<String> {
    let text = decode_html_entities(text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}
