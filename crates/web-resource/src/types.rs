//! Resource and thumbnail value types

use crate::error::{ResourceError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Kind tag of a resource, used by clients to pick a rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Resource,
    Image,
    Video,
}

/// Downsized preview image persisted in the file store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ThumbnailJson")]
pub struct Thumbnail {
    url: String,
}

impl Thumbnail {
    /// Create a thumbnail reference, failing if `url` is blank
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        if is_blank(&url) {
            return Err(ResourceError::BlankThumbnailUrl);
        }
        Ok(Self { url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Deserialize)]
struct ThumbnailJson {
    url: String,
}

impl TryFrom<ThumbnailJson> for Thumbnail {
    type Error = ResourceError;

    fn try_from(json: ThumbnailJson) -> Result<Self> {
        Thumbnail::new(json.url)
    }
}

/// A fetched, classified web resource
///
/// Immutable once constructed: the `with_*` builders consume the value and are
/// meant to be used before it is shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ResourceJson", into = "ResourceJson")]
pub struct Resource {
    kind: ResourceKind,
    url: String,
    content_type: String,
    description: Option<String>,
    thumbnail: Option<Thumbnail>,
}

impl Resource {
    /// Create a generic resource
    pub fn new(url: impl Into<String>, content_type: impl Into<String>) -> Result<Self> {
        Self::with_kind(ResourceKind::Resource, url, content_type)
    }

    /// Create a resource tagged as an image
    pub fn image(url: impl Into<String>, content_type: impl Into<String>) -> Result<Self> {
        Self::with_kind(ResourceKind::Image, url, content_type)
    }

    /// Create a resource tagged as a video
    pub fn video(url: impl Into<String>, content_type: impl Into<String>) -> Result<Self> {
        Self::with_kind(ResourceKind::Video, url, content_type)
    }

    /// Create a resource of the given kind, failing on a blank URL or content type
    pub fn with_kind(
        kind: ResourceKind,
        url: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Result<Self> {
        let url = url.into();
        let content_type = content_type.into();
        if is_blank(&url) {
            return Err(ResourceError::BlankUrl);
        }
        if is_blank(&content_type) {
            return Err(ResourceError::BlankContentType);
        }
        Ok(Self {
            kind,
            url,
            content_type,
            description: None,
            thumbnail: None,
        })
    }

    /// Set the description. Blank descriptions are stored as absent.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !is_blank(d));
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: Option<Thumbnail>) -> Self {
        self.thumbnail = thumbnail;
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn thumbnail(&self) -> Option<&Thumbnail> {
        self.thumbnail.as_ref()
    }

    /// Parse a resource from its JSON wire shape
    pub fn parse(value: &Value) -> Result<Self> {
        let json = ResourceJson::deserialize(value)?;
        Resource::try_from(json)
    }

    /// Serialize to the JSON wire shape
    ///
    /// `rewrite` is applied to the resource URL and the thumbnail URL, e.g. to
    /// turn internal `file:` URLs into public ones.
    pub fn to_json(&self, rewrite: Option<&dyn Fn(&str) -> String>) -> Value {
        let rewrite_url = |url: &str| match rewrite {
            Some(f) => f(url),
            None => url.to_string(),
        };
        json!({
            "__type__": self.kind,
            "url": rewrite_url(&self.url),
            "content_type": self.content_type,
            "description": self.description,
            "thumbnail": self.thumbnail.as_ref().map(|t| json!({ "url": rewrite_url(&t.url) })),
        })
    }
}

#[derive(Serialize, Deserialize)]
struct ResourceJson {
    #[serde(rename = "__type__")]
    kind: ResourceKind,
    url: String,
    content_type: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    thumbnail: Option<Thumbnail>,
}

impl TryFrom<ResourceJson> for Resource {
    type Error = ResourceError;

    fn try_from(json: ResourceJson) -> Result<Self> {
        Ok(Resource::with_kind(json.kind, json.url, json.content_type)?
            .with_description(json.description)
            .with_thumbnail(json.thumbnail))
    }
}

impl From<Resource> for ResourceJson {
    fn from(resource: Resource) -> Self {
        Self {
            kind: resource.kind,
            url: resource.url,
            content_type: resource.content_type,
            description: resource.description,
            thumbnail: resource.thumbnail,
        }
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
