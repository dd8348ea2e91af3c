//! Error types for resource construction

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    BlankUrl,
    BlankContentType,
    BlankThumbnailUrl,
    Json(String),
}

impl ResourceError {
    /// Stable machine-readable code for the error
    pub fn code(&self) -> &'static str {
        match self {
            ResourceError::BlankUrl => "blank_url",
            ResourceError::BlankContentType => "blank_content_type",
            ResourceError::BlankThumbnailUrl => "blank_thumbnail_url",
            ResourceError::Json(_) => "bad_json",
        }
    }
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::BlankUrl => write!(f, "Resource URL is blank"),
            ResourceError::BlankContentType => write!(f, "Resource content type is blank"),
            ResourceError::BlankThumbnailUrl => write!(f, "Thumbnail URL is blank"),
            ResourceError::Json(msg) => write!(f, "Invalid resource JSON: {}", msg),
        }
    }
}

impl std::error::Error for ResourceError {}

impl From<serde_json::Error> for ResourceError {
    fn from(err: serde_json::Error) -> Self {
        ResourceError::Json(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ResourceError>;
