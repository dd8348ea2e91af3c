//! Error types for resource analysis
//!
//! Fetch failures are classified once, at the fetch boundary, and passed up
//! unchanged from there.

use content_file_store::FilesError;
use std::fmt;
use web_resource::ResourceError;

#[derive(Debug)]
pub enum AnalysisError {
    /// Malformed input, e.g. a blank URL or an unsupported URL scheme
    Validation(String),
    /// Transport or protocol failure reaching a remote resource
    Communication {
        message: String,
        request: String,
        response: Option<String>,
    },
    /// The resource at the URL does not exist
    NoResource(String),
    /// Access to the resource at the URL is denied
    ForbiddenResource(String),
    /// The resource was fetched but its content is unusable
    BrokenResource(String),
    /// Writing to the file store failed
    Storage(Box<std::io::Error>),
}

impl AnalysisError {
    /// Stable machine-readable code for the error
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::Validation(_) => "validation",
            AnalysisError::Communication { .. } => "communication",
            AnalysisError::NoResource(_) => "no_resource",
            AnalysisError::ForbiddenResource(_) => "forbidden_resource",
            AnalysisError::BrokenResource(_) => "broken_resource",
            AnalysisError::Storage(_) => "storage",
        }
    }

    /// Prefix a broken resource message with the URL it concerns
    pub(crate) fn for_url(self, url: &str) -> Self {
        match self {
            AnalysisError::BrokenResource(msg) => {
                AnalysisError::BrokenResource(format!("{}: {}", url, msg))
            }
            e => e,
        }
    }

    pub(crate) fn communication(message: impl Into<String>, request: impl Into<String>) -> Self {
        AnalysisError::Communication {
            message: message.into(),
            request: request.into(),
            response: None,
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AnalysisError::Communication {
                message, request, ..
            } => write!(f, "Communication error: {} (request: {})", message, request),
            AnalysisError::NoResource(url) => write!(f, "No resource at {} [no_resource]", url),
            AnalysisError::ForbiddenResource(url) => {
                write!(f, "Forbidden resource at {} [forbidden_resource]", url)
            }
            AnalysisError::BrokenResource(msg) => write!(f, "{} [broken_resource]", msg),
            AnalysisError::Storage(err) => write!(f, "Storage error: {}", err),
        }
    }
}

impl std::error::Error for AnalysisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnalysisError::Storage(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<ResourceError> for AnalysisError {
    fn from(err: ResourceError) -> Self {
        AnalysisError::Validation(err.to_string())
    }
}

impl From<FilesError> for AnalysisError {
    fn from(err: FilesError) -> Self {
        match err {
            FilesError::NotFound(url) => AnalysisError::NoResource(url),
            FilesError::Io(err) => AnalysisError::Storage(err),
            err @ (FilesError::InvalidContentType(_)
            | FilesError::InvalidUrl(_)
            | FilesError::Config(_)) => AnalysisError::Validation(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
