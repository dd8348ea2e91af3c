//! Error types for the file store

use std::fmt;

#[derive(Debug)]
pub enum FilesError {
    /// No extension is known for the content type
    InvalidContentType(String),
    /// The URL is not a plain file store URL
    InvalidUrl(String),
    /// No stored file for the URL
    NotFound(String),
    Io(Box<std::io::Error>),
    Config(String),
}

impl fmt::Display for FilesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilesError::InvalidContentType(ct) => write!(f, "Unknown content type: {}", ct),
            FilesError::InvalidUrl(url) => write!(f, "Invalid file URL: {}", url),
            FilesError::NotFound(url) => write!(f, "File not found: {}", url),
            FilesError::Io(err) => write!(f, "IO error: {}", err),
            FilesError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for FilesError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FilesError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FilesError {
    fn from(err: std::io::Error) -> Self {
        FilesError::Io(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, FilesError>;
