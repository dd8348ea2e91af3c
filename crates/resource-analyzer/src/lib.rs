//! Web resource analyzer
//!
//! Fetches a URL, classifies its media type, runs it through a chain of
//! content handlers producing a [`Resource`], and caches the result. Handlers
//! may generate thumbnails, which are stored in a content-addressed
//! [`Files`] store.

pub mod analyzer;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod fetch;
pub mod handlers;
pub mod thumbnail;

#[cfg(test)]
mod test_server;

pub use analyzer::{Analyzer, AnalyzerBuilder};
pub use cache::{CacheStats, ResourceCache, CACHE_SIZE, CACHE_TTL_SECS};
pub use config::AnalyzerConfig;
pub use context::HandlerContext;
pub use content_file_store::{Files, FilesError};
pub use error::{AnalysisError, Result};
pub use fetch::Fetched;
pub use handlers::{default_handlers, handler_fn, Handler};
pub use web_resource::{Resource, ResourceKind, Thumbnail};
