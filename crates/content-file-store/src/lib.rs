//! Content-addressed file store
//!
//! Stores binary data on disk under a name derived from the SHA-256 digest of
//! its bytes plus an extension derived from its media type. Identical content is
//! stored once. The store keeps no reference counts: garbage collection is a
//! full sweep against a caller-supplied set of live URLs.

mod error;
mod files;
mod types;

pub use error::{FilesError, Result};
pub use files::Files;
pub use types::{content_type_for_extension, extension_for_content_type};
