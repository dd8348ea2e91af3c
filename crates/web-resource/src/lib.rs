//! Web Resource Model
//!
//! Immutable value types describing a fetched, classified web resource and the
//! optional thumbnail generated for it, plus their JSON wire shape.

pub mod error;
pub mod types;

pub use error::{ResourceError, Result};
pub use types::{Resource, ResourceKind, Thumbnail};
