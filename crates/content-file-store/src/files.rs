//! File storage keyed by content digest

use crate::error::{FilesError, Result};
use crate::types::{content_type_for_extension, extension_for_content_type};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::{debug, info, warn};
use url::Url;

const URL_PREFIX: &str = "file:/";

/// Suffix counter for temporary files, unique within the process
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Content-addressed file store rooted at a directory
///
/// Files are named `<sha256 hex><extension>` and addressed by `file:/<name>`
/// URLs. Hidden files (leading `.`) are in-flight writes and never count as
/// stored files.
#[derive(Debug, Clone)]
pub struct Files {
    path: PathBuf,
}

impl Files {
    /// Create a store rooted at `path`. Call [`Files::init`] before use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the base directory exists and is writable
    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.path).await?;
        let metadata = fs::metadata(&self.path).await?;
        if !metadata.is_dir() {
            return Err(FilesError::Config(format!(
                "{} is not a directory",
                self.path.display()
            )));
        }
        if metadata.permissions().readonly() {
            return Err(FilesError::Config(format!(
                "{} is not writable",
                self.path.display()
            )));
        }
        info!(path = ?self.path, "File store initialized");
        Ok(())
    }

    /// Hex-encoded SHA-256 digest of `data`
    pub fn digest(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    /// Store `data` and return its `file:/` URL
    ///
    /// Writing the same bytes with the same content type again returns the
    /// same URL without storing a second copy.
    pub async fn write(&self, data: &[u8], content_type: &str) -> Result<String> {
        let extension = extension_for_content_type(content_type)
            .ok_or_else(|| FilesError::InvalidContentType(content_type.to_string()))?;
        let name = format!("{}{}", Self::digest(data), extension);
        let url = format!("{}{}", URL_PREFIX, name);
        let path = self.path.join(&name);

        if fs::try_exists(&path).await? {
            debug!(name = %name, "File already stored");
            return Ok(url);
        }

        // Concurrent writers of the same content each rename a complete file
        // into place, so readers never observe a partial one.
        let temp = self.path.join(format!(
            ".{}.{}.{}.tmp",
            name,
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&temp, data).await?;
        if let Err(e) = fs::rename(&temp, &path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }

        info!(name = %name, size = data.len(), "Stored file");
        Ok(url)
    }

    /// Read a stored file, returning `(data, content_type)`
    pub async fn read(&self, url: &str) -> Result<(Vec<u8>, String)> {
        let name = file_name(url)?;
        let content_type = name
            .rfind('.')
            .and_then(|i| content_type_for_extension(&name[i..]))
            .ok_or_else(|| FilesError::NotFound(url.to_string()))?;

        match fs::read(self.path.join(&name)).await {
            Ok(data) => Ok((data, content_type.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(FilesError::NotFound(url.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete every stored file not named by `references`, returning the count
    ///
    /// `references` must be the complete set of live URLs: anything missing
    /// from it is deleted, and an empty set empties the store. URLs that do not
    /// belong to the store are ignored.
    pub async fn garbage_collect<I, S>(&self, references: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let referenced: HashSet<String> = references
            .into_iter()
            .filter_map(|url| file_name(url.as_ref()).ok())
            .collect();

        let mut deleted = 0;
        let mut entries = fs::read_dir(&self.path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if name.starts_with('.') || referenced.contains(name) {
                continue;
            }
            if !entry.file_type().await?.is_file() {
                continue;
            }
            match fs::remove_file(entry.path()).await {
                Ok(()) => {
                    debug!(name = %name, "Deleted unreferenced file");
                    deleted += 1;
                }
                // Removed by a concurrent pass
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(name = %name, error = %e, "Failed to delete unreferenced file");
                    return Err(e.into());
                }
            }
        }

        info!(deleted, referenced = referenced.len(), "Collected garbage");
        Ok(deleted)
    }
}

/// Extract the stored file name from a `file:` URL
fn file_name(url: &str) -> Result<String> {
    let invalid = || FilesError::InvalidUrl(url.to_string());
    let parsed = Url::parse(url).map_err(|_| invalid())?;
    if parsed.scheme() != "file" || parsed.host_str().is_some_and(|h| !h.is_empty()) {
        return Err(invalid());
    }

    let name = parsed.path().strip_prefix('/').unwrap_or(parsed.path());
    if name.is_empty() || name.starts_with('.') || name.contains(&['/', '\\'][..]) {
        return Err(invalid());
    }
    Ok(name.to_string())
}
