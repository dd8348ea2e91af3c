use crate::cache::{CACHE_SIZE, CACHE_TTL_SECS};
use crate::fetch::{DEFAULT_MAX_SIZE, DEFAULT_TIMEOUT_SECS};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use tracing::warn;

/// Analyzer configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Base directory of the file store; no thumbnails without one
    pub files_path: Option<PathBuf>,
    /// API keys of video services by service name, e.g. `youtube`
    pub video_service_keys: HashMap<String, String>,
    pub http_timeout_secs: u64,
    /// Largest accepted response body in bytes
    pub max_resource_size: usize,
    pub cache_size: usize,
    pub cache_ttl_secs: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            files_path: None,
            video_service_keys: HashMap::new(),
            http_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_resource_size: DEFAULT_MAX_SIZE,
            cache_size: CACHE_SIZE,
            cache_ttl_secs: CACHE_TTL_SECS,
        }
    }
}

impl AnalyzerConfig {
    /// Parse configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Parse configuration from a variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let files_path = lookup("FILES_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let video_service_keys = lookup("VIDEO_SERVICE_KEYS")
            .map(|s| parse_video_service_keys(&s))
            .unwrap_or_default();

        let http_timeout_secs = lookup("HTTP_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.http_timeout_secs);

        let max_resource_size = lookup("MAX_RESOURCE_SIZE")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.max_resource_size);

        let cache_size = lookup("CACHE_SIZE")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.cache_size);

        let cache_ttl_secs = lookup("CACHE_TTL_SECS")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.cache_ttl_secs);

        Self {
            files_path,
            video_service_keys,
            http_timeout_secs,
            max_resource_size,
            cache_size,
            cache_ttl_secs,
        }
    }
}

/// Parse whitespace-separated `name key` pairs
fn parse_video_service_keys(value: &str) -> HashMap<String, String> {
    let words: Vec<&str> = value.split_whitespace().collect();
    let pairs = words.chunks_exact(2);
    if !pairs.remainder().is_empty() {
        warn!(
            service = pairs.remainder()[0],
            "Ignoring video service without key"
        );
    }
    pairs
        .map(|pair| (pair[0].to_ascii_lowercase(), pair[1].to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(vars: &[(&str, &str)]) -> AnalyzerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AnalyzerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert!(config.files_path.is_none());
        assert!(config.video_service_keys.is_empty());
        assert_eq!(config.http_timeout_secs, 20);
        assert_eq!(config.max_resource_size, 5 * 1024 * 1024);
        assert_eq!(config.cache_size, 128);
        assert_eq!(config.cache_ttl_secs, 3600);
    }

    #[test]
    fn test_from_lookup() {
        let config = config(&[
            ("FILES_PATH", "/var/lib/files"),
            ("VIDEO_SERVICE_KEYS", "youtube ABC\n vimeo  XYZ"),
            ("HTTP_TIMEOUT_SECS", "5"),
            ("MAX_RESOURCE_SIZE", "1048576"),
            ("CACHE_SIZE", " 16 "),
            ("CACHE_TTL_SECS", "60"),
        ]);
        assert_eq!(config.files_path, Some(PathBuf::from("/var/lib/files")));
        assert_eq!(config.video_service_keys.len(), 2);
        assert_eq!(config.video_service_keys["youtube"], "ABC");
        assert_eq!(config.video_service_keys["vimeo"], "XYZ");
        assert_eq!(config.http_timeout_secs, 5);
        assert_eq!(config.max_resource_size, 1048576);
        assert_eq!(config.cache_size, 16);
        assert_eq!(config.cache_ttl_secs, 60);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config(&[
            ("FILES_PATH", "  "),
            ("HTTP_TIMEOUT_SECS", "soon"),
            ("CACHE_SIZE", "-1"),
        ]);
        assert!(config.files_path.is_none());
        assert_eq!(config.http_timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.cache_size, CACHE_SIZE);
    }

    #[test]
    fn test_parse_video_service_keys() {
        let keys = parse_video_service_keys("YouTube ABC dangling");
        assert_eq!(keys.len(), 1);
        assert_eq!(keys["youtube"], "ABC");
        assert!(parse_video_service_keys("").is_empty());
    }
}
