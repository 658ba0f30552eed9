//! Configuration Module
//!
//! Holds the per-instance cache configuration and the partial updates merged
//! into it by `FileCache::change_config`.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Directory name used under the system temp dir when nothing else is set.
pub const DEFAULT_DIRECTORY_NAME: &str = "rwFileCacheStorage";

/// Default suffix for generated cache file names.
pub const DEFAULT_FILE_EXTENSION: &str = "cache";

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    /// Whether newly written records are gzip-compressed
    pub gzip_compression: bool,
    /// Root directory for all cache files
    pub cache_directory: PathBuf,
    /// Suffix appended to generated file paths
    pub file_extension: String,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `FILE_CACHE_DIR` - Cache root directory (default: `<tmp>/rwFileCacheStorage`)
    /// - `FILE_CACHE_GZIP` - `true`/`false` (default: true)
    /// - `FILE_CACHE_EXTENSION` - File suffix (default: `cache`)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            gzip_compression: env::var("FILE_CACHE_GZIP")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.gzip_compression),
            cache_directory: env::var("FILE_CACHE_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_directory),
            file_extension: env::var("FILE_CACHE_EXTENSION")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.file_extension),
        }
    }

    // == Apply ==
    /// Merges every field present in `update`, leaving the others untouched.
    pub fn apply(&mut self, update: ConfigUpdate) {
        if let Some(gzip) = update.gzip_compression {
            self.gzip_compression = gzip;
        }
        if let Some(dir) = update.cache_directory {
            self.cache_directory = dir;
        }
        if let Some(ext) = update.file_extension {
            self.file_extension = ext;
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            gzip_compression: true,
            cache_directory: env::temp_dir().join(DEFAULT_DIRECTORY_NAME),
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
        }
    }
}

// == Config Update ==
/// A partial configuration, as accepted by `change_config`.
///
/// Option names use the camelCase spelling (`gzipCompression`,
/// `cacheDirectory`, `fileExtension`); any other key is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub gzip_compression: Option<bool>,
    #[serde(default)]
    pub cache_directory: Option<PathBuf>,
    #[serde(default)]
    pub file_extension: Option<String>,
}

impl ConfigUpdate {
    /// Parses an option map. Fails without side effects on a non-object,
    /// an unrecognized key or a mistyped value.
    pub fn from_options(options: serde_json::Value) -> Result<Self> {
        if !options.is_object() {
            return Err(CacheError::InvalidConfig(format!(
                "expected an option map, got {}",
                options
            )));
        }
        serde_json::from_value(options).map_err(|e| CacheError::InvalidConfig(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert!(config.gzip_compression);
        assert!(config.cache_directory.ends_with(DEFAULT_DIRECTORY_NAME));
        assert_eq!(config.file_extension, "cache");
    }

    #[test]
    fn test_config_from_env_defaults() {
        env::remove_var("FILE_CACHE_DIR");
        env::remove_var("FILE_CACHE_GZIP");
        env::remove_var("FILE_CACHE_EXTENSION");

        let config = CacheConfig::from_env();
        assert_eq!(config, CacheConfig::default());
    }

    #[test]
    fn test_update_merges_only_given_fields() {
        let mut config = CacheConfig::default();
        let update = ConfigUpdate::from_options(json!({ "gzipCompression": false })).unwrap();
        config.apply(update);

        assert!(!config.gzip_compression);
        assert_eq!(config.file_extension, "cache");
    }

    #[test]
    fn test_update_all_fields() {
        let mut config = CacheConfig::default();
        let update = ConfigUpdate::from_options(json!({
            "gzipCompression": false,
            "cacheDirectory": "/var/tmp/store/",
            "fileExtension": "dat",
        }))
        .unwrap();
        config.apply(update);

        assert_eq!(config.cache_directory, PathBuf::from("/var/tmp/store/"));
        assert_eq!(config.file_extension, "dat");
    }

    #[test]
    fn test_update_rejects_unknown_key() {
        let result = ConfigUpdate::from_options(json!({
            "gzipCompression": false,
            "maxEntries": 10,
        }));
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_update_rejects_non_object() {
        let result = ConfigUpdate::from_options(json!("invalid_data"));
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_update_rejects_wrong_type() {
        let result = ConfigUpdate::from_options(json!({ "gzipCompression": "yes" }));
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }
}
