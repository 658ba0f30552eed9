//! Cache Store Module
//!
//! Main cache engine: one file per key under the configured directory, with
//! expiry checking on read and tree-wide maintenance (clean/flush).
//!
//! There is no locking. Concurrent writers to one key race and the last
//! rename wins; writes go through a temp file so readers never observe a
//! partially written record.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::cache::path::path_for_key;
use crate::cache::record::{current_timestamp, resolve_expiry, CacheRecord};
use crate::cache::{CacheValue, KEEP_FILE_NAME};
use crate::config::{CacheConfig, ConfigUpdate};
use crate::error::{CacheError, Result};

// == File Cache ==
/// Filesystem-backed key/value cache.
///
/// The directory tree is the index: nothing is held in memory apart from
/// the configuration, so any number of instances may point at one directory.
#[derive(Debug, Clone, Default)]
pub struct FileCache {
    config: CacheConfig,
}

impl FileCache {
    // == Constructor ==
    /// Creates a cache with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache with the given configuration.
    pub fn with_config(config: CacheConfig) -> Self {
        Self { config }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Change Config ==
    /// Merges an option map such as `{"gzipCompression": false}` into the
    /// configuration.
    ///
    /// Fails with `InvalidConfig`, leaving the configuration untouched, if
    /// any key is unknown or any value has the wrong type.
    pub fn change_config(&mut self, options: serde_json::Value) -> Result<()> {
        let update = ConfigUpdate::from_options(options)?;
        self.apply_config(update);
        Ok(())
    }

    /// Merges a typed partial configuration.
    pub fn apply_config(&mut self, update: ConfigUpdate) {
        self.config.apply(update);
        debug!("Configuration updated: {:?}", self.config);
    }

    /// Returns the file path used for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        path_for_key(
            &self.config.cache_directory,
            key,
            &self.config.file_extension,
        )
    }

    // == Set ==
    /// Stores `content` under `key`, replacing any existing entry.
    ///
    /// `expiry` is `0` for "never", a relative number of seconds up to 30
    /// days, or an absolute Unix timestamp above that. Nothing is written if
    /// the resolved timestamp is already in the past.
    pub fn set(&self, key: &str, content: impl Into<CacheValue>, expiry: i64) -> Result<()> {
        let now = current_timestamp();
        let expiry_timestamp = resolve_expiry(expiry, now);
        if expiry_timestamp < now {
            debug!("Refusing to store {}: expiry {} already passed", key, expiry_timestamp);
            return Err(CacheError::ExpiryInPast(expiry_timestamp));
        }

        let value: CacheValue = content.into();
        let record = CacheRecord::new(value.to_content()?, expiry_timestamp);
        let bytes = record.encode(self.config.gzip_compression)?;

        let path = self.path_for(key);
        write_atomic(&path, &bytes)?;
        debug!("Stored {} at {} ({} bytes)", key, path.display(), bytes.len());
        Ok(())
    }

    // == Get ==
    /// Retrieves the value for `key` if present and not expired.
    pub fn get(&self, key: &str) -> Result<CacheValue> {
        let record = self.get_object(key)?;
        if record.is_expired_at(current_timestamp()) {
            debug!("Cache entry {} has expired", key);
            return Err(CacheError::Expired(key.to_string()));
        }
        Ok(CacheValue::from_content(record.content))
    }

    // == Get Last ==
    /// Returns the raw stored content for `key`, ignoring expiry.
    ///
    /// The content is not converted back into a structured value.
    pub fn get_last(&self, key: &str) -> Result<String> {
        self.get_object(key).map(|record| record.content)
    }

    // == Get Object ==
    /// Reads and decodes the record stored for `key`.
    pub fn get_object(&self, key: &str) -> Result<CacheRecord> {
        self.get_object_at(&self.path_for(key)).map_err(|e| match e {
            CacheError::NotFound(_) => CacheError::NotFound(key.to_string()),
            other => other,
        })
    }

    /// Reads and decodes the record stored at an absolute file path.
    ///
    /// Gzip is detected from the file header, whatever the current
    /// configuration says.
    pub fn get_object_at(&self, path: &Path) -> Result<CacheRecord> {
        let bytes = fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CacheError::NotFound(path.display().to_string()),
            _ => CacheError::io(path, e),
        })?;
        CacheRecord::decode(path, &bytes)
    }

    // == Delete ==
    /// Removes the entry for `key`.
    pub fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Deleted {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(CacheError::NotFound(key.to_string()))
            }
            Err(e) => Err(CacheError::io(path, e)),
        }
    }

    // == Replace ==
    /// Overwrites the entry for `key` only if it currently holds a live,
    /// truthy value.
    pub fn replace(&self, key: &str, content: impl Into<CacheValue>, expiry: i64) -> Result<()> {
        if !self.get(key)?.is_truthy() {
            return Err(CacheError::FalsyValue(key.to_string()));
        }
        self.set(key, content, expiry)
    }

    // == Flush ==
    /// Deletes every file and directory under the cache root, except files
    /// named `.keep` and the directories that still hold them.
    ///
    /// Stops at the first failed deletion; anything removed before that
    /// stays removed.
    pub fn flush(&self) -> Result<()> {
        let root = &self.config.cache_directory;
        if !root.exists() {
            return Ok(());
        }

        let mut removed = 0usize;
        for entry in WalkDir::new(root).min_depth(1).contents_first(true) {
            let entry = entry.map_err(walk_error)?;
            let path = entry.path();

            if entry.file_type().is_dir() {
                let is_empty = fs::read_dir(path)
                    .map_err(|e| CacheError::io(path, e))?
                    .next()
                    .is_none();
                if is_empty {
                    fs::remove_dir(path).map_err(|e| CacheError::io(path, e))?;
                }
            } else if entry.file_name() != KEEP_FILE_NAME {
                fs::remove_file(path).map_err(|e| {
                    warn!("Flush failed on {}: {}", path.display(), e);
                    CacheError::io(path, e)
                })?;
                removed += 1;
            }
        }

        info!("Flushed {} cache files from {}", removed, root.display());
        Ok(())
    }

    // == Clean ==
    /// Removes every entry whose expiry has passed.
    ///
    /// Files that do not decode as records (such as `.keep`) are skipped.
    /// Returns the number of entries removed.
    pub fn clean(&self) -> Result<usize> {
        let root = &self.config.cache_directory;
        if !root.exists() {
            return Ok(0);
        }

        let now = current_timestamp();
        let mut removed = 0usize;
        for entry in WalkDir::new(root).min_depth(1) {
            let entry = entry.map_err(walk_error)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let record = match self.get_object_at(path) {
                Ok(record) => record,
                Err(CacheError::Decode { reason, .. }) => {
                    debug!("Skipping {}: {}", path.display(), reason);
                    continue;
                }
                // Removed by someone else mid-walk
                Err(CacheError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            };

            if record.is_expired_at(now) {
                fs::remove_file(path).map_err(|e| {
                    warn!("Clean failed on {}: {}", path.display(), e);
                    CacheError::io(path, e)
                })?;
                removed += 1;
            }
        }

        if removed > 0 {
            info!("Cache clean: removed {} expired entries", removed);
        } else {
            debug!("Cache clean: no expired entries found");
        }
        Ok(removed)
    }
}

// == Utility Functions ==
/// Writes `bytes` to `path` through a sibling temp file and a rename,
/// creating parent directories first.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) => parent,
        None => return Err(CacheError::io(path, io::ErrorKind::InvalidInput.into())),
    };
    fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;

    let mut tmp = temp_file_in(parent).map_err(|e| CacheError::io(parent, e))?;
    tmp.write_all(bytes)
        .map_err(|e| CacheError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| CacheError::io(path, e.error))?;
    Ok(())
}

/// Creates a temp file that ends up with the usual `0666 & !umask` mode
/// once persisted.
fn temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    #[allow(unused_mut)]
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

fn walk_error(err: walkdir::Error) -> CacheError {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    CacheError::io(path, io::Error::from(err))
}

// == One-shot Helpers ==
/// Stores a value through a fresh cache instance, optionally configured
/// with `config` first.
pub fn store(
    key: &str,
    data: impl Into<CacheValue>,
    expiry: i64,
    config: Option<serde_json::Value>,
) -> Result<()> {
    let mut cache = FileCache::new();
    if let Some(options) = config {
        cache.change_config(options)?;
    }
    cache.set(key, data, expiry)
}

/// Reads a value through a fresh cache instance, optionally configured
/// with `config` first.
pub fn read(key: &str, config: Option<serde_json::Value>) -> Result<CacheValue> {
    let mut cache = FileCache::new();
    if let Some(options) = config {
        cache.change_config(options)?;
    }
    cache.get(key)
}
