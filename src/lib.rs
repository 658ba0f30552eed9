//! File Cache - A filesystem-backed key/value cache
//!
//! Values are serialized into a small JSON record, optionally gzip-compressed,
//! and written to a path derived from the key. Reads check the record's
//! expiry timestamp.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{read, store, CacheRecord, CacheValue, FileCache};
pub use config::{CacheConfig, ConfigUpdate};
pub use error::{CacheError, Result};
pub use tasks::spawn_cleanup_task;
