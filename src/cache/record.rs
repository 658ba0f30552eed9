//! Cache Record Module
//!
//! Defines the on-disk record, its JSON/gzip envelope and expiry resolution.

use std::io::{Read, Write};
use std::path::Path;

use chrono::Utc;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

// == Public Constants ==
/// Lifetime given to records stored without an expiry (10 years).
pub const NEVER_EXPIRE_SECS: i64 = 315_360_000;

/// Expiry values above this (30 days) are absolute Unix timestamps.
pub const RELATIVE_EXPIRY_LIMIT: i64 = 2_592_000;

/// Leading bytes of a gzip stream using deflate.
pub const GZIP_MAGIC: [u8; 3] = [0x1f, 0x8b, 0x08];

// == Cache Record ==
/// One cache file's decoded contents.
///
/// Serialized as `{"content": "...", "expiryTimestamp": 1700000000}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    /// Stored payload in its string form
    pub content: String,
    /// Absolute Unix time (seconds); `None` when a file lacks the field
    #[serde(default)]
    pub expiry_timestamp: Option<i64>,
}

impl CacheRecord {
    // == Constructor ==
    /// Creates a record expiring at the given absolute timestamp.
    pub fn new(content: String, expiry_timestamp: i64) -> Self {
        Self {
            content,
            expiry_timestamp: Some(expiry_timestamp),
        }
    }

    // == Is Expired ==
    /// Checks whether the record is expired at `now`.
    ///
    /// A record is expired once `now` reaches its expiry timestamp. Records
    /// without a timestamp are never considered live.
    pub fn is_expired_at(&self, now: i64) -> bool {
        match self.expiry_timestamp {
            Some(expiry) => expiry <= now,
            None => true,
        }
    }

    /// Checks whether the record is expired right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp())
    }

    // == Encode ==
    /// Serializes the record to JSON, gzip-wrapping it at level 9 when asked.
    pub fn encode(&self, gzip: bool) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(self).map_err(|e| CacheError::Encode(e.to_string()))?;
        if !gzip {
            return Ok(json);
        }

        let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
        encoder
            .write_all(&json)
            .map_err(|e| CacheError::Encode(format!("gzip: {}", e)))?;
        encoder
            .finish()
            .map_err(|e| CacheError::Encode(format!("gzip: {}", e)))
    }

    // == Decode ==
    /// Parses file bytes, transparently unwrapping a gzip envelope.
    ///
    /// Compression is detected from the magic header, not from configuration.
    pub fn decode(path: &Path, bytes: &[u8]) -> Result<Self> {
        let decode_err = |reason: String| CacheError::Decode {
            path: path.to_path_buf(),
            reason,
        };

        if is_gzip(bytes) {
            let mut json = Vec::new();
            GzDecoder::new(bytes)
                .read_to_end(&mut json)
                .map_err(|e| decode_err(format!("gzip: {}", e)))?;
            serde_json::from_slice(&json).map_err(|e| decode_err(e.to_string()))
        } else {
            serde_json::from_slice(bytes).map_err(|e| decode_err(e.to_string()))
        }
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in seconds.
pub fn current_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Returns true if `bytes` start with the gzip magic header.
pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// Turns a caller-supplied expiry into an absolute timestamp.
///
/// - `0` means "never" (now + 10 years)
/// - values above 30 days in seconds are absolute Unix timestamps
/// - anything else is an offset in seconds from `now`
pub fn resolve_expiry(expiry: i64, now: i64) -> i64 {
    if expiry == 0 {
        now + NEVER_EXPIRE_SECS
    } else if expiry > RELATIVE_EXPIRY_LIMIT {
        expiry
    } else {
        now + expiry
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_resolve_expiry_zero_means_never() {
        assert_eq!(resolve_expiry(0, NOW), NOW + NEVER_EXPIRE_SECS);
    }

    #[test]
    fn test_resolve_expiry_relative() {
        assert_eq!(resolve_expiry(60, NOW), NOW + 60);
        assert_eq!(
            resolve_expiry(RELATIVE_EXPIRY_LIMIT, NOW),
            NOW + RELATIVE_EXPIRY_LIMIT
        );
    }

    #[test]
    fn test_resolve_expiry_absolute() {
        assert_eq!(
            resolve_expiry(RELATIVE_EXPIRY_LIMIT + 1, NOW),
            RELATIVE_EXPIRY_LIMIT + 1
        );
        assert_eq!(resolve_expiry(NOW + 3600, NOW), NOW + 3600);
    }

    #[test]
    fn test_resolve_expiry_negative_is_in_past() {
        assert!(resolve_expiry(-10, NOW) < NOW);
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let record = CacheRecord::new("v".to_string(), NOW);
        assert!(record.is_expired_at(NOW), "Record should be expired at boundary");
        assert!(!record.is_expired_at(NOW - 1));
    }

    #[test]
    fn test_missing_expiry_counts_as_expired() {
        let record = CacheRecord::decode(Path::new("x"), br#"{"content":"v"}"#).unwrap();
        assert_eq!(record.expiry_timestamp, None);
        assert!(record.is_expired_at(0));
    }

    #[test]
    fn test_plain_encoding_field_names() {
        let record = CacheRecord::new("hello".to_string(), NOW);
        let bytes = record.encode(false).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.contains(r#""content":"hello""#));
        assert!(text.contains(r#""expiryTimestamp":1700000000"#));
    }

    #[test]
    fn test_gzip_encoding_has_magic_header() {
        let record = CacheRecord::new("hello".to_string(), NOW);
        let bytes = record.encode(true).unwrap();

        assert!(is_gzip(&bytes));
        assert_eq!(CacheRecord::decode(Path::new("x"), &bytes).unwrap(), record);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = CacheRecord::decode(Path::new(".keep"), b"");
        assert!(matches!(result, Err(CacheError::Decode { .. })));

        let result = CacheRecord::decode(Path::new("x"), b"not json");
        assert!(matches!(result, Err(CacheError::Decode { .. })));
    }

    #[test]
    fn test_decode_truncated_gzip_fails() {
        let record = CacheRecord::new("hello".to_string(), NOW);
        let bytes = record.encode(true).unwrap();
        let result = CacheRecord::decode(Path::new("x"), &bytes[..8]);
        assert!(matches!(result, Err(CacheError::Decode { .. })));
    }
}
