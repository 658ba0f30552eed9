//! Key-to-path derivation
//!
//! Keys become relative paths: punctuation turns into directory separators,
//! so `user.42.profile` is stored at `user/42/profile.<ext>`.

use std::path::{Path, PathBuf};

/// Characters replaced by a directory separator.
pub const SEPARATOR_CHARS: [char; 14] = [
    '-', '.', '_', '\\', '*', '"', '?', '[', ']', ':', ';', '|', '=', ',',
];

/// Strips any directory prefix from a key, keeping its last component.
fn base_name(key: &str) -> &str {
    key.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}

// == Transform Key ==
/// Rewrites a key into its relative path form, without extension.
///
/// Directory prefixes are dropped, separator characters become `/` and runs
/// of `/` collapse to one.
pub fn transform_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in base_name(key).chars() {
        let c = if SEPARATOR_CHARS.contains(&c) { '/' } else { c };
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}

// == Path For Key ==
/// Returns the absolute cache file path for `key` under `root`.
///
/// Everything before the last separator is a subdirectory; the remainder
/// (possibly empty) is the file stem.
pub fn path_for_key(root: &Path, key: &str, extension: &str) -> PathBuf {
    let transformed = transform_key(key);
    let (dirs, stem) = match transformed.rfind('/') {
        Some(idx) => (&transformed[..idx], &transformed[idx + 1..]),
        None => ("", transformed.as_str()),
    };

    let mut path = root.to_path_buf();
    for segment in dirs.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path.push(format!("{}.{}", stem, extension));
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_key_nests() {
        assert_eq!(transform_key("user.42.profile"), "user/42/profile");
        assert_eq!(
            path_for_key(Path::new("/cache"), "user.42.profile", "cache"),
            PathBuf::from("/cache/user/42/profile.cache")
        );
    }

    #[test]
    fn test_every_separator_char() {
        assert_eq!(
            transform_key("a-b.c_d\\e*f\"g?h[i]j:k;l|m=n,o"),
            "a/b/c/d/e/f/g/h/i/j/k/l/m/n/o"
        );
    }

    #[test]
    fn test_runs_collapse() {
        assert_eq!(transform_key("a..--__b"), "a/b");
        assert_eq!(transform_key("deep.directory..creation"), "deep/directory/creation");
    }

    #[test]
    fn test_directory_prefix_is_dropped() {
        assert_eq!(transform_key("deep//directory/creation////test"), "test");
        assert_eq!(transform_key("/etc/passwd"), "passwd");
        assert_eq!(transform_key("trailing/slash/"), "slash");
    }

    #[test]
    fn test_plain_key_stays_flat() {
        assert_eq!(
            path_for_key(Path::new("/cache"), "testBasicString", "dat"),
            PathBuf::from("/cache/testBasicString.dat")
        );
    }

    #[test]
    fn test_leading_and_trailing_separators() {
        assert_eq!(
            path_for_key(Path::new("/cache"), ".hidden", "cache"),
            PathBuf::from("/cache/hidden.cache")
        );
        assert_eq!(
            path_for_key(Path::new("/cache"), "dir.", "cache"),
            PathBuf::from("/cache/dir/.cache")
        );
    }

    #[test]
    fn test_no_parent_traversal() {
        let path = path_for_key(Path::new("/cache"), "..", "cache");
        assert!(path.starts_with("/cache"));
        assert!(!path.to_string_lossy().contains(".."));
    }
}
