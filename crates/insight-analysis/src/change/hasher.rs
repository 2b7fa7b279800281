//! Content hashing via xxh3.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

/// Compute the xxh3 64-bit hash of file content.
#[inline]
pub fn hash_content(content: &[u8]) -> u64 {
    xxh3_64(content)
}

/// Hex digest of a file's content. Empty when the file could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileDigest(String);

impl FileDigest {
    /// The digest of an unreadable file. Never equal to a cached digest.
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn of_bytes(content: &[u8]) -> Self {
        Self(format!("{:016x}", hash_content(content)))
    }

    /// Hash a file on disk. Read errors yield [`FileDigest::empty`].
    pub fn of_file(path: &Path) -> Self {
        match fs::read(path) {
            Ok(content) => Self::of_bytes(&content),
            Err(_) => Self::empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_hash() {
        let data = b"hello world";
        assert_eq!(hash_content(data), hash_content(data));
    }

    #[test]
    fn single_byte_change_changes_digest() {
        assert_ne!(FileDigest::of_bytes(b"hello"), FileDigest::of_bytes(b"hellp"));
    }

    #[test]
    fn digest_is_sixteen_hex_chars() {
        let d = FileDigest::of_bytes(b"");
        assert_eq!(d.as_str().len(), 16);
        assert!(!d.is_empty());
    }

    #[test]
    fn unreadable_file_has_empty_digest() {
        assert!(FileDigest::of_file(Path::new("/definitely/not/here")).is_empty());
    }
}
