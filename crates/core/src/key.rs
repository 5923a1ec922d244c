//! Cache key type
//!
//! A cache key is a `(version, digest)` pair. The digest is derived from a
//! function's bound arguments by the key builder; the version is supplied by
//! the caller and participates verbatim, so bumping it invalidates every
//! prior entry without touching stored data.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lookup key for a memoized result
///
/// Opaque to the store engine; equality and hashing are all it needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// Caller-supplied cache version
    pub version: u64,
    /// Hex digest over the normalized arguments
    pub digest: String,
}

impl CacheKey {
    /// Create a key from a version and an argument digest
    pub fn new(version: u64, digest: String) -> Self {
        CacheKey { version, digest }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}:{}", self.version, self.digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_equality() {
        let a = CacheKey::new(1, "abc".to_string());
        let b = CacheKey::new(1, "abc".to_string());
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_version_separates() {
        let a = CacheKey::new(1, "abc".to_string());
        let b = CacheKey::new(2, "abc".to_string());
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_display() {
        let k = CacheKey::new(3, "deadbeef".to_string());
        assert_eq!(k.to_string(), "v3:deadbeef");
    }

    #[test]
    fn test_key_serde_roundtrip() {
        let k = CacheKey::new(7, "0011".to_string());
        let json = serde_json::to_string(&k).unwrap();
        let back: CacheKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, k);
    }
}
