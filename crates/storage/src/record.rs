//! Stored record metadata
//!
//! One record per cached value, owned and persisted by the store engine's
//! index. The `marker` field is the whole routing story: a reserved
//! composite marker sends the fetch to the composite codec, a resolvable
//! type tag to its registered serializer, anything else to the generic
//! codec.

use crate::backend::Locator;
use serde::{Deserialize, Serialize};

/// How the value's bytes were produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageMode {
    /// Custom or composite encoding
    Binary,
    /// Generic fallback encoding
    Generic,
}

/// Index entry describing one stored value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Total bytes written for this value
    pub size: u64,
    /// Encoding family
    pub mode: StorageMode,
    /// Where the bytes live
    pub locator: Locator,
    /// Decode-strategy discriminator: composite marker, type tag, or the
    /// generic sentinel
    pub marker: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serde_roundtrip() {
        let record = StoredRecord {
            size: 128,
            mode: StorageMode::Binary,
            locator: Locator::new("ab/abcdef.blob"),
            marker: "__list__".to_string(),
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: StoredRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_mode_distinguishes() {
        assert_ne!(StorageMode::Binary, StorageMode::Generic);
    }
}
