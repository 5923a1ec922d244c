//! Error types for the recall cache
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Note that failing to resolve a persisted type tag back to a registered
//! serializer is deliberately NOT represented here: resolution failure is
//! absence, and every decode path recovers from it by falling back to the
//! generic codec. Everything below is fatal to the call that raised it.

use crate::tag::TagError;
use std::io;
use thiserror::Error;

/// Result type alias for recall operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the recall cache
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the underlying storage medium. Propagated verbatim;
    /// no retries are performed at this layer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error in a codec
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A serializer was invoked on a value of the wrong type
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// What the serializer was registered for
        expected: String,
        /// What it was actually handed
        actual: String,
    },

    /// A composite manifest could not be parsed, or its declared length
    /// disagrees with the number of descriptors present
    #[error("Corrupt manifest: {0}")]
    CorruptManifest(String),

    /// Data corruption detected (bad magic, checksum mismatch, truncation)
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// An extension value with no registered serializer reached a codec.
    /// The generic codec only covers structural types; extension types
    /// must be registered at configuration time.
    #[error("No serializer registered for extension type {0}")]
    UnregisteredType(String),

    /// Type tag validation failure
    #[error("Invalid type tag: {0}")]
    InvalidTag(#[from] TagError),

    /// Frame column validation failure
    #[error("Invalid column {name}: {reason}")]
    InvalidColumn {
        /// Column name
        name: String,
        /// What went wrong
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_io() {
        let err = Error::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        let msg = err.to_string();
        assert!(msg.contains("I/O error"));
    }

    #[test]
    fn test_error_display_serialization() {
        let err = Error::Serialization("invalid format".to_string());
        let msg = err.to_string();
        assert!(msg.contains("Serialization error"));
        assert!(msg.contains("invalid format"));
    }

    #[test]
    fn test_error_display_type_mismatch() {
        let err = Error::TypeMismatch {
            expected: "frame.Frame".to_string(),
            actual: "Int".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("frame.Frame"));
        assert!(msg.contains("Int"));
    }

    #[test]
    fn test_error_display_corrupt_manifest() {
        let err = Error::CorruptManifest("declared length 3, found 2 descriptors".to_string());
        let msg = err.to_string();
        assert!(msg.contains("Corrupt manifest"));
    }

    #[test]
    fn test_error_display_unregistered_type() {
        let err = Error::UnregisteredType("mylib.Widget".to_string());
        let msg = err.to_string();
        assert!(msg.contains("mylib.Widget"));
    }

    #[test]
    fn test_error_from_tag_error() {
        let err: Error = TagError::Empty.into();
        assert!(matches!(err, Error::InvalidTag(TagError::Empty)));
    }
}
