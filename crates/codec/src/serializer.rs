//! Serializer trait definition.
//!
//! A serializer is a capability, not a value: encode a [`Value`] of one
//! specific extension type to bytes, and decode those bytes back. Exactly
//! one serializer per tag is registered at a time.
//!
//! # Thread Safety
//!
//! Serializers must be `Send + Sync`; the registry is shared across threads
//! and every store/fetch call goes through it.
//!
//! # Contract
//!
//! A serializer handed a value it was not registered for must fail with
//! `Error::TypeMismatch`, never coerce or silently fall back. Fallback decisions
//! belong to the routing layer, which only invokes a serializer after an
//! exact tag match.

use recall_core::{Result, Value};

/// Bidirectional encode/decode capability for one extension type.
pub trait Serializer: Send + Sync {
    /// Encode a value to its on-disk representation.
    fn encode(&self, value: &Value) -> Result<Vec<u8>>;

    /// Decode bytes produced by `encode` back into a value.
    fn decode(&self, bytes: &[u8]) -> Result<Value>;
}

/// Digest capability used by the cache-key builder.
///
/// Registered per tag, like serializers. Unregistered types hash through
/// the generic digest (SHA-256 of the value's serialized form).
pub trait ValueHasher: Send + Sync {
    /// Produce a stable hex digest of the value's content.
    fn digest(&self, value: &Value) -> Result<String>;
}
