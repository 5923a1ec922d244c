//! Type-aware value hashing
//!
//! Cache-key digests come from here. A value whose tag has a registered
//! hasher uses it; everything else hashes through [`generic_digest`]:
//! SHA-256 over the value's serialized form, meaning the registered
//! codec's bytes for a registered extension value and the generic fallback
//! encoding otherwise.

use crate::context::CacheContext;
use crate::fallback;
use crate::serializer::{Serializer, ValueHasher};
use recall_core::{Result, Value};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Hex-encode a SHA-256 digest
pub(crate) fn hex_digest(hasher: Sha256) -> String {
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

/// SHA-256 over the value's serialized form
///
/// # Errors
///
/// Fails when the value cannot be serialized at all: an unregistered
/// extension value, or a codec failure.
pub fn generic_digest(value: &Value, ctx: &CacheContext) -> Result<String> {
    let bytes = match value {
        Value::Ext(ext) => match ctx.serializers().lookup(ext.tag()) {
            Some(serializer) => serializer.encode(value)?,
            None => fallback::encode(value)?,
        },
        _ => fallback::encode(value)?,
    };
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex_digest(hasher))
}

/// A hasher that digests a value through a specific serializer
///
/// The stock registration for frames: serialize with the frame codec, hash
/// the bytes. Content-equal values digest identically because the codec's
/// output is deterministic.
pub struct CodecHasher {
    serializer: Arc<dyn Serializer>,
}

impl CodecHasher {
    /// Wrap a serializer as a hasher
    pub fn new(serializer: Arc<dyn Serializer>) -> Self {
        CodecHasher { serializer }
    }
}

impl ValueHasher for CodecHasher {
    fn digest(&self, value: &Value) -> Result<String> {
        let bytes = self.serializer.encode(value)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(hex_digest(hasher))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabular::{frame_tag, FrameCodec};
    use recall_core::{Column, Error, Frame, TypeTag};

    fn frame_value(rows: Vec<i64>) -> Value {
        Value::ext(
            frame_tag(),
            Frame::new(vec![Column::int("a", rows)]).unwrap(),
        )
    }

    #[test]
    fn test_generic_digest_deterministic() {
        let ctx = CacheContext::builder().build();
        let v = Value::List(vec![Value::Int(1), Value::from("x")]);
        assert_eq!(
            generic_digest(&v, &ctx).unwrap(),
            generic_digest(&v, &ctx).unwrap()
        );
    }

    #[test]
    fn test_generic_digest_separates_content() {
        let ctx = CacheContext::builder().build();
        let a = generic_digest(&Value::Int(1), &ctx).unwrap();
        let b = generic_digest(&Value::Int(2), &ctx).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_generic_digest_uses_registered_codec_for_ext() {
        let ctx = CacheContext::with_defaults();
        let digest = generic_digest(&frame_value(vec![1, 2, 3]), &ctx).unwrap();
        assert_eq!(digest.len(), 64);

        // Content-identical but distinct frame objects digest identically
        let again = generic_digest(&frame_value(vec![1, 2, 3]), &ctx).unwrap();
        assert_eq!(digest, again);

        let different = generic_digest(&frame_value(vec![1, 2, 3, 4]), &ctx).unwrap();
        assert_ne!(digest, different);
    }

    #[test]
    fn test_generic_digest_unregistered_ext_fails() {
        #[derive(Debug)]
        struct Opaque;
        impl recall_core::Payload for Opaque {
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
            fn eq_payload(&self, _other: &dyn recall_core::Payload) -> bool {
                true
            }
        }

        let ctx = CacheContext::builder().build();
        let v = Value::ext(TypeTag::parse("test.Opaque").unwrap(), Opaque);
        assert!(matches!(
            generic_digest(&v, &ctx),
            Err(Error::UnregisteredType(_))
        ));
    }

    #[test]
    fn test_codec_hasher_matches_serialize_then_hash() {
        let hasher = CodecHasher::new(Arc::new(FrameCodec));
        let v = frame_value(vec![5, 6]);
        let via_hasher = hasher.digest(&v).unwrap();

        let bytes = FrameCodec.encode(&v).unwrap();
        let mut sha = Sha256::new();
        sha.update(&bytes);
        assert_eq!(via_hasher, hex_digest(sha));
    }
}
