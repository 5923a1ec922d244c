//! Cache configuration context
//!
//! The context bundles the serializer and hasher registries and is built
//! once at startup, then passed by `Arc` into the store adapter and the
//! cache-key builder. There is no ambient global registry: everything that
//! routes on type goes through a context the caller handed it.

use crate::registry::{HasherRegistry, SerializerRegistry};
use crate::serializer::{Serializer, ValueHasher};
use recall_core::TypeTag;
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable bundle of per-type capabilities
///
/// # Example
///
/// ```
/// use recall_codec::context::CacheContext;
///
/// let ctx = CacheContext::with_defaults();
/// assert!(ctx.serializers().is_registered(&recall_codec::tabular::frame_tag()));
/// ```
#[derive(Debug, Default)]
pub struct CacheContext {
    serializers: SerializerRegistry,
    hashers: HasherRegistry,
}

impl CacheContext {
    /// Start building a context
    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    /// A context with the stock registrations: the tabular frame codec and
    /// its serialize-then-digest hasher under the default frame tag.
    pub fn with_defaults() -> Self {
        let frame_codec = Arc::new(crate::tabular::FrameCodec);
        CacheContext::builder()
            .serializer(crate::tabular::frame_tag(), frame_codec.clone())
            .hasher(
                crate::tabular::frame_tag(),
                Arc::new(crate::hash::CodecHasher::new(frame_codec)),
            )
            .build()
    }

    /// The serializer registry
    pub fn serializers(&self) -> &SerializerRegistry {
        &self.serializers
    }

    /// The hasher registry
    pub fn hashers(&self) -> &HasherRegistry {
        &self.hashers
    }
}

/// Builder for [`CacheContext`]
///
/// Registration is last-write-wins: registering a second serializer for the
/// same tag replaces the first, silently. That mirrors how hosts override a
/// stock registration with their own.
#[derive(Default)]
pub struct ContextBuilder {
    serializers: HashMap<TypeTag, Arc<dyn Serializer>>,
    hashers: HashMap<TypeTag, Arc<dyn ValueHasher>>,
}

impl ContextBuilder {
    /// Register a serializer for a tag
    pub fn serializer(mut self, tag: TypeTag, serializer: Arc<dyn Serializer>) -> Self {
        self.serializers.insert(tag, serializer);
        self
    }

    /// Register a hasher for a tag
    pub fn hasher(mut self, tag: TypeTag, hasher: Arc<dyn ValueHasher>) -> Self {
        self.hashers.insert(tag, hasher);
        self
    }

    /// Freeze the registrations into an immutable context
    pub fn build(self) -> CacheContext {
        CacheContext {
            serializers: SerializerRegistry::from_map(self.serializers),
            hashers: HasherRegistry::from_map(self.hashers),
        }
    }
}
