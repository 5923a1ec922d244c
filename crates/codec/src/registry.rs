//! Serializer and hasher registries
//!
//! The registries map a [`TypeTag`] to the capability registered for it.
//! Lookup is by exact tag, never by supertype or structural matching;
//! callers register concrete types explicitly.
//!
//! Both registries are populated once at configuration time through
//! [`crate::context::ContextBuilder`] and are immutable afterwards, so the
//! read path (hit on every store/fetch) is a pure map lookup with no
//! locking. Concurrent registration during live traffic is unsupported by
//! construction: there is no way to mutate a built registry.

use crate::serializer::{Serializer, ValueHasher};
use recall_core::TypeTag;
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable tag → serializer table
#[derive(Default)]
pub struct SerializerRegistry {
    by_tag: HashMap<TypeTag, Arc<dyn Serializer>>,
}

impl SerializerRegistry {
    pub(crate) fn from_map(by_tag: HashMap<TypeTag, Arc<dyn Serializer>>) -> Self {
        SerializerRegistry { by_tag }
    }

    /// Look up the serializer for a tag
    ///
    /// Absence is not an error: callers fall back to the generic codec.
    pub fn lookup(&self, tag: &TypeTag) -> Option<&dyn Serializer> {
        self.by_tag.get(tag).map(|s| s.as_ref())
    }

    /// Whether a serializer is registered for this tag
    pub fn is_registered(&self, tag: &TypeTag) -> bool {
        self.by_tag.contains_key(tag)
    }

    /// Number of registered serializers
    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }

    /// All registered tags, sorted
    pub fn tags(&self) -> Vec<&TypeTag> {
        let mut tags: Vec<&TypeTag> = self.by_tag.keys().collect();
        tags.sort_by_key(|t| t.as_str());
        tags
    }
}

impl std::fmt::Debug for SerializerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializerRegistry")
            .field("count", &self.by_tag.len())
            .field("tags", &self.tags())
            .finish()
    }
}

/// Immutable tag → hasher table
#[derive(Default)]
pub struct HasherRegistry {
    by_tag: HashMap<TypeTag, Arc<dyn ValueHasher>>,
}

impl HasherRegistry {
    pub(crate) fn from_map(by_tag: HashMap<TypeTag, Arc<dyn ValueHasher>>) -> Self {
        HasherRegistry { by_tag }
    }

    /// Look up the hasher for a tag
    pub fn lookup(&self, tag: &TypeTag) -> Option<&dyn ValueHasher> {
        self.by_tag.get(tag).map(|h| h.as_ref())
    }

    /// Whether a hasher is registered for this tag
    pub fn is_registered(&self, tag: &TypeTag) -> bool {
        self.by_tag.contains_key(tag)
    }

    /// Number of registered hashers
    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}

impl std::fmt::Debug for HasherRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HasherRegistry")
            .field("count", &self.by_tag.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::{Result, Value};

    struct NoopSerializer;

    impl Serializer for NoopSerializer {
        fn encode(&self, _value: &Value) -> Result<Vec<u8>> {
            Ok(vec![])
        }

        fn decode(&self, _bytes: &[u8]) -> Result<Value> {
            Ok(Value::Null)
        }
    }

    fn registry_with(tags: &[&str]) -> SerializerRegistry {
        let mut map: HashMap<TypeTag, Arc<dyn Serializer>> = HashMap::new();
        for tag in tags {
            map.insert(TypeTag::parse(tag).unwrap(), Arc::new(NoopSerializer));
        }
        SerializerRegistry::from_map(map)
    }

    #[test]
    fn test_lookup_hit_and_miss() {
        let registry = registry_with(&["test.Widget"]);
        let widget = TypeTag::parse("test.Widget").unwrap();
        let other = TypeTag::parse("test.Other").unwrap();

        assert!(registry.lookup(&widget).is_some());
        assert!(registry.lookup(&other).is_none());
        assert!(registry.is_registered(&widget));
        assert!(!registry.is_registered(&other));
    }

    #[test]
    fn test_empty_registry() {
        let registry = SerializerRegistry::default();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_tags_sorted() {
        let registry = registry_with(&["b.B", "a.A", "c.C"]);
        let tags: Vec<&str> = registry.tags().iter().map(|t| t.as_str()).collect();
        assert_eq!(tags, vec!["a.A", "b.B", "c.C"]);
    }

    #[test]
    fn test_registry_debug() {
        let registry = registry_with(&["test.Widget"]);
        let debug = format!("{:?}", registry);
        assert!(debug.contains("SerializerRegistry"));
        assert!(debug.contains("test.Widget"));
    }
}
