//! Type-routing store adapter
//!
//! The glue between the codecs and the blob store. `store` picks the first
//! applicable encoding (composite, then registered serializer, then the
//! generic fallback), writes the bytes, and returns the record the engine
//! indexes. `fetch` reverses the routing from the record's marker
//! alone.
//!
//! No state beyond the shared read-only context; safe to call from any
//! number of threads as long as the blob store serializes access per
//! locator.

use crate::backend::BlobStore;
use crate::record::{StorageMode, StoredRecord};
use recall_codec::{composite, CacheContext, CompositeKind};
use recall_core::tag::MARKER_GENERIC;
use recall_core::{Result, TypeTag, Value};
use std::sync::Arc;
use tracing::debug;

/// Routes values to the right codec on their way to and from the store
pub struct TypeRoutingStore {
    ctx: Arc<CacheContext>,
    blobs: Arc<dyn BlobStore>,
}

impl TypeRoutingStore {
    /// Create an adapter over a context and a blob store
    pub fn new(ctx: Arc<CacheContext>, blobs: Arc<dyn BlobStore>) -> Self {
        TypeRoutingStore { ctx, blobs }
    }

    /// The configuration context this adapter routes with
    pub fn context(&self) -> &CacheContext {
        &self.ctx
    }

    /// Encode and persist a value, returning its index record
    pub fn store(&self, value: &Value) -> Result<StoredRecord> {
        // Composite first: a container with registered children is taken
        // apart element-wise
        if let Some((kind, bytes)) = composite::encode(value, &self.ctx)? {
            debug!(marker = kind.marker(), "storing composite value");
            return self.write_record(&bytes, StorageMode::Binary, kind.marker().to_string());
        }

        // Exact-tag lookup for extension values
        if let Value::Ext(ext) = value {
            if let Some(serializer) = self.ctx.serializers().lookup(ext.tag()) {
                debug!(tag = %ext.tag(), "storing via registered serializer");
                let bytes = serializer.encode(value)?;
                return self.write_record(&bytes, StorageMode::Binary, ext.tag().to_string());
            }
        }

        // Generic fallback; an unregistered extension value errors in here
        debug!(kind = value.type_name(), "storing via generic codec");
        let bytes = recall_codec::fallback::encode(value)?;
        self.write_record(&bytes, StorageMode::Generic, MARKER_GENERIC.to_string())
    }

    /// Load and decode the value a record points at
    pub fn fetch(&self, record: &StoredRecord) -> Result<Value> {
        let bytes = self.blobs.read(&record.locator)?;

        // Reserved composite markers always win
        if let Some(kind) = CompositeKind::from_marker(&record.marker) {
            debug!(marker = %record.marker, "fetching composite value");
            return composite::decode(kind, &bytes, &self.ctx);
        }

        // A marker that parses as a tag and resolves in the registry uses
        // the registered decoder. Anything else is generic-decoded: the
        // generic sentinel, an unknown tag, a tag whose registration is gone
        if let Ok(tag) = TypeTag::parse(&record.marker) {
            if let Some(serializer) = self.ctx.serializers().lookup(&tag) {
                debug!(tag = %tag, "fetching via registered serializer");
                return serializer.decode(&bytes);
            }
        }
        debug!(marker = %record.marker, "fetching via generic codec");
        recall_codec::fallback::decode(&bytes)
    }

    fn write_record(
        &self,
        bytes: &[u8],
        mode: StorageMode,
        marker: String,
    ) -> Result<StoredRecord> {
        let locator = self.blobs.allocate();
        let size = self.blobs.write(&locator, bytes)?;
        Ok(StoredRecord {
            size,
            mode,
            locator,
            marker,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DirectoryStore;
    use recall_codec::{frame_tag, CacheContext};
    use recall_core::tag::{MARKER_LIST, MARKER_SET};
    use recall_core::{Column, Frame};
    use tempfile::TempDir;

    fn adapter(dir: &TempDir) -> TypeRoutingStore {
        TypeRoutingStore::new(
            Arc::new(CacheContext::with_defaults()),
            Arc::new(DirectoryStore::open(dir.path()).unwrap()),
        )
    }

    fn frame_value(rows: Vec<i64>) -> Value {
        Value::ext(
            frame_tag(),
            Frame::new(vec![Column::int("a", rows)]).unwrap(),
        )
    }

    #[test]
    fn test_plain_value_routes_generic() {
        let dir = TempDir::new().unwrap();
        let store = adapter(&dir);

        let value = Value::List(vec![Value::Int(1), Value::from("a")]);
        let record = store.store(&value).unwrap();
        assert_eq!(record.mode, StorageMode::Generic);
        assert_eq!(record.marker, MARKER_GENERIC);
        assert_eq!(store.fetch(&record).unwrap(), value);
    }

    #[test]
    fn test_registered_ext_routes_custom() {
        let dir = TempDir::new().unwrap();
        let store = adapter(&dir);

        let value = frame_value(vec![1, 2, 3]);
        let record = store.store(&value).unwrap();
        assert_eq!(record.mode, StorageMode::Binary);
        assert_eq!(record.marker, "frame.Frame");
        assert!(record.size > 0);
        assert_eq!(store.fetch(&record).unwrap(), value);
    }

    #[test]
    fn test_container_with_registered_child_routes_composite() {
        let dir = TempDir::new().unwrap();
        let store = adapter(&dir);

        let value = Value::List(vec![Value::Int(1), frame_value(vec![5])]);
        let record = store.store(&value).unwrap();
        assert_eq!(record.marker, MARKER_LIST);
        assert_eq!(record.mode, StorageMode::Binary);
        assert_eq!(store.fetch(&record).unwrap(), value);
    }

    #[test]
    fn test_set_roundtrip_through_adapter() {
        let dir = TempDir::new().unwrap();
        let store = adapter(&dir);

        let value = Value::set(vec![frame_value(vec![1]), Value::Int(2)]);
        let record = store.store(&value).unwrap();
        assert_eq!(record.marker, MARKER_SET);
        assert_eq!(store.fetch(&record).unwrap(), value);
    }

    #[test]
    fn test_unknown_tag_marker_falls_back_to_generic_decode() {
        let dir = TempDir::new().unwrap();
        let store = adapter(&dir);

        // Store a plain value, then pretend its marker is a tag that was
        // never registered: fetch must fall back to the generic codec and
        // still decode, because the bytes are generic
        let value = Value::Int(42);
        let mut record = store.store(&value).unwrap();
        record.marker = "gone.Type".to_string();
        assert_eq!(store.fetch(&record).unwrap(), value);
    }

    #[test]
    fn test_unregistered_ext_store_is_config_error() {
        let dir = TempDir::new().unwrap();
        let store = adapter(&dir);

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

        let value = Value::ext(TypeTag::parse("nope.Opaque").unwrap(), Opaque);
        assert!(matches!(
            store.store(&value),
            Err(recall_core::Error::UnregisteredType(_))
        ));
    }

    #[test]
    fn test_missing_blob_surfaces_io_error() {
        let dir = TempDir::new().unwrap();
        let store = adapter(&dir);

        let record = store.store(&Value::Int(1)).unwrap();
        std::fs::remove_file(dir.path().join(record.locator.as_str())).unwrap();
        assert!(matches!(
            store.fetch(&record),
            Err(recall_core::Error::Io(_))
        ));
    }
}
