//! Persistent function-result cache with pluggable type-routing
//! serialization
//!
//! recall memoizes expensive function results on disk. Values with a
//! registered serializer are stored in a type-appropriate format (frames go
//! to a columnar container, arrays to a compact binary encoding); values
//! without one get a working generic encoding; containers mixing both are
//! taken apart element-wise. Cache keys derive from the function's bound
//! arguments with type-aware hashing, plus a caller version for instant
//! invalidation.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use recall::{CacheConfig, CacheContext, Memo, Value};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let memo = Memo::open(dir.path(), Arc::new(CacheContext::with_defaults()));
//!
//! let x = Value::Int(21);
//! let result = memo
//!     .cached("double", CacheConfig::new(0), &[("x", &x)], || {
//!         Ok(Value::Int(42)) // expensive computation goes here
//!     })
//!     .unwrap();
//! assert_eq!(result, Value::Int(42));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memo;
pub mod settings;

pub use memo::{CacheConfig, Memo};
pub use settings::{CacheSettings, CONFIG_FILE_NAME};

pub use recall_codec::{
    build_cache_key, frame_tag, CacheContext, CodecHasher, ContextBuilder, FrameCodec,
    Serializer, ValueHasher, SERIALIZER_METADATA_KEY,
};
pub use recall_core::{
    CacheKey, Cell, Column, DType, Error, Frame, NdArray, Payload, Result, TypeTag, Value,
};
pub use recall_storage::{
    BlobStore, Cache, DirectoryStore, Locator, StorageMode, StoredRecord, TypeRoutingStore,
};
