//! Type-routing codecs for the recall cache
//!
//! This crate decides how a value turns into bytes and back:
//! - serializer: the per-type encode/decode capability traits
//! - registry / context: immutable capability tables built at startup
//! - fallback: the generic MessagePack codec for structural values
//! - composite: element-wise encoding for containers holding registered
//!   extension values
//! - columnar / tabular: the frame container format and the array-packing
//!   frame codec
//! - hash / keys: type-aware digests and the cache-key builder

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod columnar;
pub mod composite;
pub mod context;
pub mod fallback;
pub mod hash;
pub mod keys;
pub mod registry;
pub mod serializer;
pub mod tabular;

pub use composite::{CompositeKind, ElementDescriptor, Manifest, PairDescriptor};
pub use context::{CacheContext, ContextBuilder};
pub use hash::{generic_digest, CodecHasher};
pub use keys::{arg_digest, build_cache_key};
pub use registry::{HasherRegistry, SerializerRegistry};
pub use serializer::{Serializer, ValueHasher};
pub use tabular::{frame_tag, FrameCodec, SERIALIZER_METADATA_KEY};
