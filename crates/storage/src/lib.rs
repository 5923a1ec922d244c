//! Storage layer for the recall cache
//!
//! - backend: the blob-store boundary and the file-backed implementation
//! - record: index entries describing stored values
//! - adapter: type-routing glue between codecs and blobs
//! - cache: the key → record engine with an atomically persisted index

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapter;
pub mod backend;
pub mod cache;
pub mod record;

pub use adapter::TypeRoutingStore;
pub use backend::{BlobStore, DirectoryStore, Locator};
pub use cache::{Cache, INDEX_FILE_NAME};
pub use record::{StorageMode, StoredRecord};
