//! Blob storage boundary
//!
//! The persistent store engine owns durability, locking and eviction; this
//! layer only needs three primitives from it: hand out a fresh locator,
//! write bytes at a locator, read them back. [`BlobStore`] is that
//! boundary, and [`DirectoryStore`] is the stock file-backed
//! implementation.
//!
//! All I/O is synchronous and blocking. File handles are scoped to each
//! call, so error paths cannot leak descriptors; a failed write leaves at
//! worst an orphan blob that no record points at, never a dangling record.

use recall_core::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Opaque address of one stored blob
///
/// For the directory store this is a sharded relative path; other backends
/// are free to put anything stringly in here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    /// Wrap a backend-specific locator string
    pub fn new(raw: impl Into<String>) -> Self {
        Locator(raw.into())
    }

    /// The raw locator string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage primitives the external store engine provides
///
/// Implementations must be safe to call from multiple threads; the engine
/// is responsible for serializing access to any single locator.
pub trait BlobStore: Send + Sync {
    /// Hand out a locator no other blob uses
    fn allocate(&self) -> Locator;

    /// Write a blob at the locator, returning the byte count written
    fn write(&self, locator: &Locator, bytes: &[u8]) -> Result<u64>;

    /// Read the blob at the locator
    fn read(&self, locator: &Locator) -> Result<Vec<u8>>;

    /// Remove the blob at the locator, if present
    fn remove(&self, locator: &Locator) -> Result<()>;
}

/// File-per-blob store rooted at a directory
///
/// Locators are `xx/<uuid>.blob` relative paths, sharded by the first two
/// hex characters of the uuid to keep directory fanout bounded.
#[derive(Debug)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Open (creating if needed) a blob store rooted at `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(DirectoryStore { root })
    }

    /// The root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, locator: &Locator) -> PathBuf {
        self.root.join(locator.as_str())
    }
}

impl BlobStore for DirectoryStore {
    fn allocate(&self) -> Locator {
        let id = Uuid::new_v4().simple().to_string();
        Locator::new(format!("{}/{}.blob", &id[..2], id))
    }

    fn write(&self, locator: &Locator, bytes: &[u8]) -> Result<u64> {
        let path = self.blob_path(locator);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(&path)?;
        file.write_all(bytes)?;
        Ok(bytes.len() as u64)
    }

    fn read(&self, locator: &Locator) -> Result<Vec<u8>> {
        let mut file = File::open(self.blob_path(locator))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    fn remove(&self, locator: &Locator) -> Result<()> {
        let path = self.blob_path(locator);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}
