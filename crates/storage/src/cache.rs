//! Persistent result cache
//!
//! A small key → record engine over a [`DirectoryStore`]: values go through
//! the [`TypeRoutingStore`] adapter to blobs on disk, and the index mapping
//! cache keys to records is persisted as a JSON file, rewritten atomically
//! (temp + fsync + rename) on every set so a crash never leaves a torn
//! index.
//!
//! Durability knobs, eviction and cross-process locking are deliberately
//! absent. This engine keeps everything forever and assumes one writer
//! per directory.

use crate::adapter::TypeRoutingStore;
use crate::backend::DirectoryStore;
use crate::record::StoredRecord;
use parking_lot::RwLock;
use recall_codec::CacheContext;
use recall_core::{CacheKey, Error, Result, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Index file name inside the cache directory
pub const INDEX_FILE_NAME: &str = "index.json";

/// Index format version
const INDEX_FORMAT_VERSION: u32 = 1;

/// On-disk shape of the index file
#[derive(Serialize, Deserialize)]
struct IndexFile {
    version: u32,
    entries: Vec<(CacheKey, StoredRecord)>,
}

/// Disk-backed result cache
pub struct Cache {
    router: TypeRoutingStore,
    index_path: PathBuf,
    index: RwLock<HashMap<CacheKey, StoredRecord>>,
}

impl Cache {
    /// Open (creating if needed) a cache rooted at `dir`
    ///
    /// An existing index file is loaded; its records are trusted as-is.
    pub fn open(dir: impl Into<PathBuf>, ctx: Arc<CacheContext>) -> Result<Self> {
        let dir = dir.into();
        let blobs = Arc::new(DirectoryStore::open(&dir)?);
        let index_path = dir.join(INDEX_FILE_NAME);
        let index = if index_path.exists() {
            load_index(&index_path)?
        } else {
            HashMap::new()
        };
        Ok(Cache {
            router: TypeRoutingStore::new(ctx, blobs),
            index_path,
            index: RwLock::new(index),
        })
    }

    /// Fetch the cached value for a key
    ///
    /// `Ok(None)` means "not cached", distinct from a cached `Null`,
    /// which comes back as `Ok(Some(Value::Null))`.
    pub fn get(&self, key: &CacheKey) -> Result<Option<Value>> {
        let record = {
            let index = self.index.read();
            index.get(key).cloned()
        };
        match record {
            Some(record) => {
                debug!(%key, locator = %record.locator, "cache hit");
                Ok(Some(self.router.fetch(&record)?))
            }
            None => {
                debug!(%key, "cache miss");
                Ok(None)
            }
        }
    }

    /// Store a value under a key, replacing any previous entry
    pub fn set(&self, key: CacheKey, value: &Value) -> Result<()> {
        let record = self.router.store(value)?;
        debug!(%key, marker = %record.marker, size = record.size, "cache set");
        let snapshot: Vec<(CacheKey, StoredRecord)> = {
            let mut index = self.index.write();
            index.insert(key, record);
            index.iter().map(|(k, r)| (k.clone(), r.clone())).collect()
        };
        persist_index(&self.index_path, snapshot)
    }

    /// Whether a key is cached
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.index.read().contains_key(key)
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }
}

fn load_index(path: &Path) -> Result<HashMap<CacheKey, StoredRecord>> {
    let bytes = fs::read(path)?;
    let file: IndexFile = serde_json::from_slice(&bytes)
        .map_err(|e| Error::Corruption(format!("unreadable cache index: {}", e)))?;
    if file.version != INDEX_FORMAT_VERSION {
        return Err(Error::Corruption(format!(
            "unsupported cache index version {}",
            file.version
        )));
    }
    Ok(file.entries.into_iter().collect())
}

/// Atomic index rewrite: temp + fsync + rename
fn persist_index(path: &Path, mut entries: Vec<(CacheKey, StoredRecord)>) -> Result<()> {
    // Deterministic file content regardless of map iteration order
    entries.sort_by(|a, b| (a.0.version, &a.0.digest).cmp(&(b.0.version, &b.0.digest)));
    let file = IndexFile {
        version: INDEX_FORMAT_VERSION,
        entries,
    };
    let bytes =
        serde_json::to_vec(&file).map_err(|e| Error::Serialization(e.to_string()))?;

    let tmp_path = path.with_extension("json.tmp");
    {
        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(&bytes)?;
        tmp.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}
