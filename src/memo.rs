//! Memoization wrapper
//!
//! Wraps a computation with cache lookup, timing and logging. The cache key
//! comes from the caller-supplied version plus the bound arguments; the
//! result lands in a per-function cache directory, so two functions never
//! collide even when their arguments do.
//!
//! Timing covers the whole call including cache overhead (lookup plus
//! deserialization on a hit), and hits are logged with a `(cached)`
//! suffix.

use crate::settings::CacheSettings;
use parking_lot::Mutex;
use recall_codec::{build_cache_key, CacheContext};
use recall_core::{Result, Value};
use recall_storage::Cache;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Per-function cache configuration
///
/// Bump the version to invalidate every previously cached result of that
/// function without touching stored data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheConfig {
    /// Cache version, verbatim part of every key
    pub version: u64,
}

impl CacheConfig {
    /// Config with the given version
    pub fn new(version: u64) -> Self {
        CacheConfig { version }
    }
}

/// Function-result memoizer over a cache directory
///
/// Caches are isolated per function name (one subdirectory each) and opened
/// lazily on first use.
pub struct Memo {
    root: PathBuf,
    ctx: Arc<CacheContext>,
    caches: Mutex<HashMap<String, Arc<Cache>>>,
}

impl Memo {
    /// Open a memoizer rooted at a cache directory
    pub fn open(root: impl Into<PathBuf>, ctx: Arc<CacheContext>) -> Self {
        Memo {
            root: root.into(),
            ctx,
            caches: Mutex::new(HashMap::new()),
        }
    }

    /// Open a memoizer from loaded settings
    pub fn from_settings(settings: &CacheSettings, ctx: Arc<CacheContext>) -> Self {
        Memo::open(&settings.directory, ctx)
    }

    /// The configuration context keys and codecs route through
    pub fn context(&self) -> &Arc<CacheContext> {
        &self.ctx
    }

    fn cache_for(&self, name: &str) -> Result<Arc<Cache>> {
        let mut caches = self.caches.lock();
        if let Some(cache) = caches.get(name) {
            return Ok(cache.clone());
        }
        let cache = Arc::new(Cache::open(self.root.join(name), self.ctx.clone())?);
        caches.insert(name.to_string(), cache.clone());
        Ok(cache)
    }

    /// Run `compute` unless an equal call is already cached
    ///
    /// `args` are the function's bound arguments, name/value pairs with
    /// defaults applied, so how the call site spelled them cannot change
    /// the key. A cached `Null` counts as a hit.
    pub fn cached<F>(
        &self,
        name: &str,
        config: CacheConfig,
        args: &[(&str, &Value)],
        compute: F,
    ) -> Result<Value>
    where
        F: FnOnce() -> Result<Value>,
    {
        let start = Instant::now();
        let cache = self.cache_for(name)?;
        let key = build_cache_key(config.version, args, &self.ctx)?;

        if let Some(value) = cache.get(&key)? {
            info!(
                "{} completed in {:.4} seconds (cached)",
                name,
                start.elapsed().as_secs_f64()
            );
            return Ok(value);
        }

        let result = compute()?;
        cache.set(key, &result)?;
        info!(
            "{} completed in {:.4} seconds",
            name,
            start.elapsed().as_secs_f64()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_codec::frame_tag;
    use recall_core::{Column, Frame};
    use tempfile::TempDir;

    fn memo(dir: &TempDir) -> Memo {
        Memo::open(dir.path(), Arc::new(CacheContext::with_defaults()))
    }

    fn frame_value(rows: Vec<i64>) -> Value {
        Value::ext(
            frame_tag(),
            Frame::new(vec![Column::int("a", rows)]).unwrap(),
        )
    }

    #[test]
    fn test_second_call_is_a_hit() {
        let dir = TempDir::new().unwrap();
        let memo = memo(&dir);
        let mut calls = 0;

        let arg = Value::Int(10);
        for _ in 0..2 {
            let result = memo
                .cached("double", CacheConfig::new(0), &[("x", &arg)], || {
                    calls += 1;
                    Ok(Value::Int(20))
                })
                .unwrap();
            assert_eq!(result, Value::Int(20));
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_content_equal_frames_share_a_cache_entry() {
        let dir = TempDir::new().unwrap();
        let memo = memo(&dir);
        let calls = std::cell::Cell::new(0);

        let run = |df: Value| {
            memo.cached("row_count", CacheConfig::new(0), &[("df", &df)], || {
                calls.set(calls.get() + 1);
                let frame = df.as_ext().unwrap().downcast_ref::<Frame>().unwrap();
                Ok(Value::Int(frame.num_rows() as i64))
            })
            .unwrap()
        };

        // Miss, then a hit from a distinct but content-identical frame,
        // then a miss on different content
        assert_eq!(run(frame_value(vec![1, 2, 3])), Value::Int(3));
        assert_eq!(calls.get(), 1);
        assert_eq!(run(frame_value(vec![1, 2, 3])), Value::Int(3));
        assert_eq!(calls.get(), 1);
        assert_eq!(run(frame_value(vec![1, 2, 3, 4])), Value::Int(4));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_version_bump_invalidates() {
        let dir = TempDir::new().unwrap();
        let memo = memo(&dir);
        let mut calls = 0;

        let arg = Value::Int(1);
        for version in [0, 0, 1] {
            memo.cached("f", CacheConfig::new(version), &[("x", &arg)], || {
                calls += 1;
                Ok(Value::Int(99))
            })
            .unwrap();
        }
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_functions_are_isolated_by_name() {
        let dir = TempDir::new().unwrap();
        let memo = memo(&dir);

        let arg = Value::Int(1);
        let a = memo
            .cached("f", CacheConfig::default(), &[("x", &arg)], || {
                Ok(Value::Int(1))
            })
            .unwrap();
        let b = memo
            .cached("g", CacheConfig::default(), &[("x", &arg)], || {
                Ok(Value::Int(2))
            })
            .unwrap();
        assert_eq!(a, Value::Int(1));
        assert_eq!(b, Value::Int(2));
    }

    #[test]
    fn test_cached_null_result_is_a_hit() {
        let dir = TempDir::new().unwrap();
        let memo = memo(&dir);
        let mut calls = 0;

        for _ in 0..2 {
            let result = memo
                .cached("nothing", CacheConfig::default(), &[], || {
                    calls += 1;
                    Ok(Value::Null)
                })
                .unwrap();
            assert_eq!(result, Value::Null);
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_compute_error_is_not_cached() {
        let dir = TempDir::new().unwrap();
        let memo = memo(&dir);
        let mut calls = 0;

        let failed = memo.cached("flaky", CacheConfig::default(), &[], || {
            calls += 1;
            Err(recall_core::Error::Serialization("boom".to_string()))
        });
        assert!(failed.is_err());

        let ok = memo
            .cached("flaky", CacheConfig::default(), &[], || {
                calls += 1;
                Ok(Value::Int(5))
            })
            .unwrap();
        assert_eq!(ok, Value::Int(5));
        assert_eq!(calls, 2);
    }
}
