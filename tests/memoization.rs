//! End-to-end memoization semantics
//!
//! The canonical scenario: a function over a frame argument producing its
//! row count, exercised for miss/hit/miss behavior, version invalidation,
//! and persistence across process (here: instance) restarts.

use recall::{CacheConfig, CacheContext, Column, Frame, Memo, Value};
use std::sync::Arc;
use std::sync::Once;
use tempfile::TempDir;

static INIT_LOGGING: Once = Once::new();

fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

fn frame_value(rows: &[i64]) -> Value {
    Value::ext(
        recall::frame_tag(),
        Frame::new(vec![
            Column::int("a", rows.to_vec()),
            Column::int("b", rows.iter().map(|v| v * 2).collect()),
        ])
        .unwrap(),
    )
}

fn row_count(df: &Value) -> Value {
    let frame = df.as_ext().unwrap().downcast_ref::<Frame>().unwrap();
    Value::Int(frame.num_rows() as i64)
}

#[test]
fn frame_as_cache_key() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let memo = Memo::open(dir.path(), Arc::new(CacheContext::with_defaults()));
    let call_count = std::cell::Cell::new(0);

    let process = |df: Value| -> Value {
        memo.cached("process_frame", CacheConfig::new(0), &[("df", &df)], || {
            call_count.set(call_count.get() + 1);
            Ok(row_count(&df))
        })
        .unwrap()
    };

    // First call: miss
    assert_eq!(process(frame_value(&[1, 2, 3])), Value::Int(3));
    assert_eq!(call_count.get(), 1);

    // Content-identical but distinct frame object: hit, no re-execution
    assert_eq!(process(frame_value(&[1, 2, 3])), Value::Int(3));
    assert_eq!(call_count.get(), 1);

    // Different frame: miss
    assert_eq!(process(frame_value(&[1, 2, 3, 4])), Value::Int(4));
    assert_eq!(call_count.get(), 2);
}

#[test]
fn frame_as_return_value() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let memo = Memo::open(dir.path(), Arc::new(CacheContext::with_defaults()));
    let call_count = std::cell::Cell::new(0);

    let create = |rows: i64| -> Value {
        let arg = Value::Int(rows);
        memo.cached("create_frame", CacheConfig::new(0), &[("rows", &arg)], || {
            call_count.set(call_count.get() + 1);
            let range: Vec<i64> = (0..rows).collect();
            Ok(frame_value(&range))
        })
        .unwrap()
    };

    let first = create(5);
    assert_eq!(call_count.get(), 1);
    let frame = first.as_ext().unwrap().downcast_ref::<Frame>().unwrap();
    assert_eq!(frame.num_rows(), 5);
    assert_eq!(
        frame.column("a").unwrap().cells().len(),
        frame.column("b").unwrap().cells().len()
    );

    // Second call: hit, identical frame back from disk
    let second = create(5);
    assert_eq!(call_count.get(), 1);
    assert_eq!(first, second);
}

#[test]
fn mixed_frame_and_primitive_arguments() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let memo = Memo::open(dir.path(), Arc::new(CacheContext::with_defaults()));
    let call_count = std::cell::Cell::new(0);

    let transform = |df: &Value, multiplier: i64, offset: f64| -> Value {
        let m = Value::Int(multiplier);
        let o = Value::Float(offset);
        memo.cached(
            "transform",
            CacheConfig::new(0),
            &[("df", df), ("multiplier", &m), ("offset", &o)],
            || {
                call_count.set(call_count.get() + 1);
                Ok(Value::Float(multiplier as f64 + offset))
            },
        )
        .unwrap()
    };

    let df = frame_value(&[1, 2, 3]);
    transform(&df, 2, 10.0);
    assert_eq!(call_count.get(), 1);

    // Same everything: hit
    transform(&df, 2, 10.0);
    assert_eq!(call_count.get(), 1);

    // Each changed argument is a fresh miss
    transform(&df, 3, 10.0);
    assert_eq!(call_count.get(), 2);
    transform(&df, 2, 5.0);
    assert_eq!(call_count.get(), 3);
    transform(&frame_value(&[10, 20, 30]), 2, 10.0);
    assert_eq!(call_count.get(), 4);
}

#[test]
fn version_bump_invalidates_without_touching_data() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let memo = Memo::open(dir.path(), Arc::new(CacheContext::with_defaults()));
    let call_count = std::cell::Cell::new(0);

    let arg = Value::Int(7);
    for version in [1, 1, 2, 2, 1] {
        memo.cached("versioned", CacheConfig::new(version), &[("x", &arg)], || {
            call_count.set(call_count.get() + 1);
            Ok(Value::Int(0))
        })
        .unwrap();
    }
    // v1 computed once, v2 computed once, final v1 call still hits
    assert_eq!(call_count.get(), 2);
}

#[test]
fn cache_survives_restart() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let ctx = Arc::new(CacheContext::with_defaults());
    let df = frame_value(&[1, 2, 3]);

    {
        let memo = Memo::open(dir.path(), ctx.clone());
        let result = memo
            .cached("persisted", CacheConfig::new(0), &[("df", &df)], || {
                Ok(row_count(&df))
            })
            .unwrap();
        assert_eq!(result, Value::Int(3));
    }

    // A fresh memoizer over the same directory hits the stored result
    let memo = Memo::open(dir.path(), Arc::new(CacheContext::with_defaults()));
    let result = memo
        .cached("persisted", CacheConfig::new(0), &[("df", &df)], || {
            panic!("must not recompute after restart");
        })
        .unwrap();
    assert_eq!(result, Value::Int(3));
}
