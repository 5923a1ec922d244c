//! Cache-key builder
//!
//! Derives a deterministic [`CacheKey`] from a function's bound arguments.
//! Arguments arrive as (name, value) pairs with defaults already applied,
//! so the positional/keyword distinction at the call site cannot influence
//! the key. Per-argument digests come from the hasher registry when the
//! value's tag has one, else from the generic digest; names and digests are
//! combined in name-sorted order so argument declaration order does not
//! matter either.

use crate::context::CacheContext;
use crate::hash::{generic_digest, hex_digest};
use recall_core::{CacheKey, Result, Value};
use sha2::{Digest, Sha256};

/// Digest a single argument value
///
/// Registered hasher for the value's tag if any, generic digest otherwise.
pub fn arg_digest(value: &Value, ctx: &CacheContext) -> Result<String> {
    if let Some(tag) = value.tag() {
        if let Some(hasher) = ctx.hashers().lookup(tag) {
            return hasher.digest(value);
        }
    }
    generic_digest(value, ctx)
}

/// Build the cache key for a call
///
/// Two calls with equal arguments under the same version always produce the
/// same key; changing the version changes the key even for identical
/// arguments.
pub fn build_cache_key(
    version: u64,
    args: &[(&str, &Value)],
    ctx: &CacheContext,
) -> Result<CacheKey> {
    let mut entries = Vec::with_capacity(args.len());
    for (name, value) in args {
        entries.push((*name, arg_digest(value, ctx)?));
    }
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut hasher = Sha256::new();
    for (name, digest) in &entries {
        // Length-prefix the name so (ab, c) and (a, bc) cannot collide
        hasher.update((name.len() as u64).to_be_bytes());
        hasher.update(name.as_bytes());
        hasher.update(digest.as_bytes());
    }
    Ok(CacheKey::new(version, hex_digest(hasher)))
}
