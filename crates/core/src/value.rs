//! Value model for cacheable data
//!
//! This module defines:
//! - Value: dynamic enum covering the structural types the generic codec
//!   can always handle
//! - ExtValue / Payload: the escape hatch for host-registered extension
//!   types (frames, and whatever else the host plugs in)
//!
//! ## Type Rules
//!
//! - No implicit coercions: `Int(1) != Float(1.0)`, `Bytes` are not `Str`
//! - Float uses IEEE-754 equality: `NaN != NaN`, `-0.0 == 0.0`
//! - `Set` equality is order-independent; `Map` equality is key-based and
//!   order-independent; both keep insertion order internally so decode can
//!   reinsert in encode order
//! - Extension values compare by tag plus payload-defined equality
//!
//! An `Ext` value is only serializable through a serializer registered for
//! its tag. The generic codec covers every other variant.

use crate::tag::TypeTag;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Behavior required of extension payloads
///
/// Payloads are held behind `Arc<dyn Payload>` inside [`ExtValue`], so
/// cloning a value never deep-copies the payload. Equality is delegated to
/// the concrete type via `eq_payload`; implementations should downcast
/// `other` and compare structurally.
pub trait Payload: Any + fmt::Debug + Send + Sync {
    /// Upcast for downcasting to the concrete payload type
    fn as_any(&self) -> &dyn Any;

    /// Structural equality against another payload of (possibly) the same type
    fn eq_payload(&self, other: &dyn Payload) -> bool;
}

/// An extension value: a host type wrapped with its stable tag
///
/// The tag is assigned at construction time and is the identity the
/// serializer registry dispatches on. Exact-tag dispatch only; there is no
/// subtype matching.
#[derive(Debug, Clone)]
pub struct ExtValue {
    tag: TypeTag,
    payload: Arc<dyn Payload>,
}

impl ExtValue {
    /// Wrap a payload under the given tag
    pub fn new(tag: TypeTag, payload: Arc<dyn Payload>) -> Self {
        ExtValue { tag, payload }
    }

    /// The tag this value was constructed with
    pub fn tag(&self) -> &TypeTag {
        &self.tag
    }

    /// The payload as a trait object
    pub fn payload(&self) -> &dyn Payload {
        self.payload.as_ref()
    }

    /// Downcast the payload to a concrete type
    pub fn downcast_ref<T: Payload>(&self) -> Option<&T> {
        self.payload.as_any().downcast_ref::<T>()
    }
}

impl PartialEq for ExtValue {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag && self.payload.eq_payload(other.payload.as_ref())
    }
}

/// Dynamic value enum for everything that flows through the cache
#[derive(Debug, Clone)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point (IEEE-754)
    Float(f64),
    /// UTF-8 string
    Str(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Fixed-arity ordered sequence
    Tuple(Vec<Value>),
    /// Ordered sequence
    List(Vec<Value>),
    /// Unordered collection of unique values (insertion order retained)
    Set(Vec<Value>),
    /// Key/value pairs (insertion order retained, keys unique)
    Map(Vec<(Value, Value)>),
    /// Host extension type, identified by its tag
    Ext(ExtValue),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            // IEEE-754: NaN != NaN, -0.0 == 0.0
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            // Order-independent: same length and mutual containment
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len() && a.iter().all(|v| b.contains(v))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| {
                        b.iter().any(|(bk, bv)| bk == k && bv == v)
                    })
            }
            (Value::Ext(a), Value::Ext(b)) => a == b,
            // Different variants are never equal
            _ => false,
        }
    }
}

impl Value {
    /// Variant name, used in diagnostics and element descriptors
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Str(_) => "Str",
            Value::Bytes(_) => "Bytes",
            Value::Tuple(_) => "Tuple",
            Value::List(_) => "List",
            Value::Set(_) => "Set",
            Value::Map(_) => "Map",
            Value::Ext(_) => "Ext",
        }
    }

    /// The tag of an extension value, or None for structural variants
    pub fn tag(&self) -> Option<&TypeTag> {
        match self {
            Value::Ext(e) => Some(e.tag()),
            _ => None,
        }
    }

    /// Wrap a payload as an extension value
    pub fn ext<T: Payload>(tag: TypeTag, payload: T) -> Value {
        Value::Ext(ExtValue::new(tag, Arc::new(payload)))
    }

    /// Build a set, dropping duplicates while keeping first-insertion order
    pub fn set(items: Vec<Value>) -> Value {
        let mut unique: Vec<Value> = Vec::with_capacity(items.len());
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        Value::Set(unique)
    }

    /// Build a map; a repeated key replaces the earlier entry in place
    pub fn map(pairs: Vec<(Value, Value)>) -> Value {
        let mut entries: Vec<(Value, Value)> = Vec::with_capacity(pairs.len());
        for (k, v) in pairs {
            if let Some(existing) = entries.iter_mut().find(|(ek, _)| *ek == k) {
                existing.1 = v;
            } else {
                entries.push((k, v));
            }
        }
        Value::Map(entries)
    }

    /// Get as i64 if this is an Int value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is a Float value
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as &str if this is a Str value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get as &[u8] if this is a Bytes value
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Get the extension value if this is an Ext
    pub fn as_ext(&self) -> Option<&ExtValue> {
        match self {
            Value::Ext(e) => Some(e),
            _ => None,
        }
    }

    /// Direct children of a container variant, or None for scalars/Ext
    ///
    /// Map children are yielded key-then-value per pair, matching the
    /// composite codec's encode order.
    pub fn children(&self) -> Option<Vec<&Value>> {
        match self {
            Value::Tuple(items) | Value::List(items) | Value::Set(items) => {
                Some(items.iter().collect())
            }
            Value::Map(pairs) => Some(
                pairs
                    .iter()
                    .flat_map(|(k, v)| [k, v])
                    .collect(),
            ),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}
