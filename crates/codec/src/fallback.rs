//! Generic fallback codec
//!
//! The default, type-agnostic encoding applied when no custom serializer is
//! registered for a value. Values are mirrored into a self-describing wire
//! enum and serialized with MessagePack.
//!
//! The fallback is deliberately bounded: it covers exactly the structural
//! variants of [`Value`]. An extension value reaching this codec means the
//! host forgot to register a serializer for it. That is a configuration
//! error surfaced as `Error::UnregisteredType`, not something to paper over
//! at runtime.

use recall_core::{Error, Result, Value};
use serde::{Deserialize, Serialize};

/// Wire mirror of the structural `Value` variants
#[derive(Serialize, Deserialize)]
enum Wire {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Tuple(Vec<Wire>),
    List(Vec<Wire>),
    Set(Vec<Wire>),
    Map(Vec<(Wire, Wire)>),
}

fn to_wire(value: &Value) -> Result<Wire> {
    Ok(match value {
        Value::Null => Wire::Null,
        Value::Bool(b) => Wire::Bool(*b),
        Value::Int(i) => Wire::Int(*i),
        Value::Float(f) => Wire::Float(*f),
        Value::Str(s) => Wire::Str(s.clone()),
        Value::Bytes(b) => Wire::Bytes(b.clone()),
        Value::Tuple(items) => Wire::Tuple(items.iter().map(to_wire).collect::<Result<_>>()?),
        Value::List(items) => Wire::List(items.iter().map(to_wire).collect::<Result<_>>()?),
        Value::Set(items) => Wire::Set(items.iter().map(to_wire).collect::<Result<_>>()?),
        Value::Map(pairs) => Wire::Map(
            pairs
                .iter()
                .map(|(k, v)| Ok((to_wire(k)?, to_wire(v)?)))
                .collect::<Result<_>>()?,
        ),
        Value::Ext(e) => return Err(Error::UnregisteredType(e.tag().to_string())),
    })
}

fn from_wire(wire: Wire) -> Value {
    match wire {
        Wire::Null => Value::Null,
        Wire::Bool(b) => Value::Bool(b),
        Wire::Int(i) => Value::Int(i),
        Wire::Float(f) => Value::Float(f),
        Wire::Str(s) => Value::Str(s),
        Wire::Bytes(b) => Value::Bytes(b),
        Wire::Tuple(items) => Value::Tuple(items.into_iter().map(from_wire).collect()),
        Wire::List(items) => Value::List(items.into_iter().map(from_wire).collect()),
        // Reconstruction goes through the canonical constructors so set
        // uniqueness and map key semantics hold after decode
        Wire::Set(items) => Value::set(items.into_iter().map(from_wire).collect()),
        Wire::Map(pairs) => Value::map(
            pairs
                .into_iter()
                .map(|(k, v)| (from_wire(k), from_wire(v)))
                .collect(),
        ),
    }
}

/// Encode a structural value with the generic codec
///
/// # Errors
///
/// `Error::UnregisteredType` if the value (at any depth) contains an
/// extension value.
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    let wire = to_wire(value)?;
    rmp_serde::to_vec(&wire).map_err(|e| Error::Serialization(e.to_string()))
}

/// Decode bytes produced by [`encode`]
pub fn decode(bytes: &[u8]) -> Result<Value> {
    let wire: Wire =
        rmp_serde::from_slice(bytes).map_err(|e| Error::Serialization(e.to_string()))?;
    Ok(from_wire(wire))
}
