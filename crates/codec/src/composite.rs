//! Composite codec: element-wise container encoding
//!
//! Containers (tuple, list, set, map) whose direct children include at
//! least one registered extension value are taken apart and encoded
//! element by element, so a list holding one frame and two ints stores the
//! frame through its codec instead of losing it inside an opaque blob.
//!
//! The check is deliberately shallow: only direct children are inspected,
//! never containers nested inside them. Changing that would change the
//! on-disk routing of existing data, so it stays as-is.
//!
//! # Stream layout
//!
//! One blob per container, length-prefixed throughout:
//!
//! ```text
//! +----------------------+
//! | Manifest length      | 8 bytes (u64 BE)
//! | Manifest             | JSON (see below)
//! | Element 0 length     | 8 bytes (u64 BE)
//! | Element 0 bytes      | variable
//! | ...                  |
//! +----------------------+
//! ```
//!
//! The manifest enumerates per element (or per pair, as two descriptors)
//! the tag recorded at encode time and whether the element went through a
//! custom serializer. Decode honors the persisted flag; it never re-checks
//! the registry to decide which path the bytes took. Elements follow in
//! encode order: sequence order for tuples/lists/sets, key-then-value per
//! pair for maps.

use crate::context::CacheContext;
use crate::fallback;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use recall_core::tag::{MARKER_DICT, MARKER_LIST, MARKER_SET, MARKER_TUPLE};
use recall_core::{Error, Result, TypeTag, Value};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// The container kinds the composite codec understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeKind {
    /// Fixed-arity ordered sequence
    Tuple,
    /// Ordered sequence
    List,
    /// Unordered collection
    Set,
    /// Key/value mapping
    Dict,
}

impl CompositeKind {
    /// The reserved marker persisted for this kind
    pub fn marker(&self) -> &'static str {
        match self {
            CompositeKind::Tuple => MARKER_TUPLE,
            CompositeKind::List => MARKER_LIST,
            CompositeKind::Set => MARKER_SET,
            CompositeKind::Dict => MARKER_DICT,
        }
    }

    /// Resolve a marker string back to a kind
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            MARKER_TUPLE => Some(CompositeKind::Tuple),
            MARKER_LIST => Some(CompositeKind::List),
            MARKER_SET => Some(CompositeKind::Set),
            MARKER_DICT => Some(CompositeKind::Dict),
            _ => None,
        }
    }
}

/// Per-element descriptor recorded in the manifest
///
/// `custom` is true iff the element's tag resolved to a registered
/// serializer at encode time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementDescriptor {
    /// Tag recorded for the element (informational for non-custom elements)
    #[serde(rename = "type")]
    pub tag: String,
    /// Whether the element was encoded by a registered serializer
    pub custom: bool,
}

/// Per-pair descriptor for mappings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairDescriptor {
    /// Descriptor for the key
    pub key: ElementDescriptor,
    /// Descriptor for the value
    pub value: ElementDescriptor,
}

/// Manifest describing how a container was taken apart
///
/// Sequences populate `elements`, mappings populate `pairs`. Unknown extra
/// fields from newer writers are ignored on read; absent lists default to
/// empty, which keeps the record forward-readable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Element descriptors, in encode order (sequences)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<ElementDescriptor>,
    /// Pair descriptors, in encode order (mappings)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pairs: Vec<PairDescriptor>,
    /// Declared container length; decode must reconstruct exactly this many
    pub length: u64,
}

/// Try to encode a container element-wise
///
/// Returns `Ok(None)` when the codec does not apply (the value is not a
/// container, or no direct child has a registered serializer), in which
/// case the caller falls through to the generic codec. An empty container
/// never applies.
pub fn encode(value: &Value, ctx: &CacheContext) -> Result<Option<(CompositeKind, Vec<u8>)>> {
    let kind = match value {
        Value::Tuple(_) => CompositeKind::Tuple,
        Value::List(_) => CompositeKind::List,
        Value::Set(_) => CompositeKind::Set,
        Value::Map(_) => CompositeKind::Dict,
        _ => return Ok(None),
    };
    if !has_custom_child(value, ctx) {
        return Ok(None);
    }

    let stream = match value {
        Value::Tuple(items) | Value::List(items) | Value::Set(items) => {
            encode_sequence(items, ctx)?
        }
        Value::Map(pairs) => encode_mapping(pairs, ctx)?,
        _ => unreachable!("kind match above"),
    };
    Ok(Some((kind, stream)))
}

/// Decode a composite stream back into the container kind its marker named
pub fn decode(kind: CompositeKind, bytes: &[u8], ctx: &CacheContext) -> Result<Value> {
    let mut cursor = Cursor::new(bytes);
    let manifest = read_manifest(&mut cursor, bytes)?;

    match kind {
        CompositeKind::Dict => {
            if manifest.pairs.len() as u64 != manifest.length {
                return Err(Error::CorruptManifest(format!(
                    "declared length {}, found {} pair descriptors",
                    manifest.length,
                    manifest.pairs.len()
                )));
            }
            let mut entries = Vec::with_capacity(manifest.pairs.len());
            for pair in &manifest.pairs {
                let key = read_element(&mut cursor, bytes, &pair.key, ctx)?;
                let value = read_element(&mut cursor, bytes, &pair.value, ctx)?;
                entries.push((key, value));
            }
            Ok(Value::map(entries))
        }
        _ => {
            if manifest.elements.len() as u64 != manifest.length {
                return Err(Error::CorruptManifest(format!(
                    "declared length {}, found {} element descriptors",
                    manifest.length,
                    manifest.elements.len()
                )));
            }
            let mut items = Vec::with_capacity(manifest.elements.len());
            for desc in &manifest.elements {
                items.push(read_element(&mut cursor, bytes, desc, ctx)?);
            }
            Ok(match kind {
                CompositeKind::Tuple => Value::Tuple(items),
                CompositeKind::List => Value::List(items),
                CompositeKind::Set => Value::set(items),
                CompositeKind::Dict => unreachable!("handled above"),
            })
        }
    }
}

/// Shallow scan: does any direct child have a registered serializer?
fn has_custom_child(value: &Value, ctx: &CacheContext) -> bool {
    value.children().is_some_and(|children| {
        children.iter().any(|child| {
            child
                .tag()
                .is_some_and(|tag| ctx.serializers().is_registered(tag))
        })
    })
}

fn encode_sequence(items: &[Value], ctx: &CacheContext) -> Result<Vec<u8>> {
    let mut descriptors = Vec::with_capacity(items.len());
    let mut payloads = Vec::with_capacity(items.len());
    for item in items {
        let (desc, bytes) = encode_element(item, ctx)?;
        descriptors.push(desc);
        payloads.push(bytes);
    }
    let manifest = Manifest {
        elements: descriptors,
        pairs: vec![],
        length: items.len() as u64,
    };
    assemble(&manifest, payloads)
}

fn encode_mapping(pairs: &[(Value, Value)], ctx: &CacheContext) -> Result<Vec<u8>> {
    let mut descriptors = Vec::with_capacity(pairs.len());
    let mut payloads = Vec::with_capacity(pairs.len() * 2);
    for (key, value) in pairs {
        let (key_desc, key_bytes) = encode_element(key, ctx)?;
        let (value_desc, value_bytes) = encode_element(value, ctx)?;
        descriptors.push(PairDescriptor {
            key: key_desc,
            value: value_desc,
        });
        payloads.push(key_bytes);
        payloads.push(value_bytes);
    }
    let manifest = Manifest {
        elements: vec![],
        pairs: descriptors,
        length: pairs.len() as u64,
    };
    assemble(&manifest, payloads)
}

/// Encode one element: its serializer when the exact tag is registered,
/// the generic fallback otherwise.
fn encode_element(value: &Value, ctx: &CacheContext) -> Result<(ElementDescriptor, Vec<u8>)> {
    if let Value::Ext(ext) = value {
        if let Some(serializer) = ctx.serializers().lookup(ext.tag()) {
            let bytes = serializer.encode(value)?;
            return Ok((
                ElementDescriptor {
                    tag: ext.tag().to_string(),
                    custom: true,
                },
                bytes,
            ));
        }
    }
    let bytes = fallback::encode(value)?;
    Ok((
        ElementDescriptor {
            tag: descriptor_tag(value),
            custom: false,
        },
        bytes,
    ))
}

/// Tag string recorded for an element
///
/// Extension values record their real tag; structural values record a
/// `value.<Variant>` pseudo-tag, which is informational only; the decode
/// path never resolves it for non-custom elements.
fn descriptor_tag(value: &Value) -> String {
    match value.tag() {
        Some(tag) => tag.to_string(),
        None => format!("value.{}", value.type_name()),
    }
}

fn assemble(manifest: &Manifest, payloads: Vec<Vec<u8>>) -> Result<Vec<u8>> {
    let manifest_bytes =
        serde_json::to_vec(manifest).map_err(|e| Error::Serialization(e.to_string()))?;

    let total: usize = payloads.iter().map(|p| p.len() + 8).sum();
    let mut out = Vec::with_capacity(8 + manifest_bytes.len() + total);
    out.write_u64::<BigEndian>(manifest_bytes.len() as u64)?;
    out.extend_from_slice(&manifest_bytes);
    for payload in payloads {
        out.write_u64::<BigEndian>(payload.len() as u64)?;
        out.extend_from_slice(&payload);
    }
    Ok(out)
}

fn read_manifest(cursor: &mut Cursor<&[u8]>, bytes: &[u8]) -> Result<Manifest> {
    let len = cursor
        .read_u64::<BigEndian>()
        .map_err(|_| Error::CorruptManifest("stream too short for manifest length".to_string()))?
        as usize;
    let start = cursor.position() as usize;
    let end = start
        .checked_add(len)
        .filter(|&e| e <= bytes.len())
        .ok_or_else(|| Error::CorruptManifest("manifest overruns stream".to_string()))?;
    let manifest: Manifest = serde_json::from_slice(&bytes[start..end])
        .map_err(|e| Error::CorruptManifest(format!("unparseable manifest: {}", e)))?;
    cursor.set_position(end as u64);
    Ok(manifest)
}

/// Read one length-prefixed element and decode it per its descriptor
///
/// A custom element whose tag no longer resolves in the registry falls back
/// to the generic codec; resolution failure is never fatal on its own.
fn read_element(
    cursor: &mut Cursor<&[u8]>,
    bytes: &[u8],
    desc: &ElementDescriptor,
    ctx: &CacheContext,
) -> Result<Value> {
    let len = cursor
        .read_u64::<BigEndian>()
        .map_err(|_| Error::Corruption("composite stream truncated".to_string()))?
        as usize;
    let start = cursor.position() as usize;
    let end = start
        .checked_add(len)
        .filter(|&e| e <= bytes.len())
        .ok_or_else(|| Error::Corruption("composite element overruns stream".to_string()))?;
    let payload = &bytes[start..end];
    cursor.set_position(end as u64);

    if desc.custom {
        if let Ok(tag) = TypeTag::parse(&desc.tag) {
            if let Some(serializer) = ctx.serializers().lookup(&tag) {
                return serializer.decode(payload);
            }
        }
        return fallback::decode(payload);
    }
    fallback::decode(payload)
}
