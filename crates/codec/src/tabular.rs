//! Tabular-array codec
//!
//! The stock serializer for [`Frame`] values. The columnar container only
//! stores uniform scalar columns, so columns holding array-valued cells are
//! packed first: every cell in such a column becomes a self-describing byte
//! blob, and the names of the packed columns are recorded in the
//! container's side metadata under [`SERIALIZER_METADATA_KEY`].
//!
//! Two normalizations run before a cell is packed, both encode-only and
//! best-effort:
//!
//! - a cell that is a one-dimensional collection of arrays is stacked into
//!   a single rectangular array; if the arrays disagree on dtype or shape,
//!   the cell keeps its original structure in a multi-array blob
//! - string cells in a packed column are coerced to fixed-width string
//!   arrays, using the widest string in the column
//!
//! Decode does not invert the normalizations: a stacked cell comes back as
//! one array, not a collection. A container without the metadata key reads
//! back unmodified, so plain frames written without packed columns stay
//! readable.

use crate::columnar;
use crate::serializer::Serializer;
use recall_core::{Cell, Column, Error, Frame, NdArray, Result, TypeTag, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reserved side-metadata key naming the packed columns
pub const SERIALIZER_METADATA_KEY: &str = "serializer_metadata";

/// Blob tag for a single packed array
const BLOB_ARRAY: u8 = 0x01;
/// Blob tag for a structured multi-array cell
const BLOB_ARRAY_LIST: u8 = 0x02;

/// The default tag frames are registered under
pub fn frame_tag() -> TypeTag {
    TypeTag::parse("frame.Frame").expect("static frame tag is valid")
}

/// Side-metadata record: which columns were packed
#[derive(Debug, Serialize, Deserialize)]
struct PackMetadata {
    ndarray_columns: Vec<String>,
}

/// Serializer for tabular frames
///
/// Always invoked through an explicit registration for the frame tag, so a
/// value of any other type is a hard `TypeMismatch`; there is no silent
/// fallback out of this codec.
#[derive(Debug, Default)]
pub struct FrameCodec;

impl Serializer for FrameCodec {
    fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        let frame = value
            .as_ext()
            .and_then(|e| e.downcast_ref::<Frame>())
            .ok_or_else(|| Error::TypeMismatch {
                expected: frame_tag().to_string(),
                actual: value
                    .tag()
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| value.type_name().to_string()),
            })?;

        let (packed, packed_columns) = pack(frame)?;
        let mut metadata = BTreeMap::new();
        if !packed_columns.is_empty() {
            let record = PackMetadata {
                ndarray_columns: packed_columns,
            };
            metadata.insert(
                SERIALIZER_METADATA_KEY.to_string(),
                serde_json::to_string(&record)
                    .map_err(|e| Error::Serialization(e.to_string()))?,
            );
        }
        columnar::write(&packed, &metadata)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value> {
        let (frame, metadata) = columnar::read(bytes)?;
        let frame = match metadata.get(SERIALIZER_METADATA_KEY) {
            // No packing record: a plain frame, return it unmodified
            None => frame,
            Some(raw) => {
                let record: PackMetadata = serde_json::from_str(raw)
                    .map_err(|e| Error::Serialization(e.to_string()))?;
                unpack(frame, &record.ndarray_columns)?
            }
        };
        Ok(Value::ext(frame_tag(), frame))
    }
}

/// Pack array-valued columns to byte blobs; returns the packed frame and
/// the names of the columns that were transformed.
fn pack(frame: &Frame) -> Result<(Frame, Vec<String>)> {
    let mut packed_names = Vec::new();
    let mut columns = Vec::with_capacity(frame.num_columns());
    for column in frame.columns() {
        if column.has_array_cells() {
            packed_names.push(column.name().to_string());
            columns.push(pack_column(column)?);
        } else {
            columns.push(column.clone());
        }
    }
    Ok((Frame::new(columns)?, packed_names))
}

fn pack_column(column: &Column) -> Result<Column> {
    // Column-wide fixed width for string coercion
    let str_width = column
        .cells()
        .iter()
        .filter_map(|c| match c {
            Cell::Str(s) => Some(s.len()),
            _ => None,
        })
        .max()
        .unwrap_or(0) as u32;

    let mut cells = Vec::with_capacity(column.len());
    for cell in column.cells() {
        cells.push(Cell::Bytes(pack_cell(cell, str_width)?));
    }
    Ok(Column::new(column.name(), cells))
}

fn pack_cell(cell: &Cell, str_width: u32) -> Result<Vec<u8>> {
    match cell {
        Cell::Array(array) => Ok(array_blob(array)),
        Cell::ArrayList(arrays) => match NdArray::stack(arrays) {
            // Stacking normalization: one rectangular array
            Ok(stacked) => Ok(array_blob(&stacked)),
            // Best effort only: keep the original structure
            Err(_) => Ok(array_list_blob(arrays)),
        },
        // Fixed-width coercion; the width covers every string in the column
        Cell::Str(s) => Ok(array_blob(&NdArray::fixed_str(str_width, s)?)),
        Cell::Int(v) => Ok(array_blob(&NdArray::scalar_i64(*v))),
        Cell::Float(v) => Ok(array_blob(&NdArray::scalar_f64(*v))),
        Cell::Bool(v) => Ok(array_blob(&NdArray::scalar_bool(*v))),
        Cell::Bytes(b) => Ok(array_blob(&NdArray::from_u8(b))),
    }
}

fn array_blob(array: &NdArray) -> Vec<u8> {
    let encoded = array.to_bytes();
    let mut blob = Vec::with_capacity(1 + encoded.len());
    blob.push(BLOB_ARRAY);
    blob.extend_from_slice(&encoded);
    blob
}

fn array_list_blob(arrays: &[NdArray]) -> Vec<u8> {
    let mut blob = vec![BLOB_ARRAY_LIST];
    blob.extend_from_slice(&(arrays.len() as u32).to_le_bytes());
    for array in arrays {
        let encoded = array.to_bytes();
        blob.extend_from_slice(&(encoded.len() as u64).to_le_bytes());
        blob.extend_from_slice(&encoded);
    }
    blob
}

/// Replace the blobs in the named columns with decoded arrays
fn unpack(frame: Frame, packed_columns: &[String]) -> Result<Frame> {
    let mut columns = Vec::with_capacity(frame.num_columns());
    for column in frame.columns() {
        if packed_columns.iter().any(|n| n == column.name()) {
            let mut cells = Vec::with_capacity(column.len());
            for cell in column.cells() {
                let blob = match cell {
                    Cell::Bytes(b) => b,
                    other => {
                        return Err(Error::Corruption(format!(
                            "packed column {} holds a {} cell, expected bytes",
                            column.name(),
                            other.kind_name()
                        )))
                    }
                };
                cells.push(unpack_cell(blob)?);
            }
            columns.push(Column::new(column.name(), cells));
        } else {
            columns.push(column.clone());
        }
    }
    Frame::new(columns)
}

fn unpack_cell(blob: &[u8]) -> Result<Cell> {
    match blob.first() {
        Some(&BLOB_ARRAY) => Ok(Cell::Array(NdArray::from_bytes(&blob[1..])?)),
        Some(&BLOB_ARRAY_LIST) => {
            if blob.len() < 5 {
                return Err(Error::Corruption("array blob truncated".to_string()));
            }
            let count = u32::from_le_bytes(blob[1..5].try_into().unwrap()) as usize;
            let mut arrays = Vec::with_capacity(count);
            let mut offset = 5usize;
            for _ in 0..count {
                let end = offset
                    .checked_add(8)
                    .filter(|&e| e <= blob.len())
                    .ok_or_else(|| Error::Corruption("array blob truncated".to_string()))?;
                let len = u64::from_le_bytes(blob[offset..end].try_into().unwrap()) as usize;
                offset = end;
                let end = offset
                    .checked_add(len)
                    .filter(|&e| e <= blob.len())
                    .ok_or_else(|| Error::Corruption("array blob truncated".to_string()))?;
                arrays.push(NdArray::from_bytes(&blob[offset..end])?);
                offset = end;
            }
            Ok(Cell::ArrayList(arrays))
        }
        Some(other) => Err(Error::Corruption(format!(
            "unknown array blob tag 0x{:02x}",
            other
        ))),
        None => Err(Error::Corruption("empty array blob".to_string())),
    }
}
