//! Columnar frame container format
//!
//! The binary file format the tabular codec serializes packed frames into.
//! Only uniform scalar/byte columns are storable; array-valued columns must
//! be packed to `Binary` first (that is the tabular codec's job). The
//! format carries a side-metadata map of string entries, which is where the
//! packing record lives under its reserved key.
//!
//! # Format
//!
//! ```text
//! +------------------+
//! | Magic: "RCLF"    | 4 bytes
//! | Format Version   | 4 bytes (u32 LE)
//! | Column Count     | 4 bytes (u32 LE)
//! | Row Count        | 8 bytes (u64 LE)
//! | Column Blocks    | variable
//! | Metadata Count   | 4 bytes (u32 LE)
//! | Metadata Entries | variable
//! | CRC32            | 4 bytes
//! +------------------+
//!
//! Column Block:
//! +------------------+--------------+-------------+------------------+
//! | Name len (u32)   | Name (UTF-8) | Kind (1B)   | Data (variable)  |
//! +------------------+--------------+-------------+------------------+
//!
//! Metadata Entry:
//! +------------------+--------------+------------------+----------------+
//! | Key len (u32)    | Key (UTF-8)  | Value len (u32)  | Value (UTF-8)  |
//! +------------------+--------------+------------------+----------------+
//! ```
//!
//! Fixed-width kinds store rows back to back (i64/f64 LE, bool as one
//! byte); `Utf8` and `Binary` prefix each row with its length.

use byteorder::{LittleEndian, ReadBytesExt};
use recall_core::{Cell, Column, Error, Frame, Result};
use std::collections::BTreeMap;
use std::io::Cursor;

/// Container magic bytes: "RCLF"
pub const COLUMNAR_MAGIC: [u8; 4] = *b"RCLF";

/// Current container format version
pub const COLUMNAR_FORMAT_VERSION: u32 = 1;

/// Column kind bytes
const KIND_INT64: u8 = 0x01;
const KIND_FLOAT64: u8 = 0x02;
const KIND_BOOL: u8 = 0x03;
const KIND_UTF8: u8 = 0x04;
const KIND_BINARY: u8 = 0x05;

/// Serialize a frame plus side metadata to the container format
///
/// # Errors
///
/// `Error::InvalidColumn` if a column is not uniformly one of the storable
/// scalar kinds; array columns must be packed before reaching this layer.
pub fn write(frame: &Frame, metadata: &BTreeMap<String, String>) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&COLUMNAR_MAGIC);
    bytes.extend_from_slice(&COLUMNAR_FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&(frame.num_columns() as u32).to_le_bytes());
    bytes.extend_from_slice(&(frame.num_rows() as u64).to_le_bytes());

    for column in frame.columns() {
        let name = column.name().as_bytes();
        bytes.extend_from_slice(&(name.len() as u32).to_le_bytes());
        bytes.extend_from_slice(name);
        write_column(&mut bytes, column)?;
    }

    bytes.extend_from_slice(&(metadata.len() as u32).to_le_bytes());
    for (key, value) in metadata {
        bytes.extend_from_slice(&(key.len() as u32).to_le_bytes());
        bytes.extend_from_slice(key.as_bytes());
        bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
        bytes.extend_from_slice(value.as_bytes());
    }

    let crc = crc32fast::hash(&bytes);
    bytes.extend_from_slice(&crc.to_le_bytes());
    Ok(bytes)
}

/// Deserialize a container back into a frame and its side metadata
pub fn read(bytes: &[u8]) -> Result<(Frame, BTreeMap<String, String>)> {
    if bytes.len() < 24 {
        return Err(Error::Corruption("columnar container too short".to_string()));
    }
    if bytes[0..4] != COLUMNAR_MAGIC {
        return Err(Error::Corruption("bad columnar magic".to_string()));
    }

    // Verify CRC (last 4 bytes) before trusting anything else
    let data = &bytes[..bytes.len() - 4];
    let stored_crc = u32::from_le_bytes(bytes[bytes.len() - 4..].try_into().unwrap());
    let computed_crc = crc32fast::hash(data);
    if stored_crc != computed_crc {
        return Err(Error::Corruption(format!(
            "columnar checksum mismatch: stored {:08x}, computed {:08x}",
            stored_crc, computed_crc
        )));
    }

    let mut cursor = Cursor::new(data);
    cursor.set_position(4);
    let version = read_u32(&mut cursor)?;
    if version != COLUMNAR_FORMAT_VERSION {
        return Err(Error::Corruption(format!(
            "unsupported columnar format version {}",
            version
        )));
    }
    let column_count = read_u32(&mut cursor)?;
    let row_count = read_u64(&mut cursor)?;

    let mut columns = Vec::with_capacity(column_count as usize);
    for _ in 0..column_count {
        let name = read_string(&mut cursor, data)?;
        let cells = read_column(&mut cursor, data, row_count)?;
        columns.push(Column::new(name, cells));
    }

    let metadata_count = read_u32(&mut cursor)?;
    let mut metadata = BTreeMap::new();
    for _ in 0..metadata_count {
        let key = read_string(&mut cursor, data)?;
        let value = read_string(&mut cursor, data)?;
        metadata.insert(key, value);
    }

    Ok((Frame::new(columns)?, metadata))
}

fn column_kind(column: &Column) -> Result<u8> {
    let mut kind = None;
    for cell in column.cells() {
        let code = match cell {
            Cell::Int(_) => KIND_INT64,
            Cell::Float(_) => KIND_FLOAT64,
            Cell::Bool(_) => KIND_BOOL,
            Cell::Str(_) => KIND_UTF8,
            Cell::Bytes(_) => KIND_BINARY,
            Cell::Array(_) | Cell::ArrayList(_) => {
                return Err(Error::InvalidColumn {
                    name: column.name().to_string(),
                    reason: "array cells are not natively storable; pack the column first"
                        .to_string(),
                })
            }
        };
        match kind {
            None => kind = Some(code),
            Some(k) if k == code => {}
            Some(_) => {
                return Err(Error::InvalidColumn {
                    name: column.name().to_string(),
                    reason: format!("mixed cell kinds ({} among others)", cell.kind_name()),
                })
            }
        }
    }
    // Empty columns carry no cells to inspect; store them as Utf8
    Ok(kind.unwrap_or(KIND_UTF8))
}

fn write_column(bytes: &mut Vec<u8>, column: &Column) -> Result<()> {
    let kind = column_kind(column)?;
    bytes.push(kind);
    for cell in column.cells() {
        match cell {
            Cell::Int(v) => bytes.extend_from_slice(&v.to_le_bytes()),
            Cell::Float(v) => bytes.extend_from_slice(&v.to_le_bytes()),
            Cell::Bool(v) => bytes.push(*v as u8),
            Cell::Str(s) => {
                bytes.extend_from_slice(&(s.len() as u32).to_le_bytes());
                bytes.extend_from_slice(s.as_bytes());
            }
            Cell::Bytes(b) => {
                bytes.extend_from_slice(&(b.len() as u64).to_le_bytes());
                bytes.extend_from_slice(b);
            }
            Cell::Array(_) | Cell::ArrayList(_) => unreachable!("rejected by column_kind"),
        }
    }
    Ok(())
}

fn read_column(cursor: &mut Cursor<&[u8]>, data: &[u8], rows: u64) -> Result<Vec<Cell>> {
    let kind = cursor
        .read_u8()
        .map_err(|_| Error::Corruption("columnar container truncated".to_string()))?;
    let mut cells = Vec::with_capacity(rows as usize);
    for _ in 0..rows {
        let cell = match kind {
            KIND_INT64 => Cell::Int(read_i64(cursor)?),
            KIND_FLOAT64 => Cell::Float(
                cursor
                    .read_f64::<LittleEndian>()
                    .map_err(|_| Error::Corruption("columnar container truncated".to_string()))?,
            ),
            KIND_BOOL => Cell::Bool(
                cursor
                    .read_u8()
                    .map_err(|_| Error::Corruption("columnar container truncated".to_string()))?
                    != 0,
            ),
            KIND_UTF8 => Cell::Str(read_string(cursor, data)?),
            KIND_BINARY => {
                let len = read_u64(cursor)? as usize;
                Cell::Bytes(read_exact(cursor, data, len)?.to_vec())
            }
            other => {
                return Err(Error::Corruption(format!(
                    "unknown column kind 0x{:02x}",
                    other
                )))
            }
        };
        cells.push(cell);
    }
    Ok(cells)
}

fn read_u32(cursor: &mut Cursor<&[u8]>) -> Result<u32> {
    cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| Error::Corruption("columnar container truncated".to_string()))
}

fn read_u64(cursor: &mut Cursor<&[u8]>) -> Result<u64> {
    cursor
        .read_u64::<LittleEndian>()
        .map_err(|_| Error::Corruption("columnar container truncated".to_string()))
}

fn read_i64(cursor: &mut Cursor<&[u8]>) -> Result<i64> {
    cursor
        .read_i64::<LittleEndian>()
        .map_err(|_| Error::Corruption("columnar container truncated".to_string()))
}

fn read_exact<'a>(cursor: &mut Cursor<&[u8]>, data: &'a [u8], len: usize) -> Result<&'a [u8]> {
    let start = cursor.position() as usize;
    let end = start
        .checked_add(len)
        .filter(|&e| e <= data.len())
        .ok_or_else(|| Error::Corruption("columnar field overruns container".to_string()))?;
    cursor.set_position(end as u64);
    Ok(&data[start..end])
}

fn read_string(cursor: &mut Cursor<&[u8]>, data: &[u8]) -> Result<String> {
    let len = read_u32(cursor)? as usize;
    let raw = read_exact(cursor, data, len)?;
    String::from_utf8(raw.to_vec())
        .map_err(|_| Error::Corruption("invalid UTF-8 in columnar container".to_string()))
}
