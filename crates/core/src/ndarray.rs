//! Fixed-shape numeric arrays
//!
//! `NdArray` is the cell type for array-valued frame columns: an element
//! type, a shape, and a raw little-endian buffer. The binary encoding is
//! length-preserving and type-preserving so a decoded array is bit-for-bit
//! the array that was encoded.
//!
//! # Encoding
//!
//! ```text
//! +------------------+
//! | DType code       | 1 byte
//! | String width     | 4 bytes (u32 LE, FixedStr only)
//! | Ndim             | 4 bytes (u32 LE)
//! | Shape            | ndim x 8 bytes (u64 LE)
//! | Data             | element count x element size
//! +------------------+
//! ```

use crate::error::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

/// DType code bytes
const DTYPE_I32: u8 = 0x01;
const DTYPE_I64: u8 = 0x02;
const DTYPE_F32: u8 = 0x03;
const DTYPE_F64: u8 = 0x04;
const DTYPE_BOOL: u8 = 0x05;
const DTYPE_U8: u8 = 0x06;
const DTYPE_FIXED_STR: u8 = 0x07;

/// Element type of an [`NdArray`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
    /// Boolean, one byte per element
    Bool,
    /// Unsigned byte
    U8,
    /// Fixed-width string, zero-padded to `width` bytes per element
    FixedStr(u32),
}

impl DType {
    /// Size of one element in bytes
    pub fn size_bytes(&self) -> usize {
        match self {
            DType::I32 | DType::F32 => 4,
            DType::I64 | DType::F64 => 8,
            DType::Bool | DType::U8 => 1,
            DType::FixedStr(width) => *width as usize,
        }
    }

    fn code(&self) -> u8 {
        match self {
            DType::I32 => DTYPE_I32,
            DType::I64 => DTYPE_I64,
            DType::F32 => DTYPE_F32,
            DType::F64 => DTYPE_F64,
            DType::Bool => DTYPE_BOOL,
            DType::U8 => DTYPE_U8,
            DType::FixedStr(_) => DTYPE_FIXED_STR,
        }
    }

    /// Human-readable dtype name for diagnostics
    pub fn name(&self) -> String {
        match self {
            DType::I32 => "i32".to_string(),
            DType::I64 => "i64".to_string(),
            DType::F32 => "f32".to_string(),
            DType::F64 => "f64".to_string(),
            DType::Bool => "bool".to_string(),
            DType::U8 => "u8".to_string(),
            DType::FixedStr(w) => format!("str{}", w),
        }
    }
}

/// A dense n-dimensional array with a fixed element type
///
/// Data is row-major, little-endian. A zero-dimensional array holds exactly
/// one element (shape product over an empty shape is 1).
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    dtype: DType,
    shape: Vec<u64>,
    data: Vec<u8>,
}

impl NdArray {
    /// Create an array, validating that the buffer matches the shape
    pub fn new(dtype: DType, shape: Vec<u64>, data: Vec<u8>) -> Result<Self> {
        let count: u64 = shape.iter().product();
        let expected = count as usize * dtype.size_bytes();
        if data.len() != expected {
            return Err(Error::Corruption(format!(
                "array buffer is {} bytes, shape {:?} of {} requires {}",
                data.len(),
                shape,
                dtype.name(),
                expected
            )));
        }
        Ok(NdArray { dtype, shape, data })
    }

    /// 1-D array of i64 values
    pub fn from_i64(values: &[i64]) -> Self {
        let mut data = Vec::with_capacity(values.len() * 8);
        for v in values {
            data.extend_from_slice(&v.to_le_bytes());
        }
        NdArray {
            dtype: DType::I64,
            shape: vec![values.len() as u64],
            data,
        }
    }

    /// 1-D array of f64 values
    pub fn from_f64(values: &[f64]) -> Self {
        let mut data = Vec::with_capacity(values.len() * 8);
        for v in values {
            data.extend_from_slice(&v.to_le_bytes());
        }
        NdArray {
            dtype: DType::F64,
            shape: vec![values.len() as u64],
            data,
        }
    }

    /// 1-D array of f32 values
    pub fn from_f32(values: &[f32]) -> Self {
        let mut data = Vec::with_capacity(values.len() * 4);
        for v in values {
            data.extend_from_slice(&v.to_le_bytes());
        }
        NdArray {
            dtype: DType::F32,
            shape: vec![values.len() as u64],
            data,
        }
    }

    /// 1-D array of bytes
    pub fn from_u8(values: &[u8]) -> Self {
        NdArray {
            dtype: DType::U8,
            shape: vec![values.len() as u64],
            data: values.to_vec(),
        }
    }

    /// Zero-dimensional i64
    pub fn scalar_i64(value: i64) -> Self {
        NdArray {
            dtype: DType::I64,
            shape: vec![],
            data: value.to_le_bytes().to_vec(),
        }
    }

    /// Zero-dimensional f64
    pub fn scalar_f64(value: f64) -> Self {
        NdArray {
            dtype: DType::F64,
            shape: vec![],
            data: value.to_le_bytes().to_vec(),
        }
    }

    /// Zero-dimensional bool
    pub fn scalar_bool(value: bool) -> Self {
        NdArray {
            dtype: DType::Bool,
            shape: vec![],
            data: vec![value as u8],
        }
    }

    /// Zero-dimensional fixed-width string, zero-padded to `width` bytes
    ///
    /// # Errors
    ///
    /// Fails if the string is longer than `width` bytes.
    pub fn fixed_str(width: u32, s: &str) -> Result<Self> {
        if s.len() > width as usize {
            return Err(Error::Corruption(format!(
                "string of {} bytes does not fit fixed width {}",
                s.len(),
                width
            )));
        }
        let mut data = vec![0u8; width as usize];
        data[..s.len()].copy_from_slice(s.as_bytes());
        Ok(NdArray {
            dtype: DType::FixedStr(width),
            shape: vec![],
            data,
        })
    }

    /// Element type
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Shape (empty for zero-dimensional arrays)
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Raw little-endian buffer
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Total number of elements
    pub fn element_count(&self) -> u64 {
        self.shape.iter().product()
    }

    /// Decode the buffer as i64 values, if the dtype matches
    pub fn i64_values(&self) -> Option<Vec<i64>> {
        if self.dtype != DType::I64 {
            return None;
        }
        Some(
            self.data
                .chunks_exact(8)
                .map(|c| i64::from_le_bytes(c.try_into().expect("chunk of 8")))
                .collect(),
        )
    }

    /// Decode the buffer as f64 values, if the dtype matches
    pub fn f64_values(&self) -> Option<Vec<f64>> {
        if self.dtype != DType::F64 {
            return None;
        }
        Some(
            self.data
                .chunks_exact(8)
                .map(|c| f64::from_le_bytes(c.try_into().expect("chunk of 8")))
                .collect(),
        )
    }

    /// Stack arrays of identical dtype and shape along a new leading axis
    ///
    /// # Errors
    ///
    /// Fails on an empty input or any dtype/shape disagreement; callers that
    /// stack best-effort treat the error as "keep the original structure".
    pub fn stack(arrays: &[NdArray]) -> Result<NdArray> {
        let first = arrays.first().ok_or_else(|| Error::TypeMismatch {
            expected: "at least one array".to_string(),
            actual: "empty collection".to_string(),
        })?;
        for a in &arrays[1..] {
            if a.dtype != first.dtype || a.shape != first.shape {
                return Err(Error::TypeMismatch {
                    expected: format!("{} array of shape {:?}", first.dtype.name(), first.shape),
                    actual: format!("{} array of shape {:?}", a.dtype.name(), a.shape),
                });
            }
        }
        let mut shape = Vec::with_capacity(first.shape.len() + 1);
        shape.push(arrays.len() as u64);
        shape.extend_from_slice(&first.shape);

        let mut data = Vec::with_capacity(first.data.len() * arrays.len());
        for a in arrays {
            data.extend_from_slice(&a.data);
        }
        Ok(NdArray {
            dtype: first.dtype,
            shape,
            data,
        })
    }

    /// Serialize to the binary encoding
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(16 + self.shape.len() * 8 + self.data.len());
        bytes.push(self.dtype.code());
        if let DType::FixedStr(width) = self.dtype {
            bytes.extend_from_slice(&width.to_le_bytes());
        }
        bytes.extend_from_slice(&(self.shape.len() as u32).to_le_bytes());
        for dim in &self.shape {
            bytes.extend_from_slice(&dim.to_le_bytes());
        }
        bytes.extend_from_slice(&self.data);
        bytes
    }

    /// Deserialize from the binary encoding
    pub fn from_bytes(bytes: &[u8]) -> Result<NdArray> {
        let mut cursor = Cursor::new(bytes);
        let code = cursor
            .read_u8()
            .map_err(|_| Error::Corruption("array encoding truncated".to_string()))?;
        let dtype = match code {
            DTYPE_I32 => DType::I32,
            DTYPE_I64 => DType::I64,
            DTYPE_F32 => DType::F32,
            DTYPE_F64 => DType::F64,
            DTYPE_BOOL => DType::Bool,
            DTYPE_U8 => DType::U8,
            DTYPE_FIXED_STR => {
                let width = cursor
                    .read_u32::<LittleEndian>()
                    .map_err(|_| Error::Corruption("array encoding truncated".to_string()))?;
                DType::FixedStr(width)
            }
            other => {
                return Err(Error::Corruption(format!(
                    "unknown array dtype code 0x{:02x}",
                    other
                )))
            }
        };
        let ndim = cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| Error::Corruption("array encoding truncated".to_string()))?;
        let mut shape = Vec::with_capacity(ndim as usize);
        for _ in 0..ndim {
            let dim = cursor
                .read_u64::<LittleEndian>()
                .map_err(|_| Error::Corruption("array encoding truncated".to_string()))?;
            shape.push(dim);
        }
        let data = bytes[cursor.position() as usize..].to_vec();
        NdArray::new(dtype, shape, data)
    }
}
