//! Tabular frame type
//!
//! A `Frame` is rows x named columns. Columns hold cells, and a column's
//! cells do not have to be uniform; mixed and array-valued columns are what
//! make the packing path in the tabular codec necessary, since the columnar
//! file format only stores uniform scalar columns natively.
//!
//! `Frame` is registered with the serializer registry as an extension
//! payload; it never flows through the generic codec.

use crate::error::{Error, Result};
use crate::ndarray::NdArray;
use crate::value::Payload;
use std::any::Any;

/// A single cell in a frame column
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// 64-bit integer
    Int(i64),
    /// 64-bit float (IEEE-754 equality)
    Float(f64),
    /// Boolean
    Bool(bool),
    /// UTF-8 string
    Str(String),
    /// Raw bytes (packed columns decode to this before unpacking)
    Bytes(Vec<u8>),
    /// A fixed-shape array
    Array(NdArray),
    /// A one-dimensional collection of arrays
    ArrayList(Vec<NdArray>),
}

impl Cell {
    /// Cell kind name for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Cell::Int(_) => "Int",
            Cell::Float(_) => "Float",
            Cell::Bool(_) => "Bool",
            Cell::Str(_) => "Str",
            Cell::Bytes(_) => "Bytes",
            Cell::Array(_) => "Array",
            Cell::ArrayList(_) => "ArrayList",
        }
    }

    /// Whether this cell holds array data
    pub fn is_array_valued(&self) -> bool {
        matches!(self, Cell::Array(_) | Cell::ArrayList(_))
    }
}

/// A named column of cells
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    cells: Vec<Cell>,
}

impl Column {
    /// Create a column from raw cells
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Column {
            name: name.into(),
            cells,
        }
    }

    /// Integer column
    pub fn int(name: impl Into<String>, values: Vec<i64>) -> Self {
        Column::new(name, values.into_iter().map(Cell::Int).collect())
    }

    /// Float column
    pub fn float(name: impl Into<String>, values: Vec<f64>) -> Self {
        Column::new(name, values.into_iter().map(Cell::Float).collect())
    }

    /// Boolean column
    pub fn bool_(name: impl Into<String>, values: Vec<bool>) -> Self {
        Column::new(name, values.into_iter().map(Cell::Bool).collect())
    }

    /// String column
    pub fn str_(name: impl Into<String>, values: Vec<&str>) -> Self {
        Column::new(
            name,
            values.into_iter().map(|s| Cell::Str(s.to_string())).collect(),
        )
    }

    /// Bytes column
    pub fn bytes(name: impl Into<String>, values: Vec<Vec<u8>>) -> Self {
        Column::new(name, values.into_iter().map(Cell::Bytes).collect())
    }

    /// Array column
    pub fn array(name: impl Into<String>, values: Vec<NdArray>) -> Self {
        Column::new(name, values.into_iter().map(Cell::Array).collect())
    }

    /// Column of array collections
    pub fn array_list(name: impl Into<String>, values: Vec<Vec<NdArray>>) -> Self {
        Column::new(name, values.into_iter().map(Cell::ArrayList).collect())
    }

    /// Column name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The cells
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the column has no rows
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether any cell holds array data
    pub fn has_array_cells(&self) -> bool {
        self.cells.iter().any(Cell::is_array_valued)
    }
}

/// A tabular value: named columns of equal length
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    columns: Vec<Column>,
}

impl Frame {
    /// Create a frame, validating equal column lengths and unique names
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let rows = first.len();
            for col in &columns {
                if col.len() != rows {
                    return Err(Error::InvalidColumn {
                        name: col.name().to_string(),
                        reason: format!("has {} rows, expected {}", col.len(), rows),
                    });
                }
            }
        }
        for (i, col) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name() == col.name()) {
                return Err(Error::InvalidColumn {
                    name: col.name().to_string(),
                    reason: "duplicate column name".to_string(),
                });
            }
        }
        Ok(Frame { columns })
    }

    /// A frame with no columns and no rows
    pub fn empty() -> Self {
        Frame { columns: vec![] }
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    /// Number of columns
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// All columns in declaration order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in declaration order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }
}

impl Payload for Frame {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_payload(&self, other: &dyn Payload) -> bool {
        other
            .as_any()
            .downcast_ref::<Frame>()
            .is_some_and(|o| o == self)
    }
}
