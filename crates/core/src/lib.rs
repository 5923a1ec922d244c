//! Core types for the recall cache
//!
//! This crate defines the foundational types used throughout the system:
//! - Value: dynamic value enum plus the extension-payload escape hatch
//! - TypeTag: stable on-disk identity for registered extension types
//! - CacheKey: (version, digest) lookup key for memoized results
//! - Frame / NdArray: the tabular and array value types
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod frame;
pub mod key;
pub mod ndarray;
pub mod tag;
pub mod value;

pub use error::{Error, Result};
pub use frame::{Cell, Column, Frame};
pub use key::CacheKey;
pub use ndarray::{DType, NdArray};
pub use tag::{TagError, TypeTag};
pub use value::{ExtValue, Payload, Value};
