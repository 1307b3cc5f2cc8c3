//! # Field Data Types
//!
//! This module provides the canonical `DataType` enum for segment fields. It
//! is the storage-level discriminant consumed by the column layer to decide
//! element width, whether rows are fixed or variable length, and which view
//! type readers receive.
//!
//! ## Type Categories
//!
//! | Category | Types | Fixed Size |
//! |----------|-------|------------|
//! | **Boolean** | Bool | 1 byte |
//! | **Integer** | Int8, Int16, Int32, Int64 | 1, 2, 4, 8 bytes |
//! | **Float** | Float, Double | 4, 8 bytes |
//! | **Text** | String, VarChar | Variable |
//! | **Structured** | Array, Json | Variable |
//! | **Vector** | BinaryVector, FloatVector, Float16Vector | dimension-dependent |
//!
//! ## Discriminant Values
//!
//! Discriminants follow the wire values used by segment metadata:
//! - 1-11: Fixed-width scalars
//! - 20-23: Variable-length payloads
//! - 100-102: Vectors
//!
//! Vector widths depend on the field dimension, which lives in `FieldMeta`,
//! not in the enum.

/// Canonical data type enum for segment fields.
///
/// Uses `#[repr(u8)]` for single-byte storage encoding.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Bool = 1,
    Int8 = 2,
    Int16 = 3,
    Int32 = 4,
    Int64 = 5,
    Float = 10,
    Double = 11,

    String = 20,
    VarChar = 21,
    Array = 22,
    Json = 23,

    BinaryVector = 100,
    FloatVector = 101,
    Float16Vector = 102,
}

impl DataType {
    /// Returns the byte size of a scalar element, or None for variable-length
    /// and vector types.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            DataType::Bool | DataType::Int8 => Some(1),
            DataType::Int16 => Some(2),
            DataType::Int32 | DataType::Float => Some(4),
            DataType::Int64 | DataType::Double => Some(8),
            DataType::String
            | DataType::VarChar
            | DataType::Array
            | DataType::Json
            | DataType::BinaryVector
            | DataType::FloatVector
            | DataType::Float16Vector => None,
        }
    }

    /// Returns true if rows of this type have differing byte lengths.
    pub fn is_variable(&self) -> bool {
        matches!(
            self,
            DataType::String | DataType::VarChar | DataType::Array | DataType::Json
        )
    }

    /// Returns true for UTF-8 string types.
    pub fn is_text(&self) -> bool {
        matches!(self, DataType::String | DataType::VarChar)
    }

    pub fn is_json(&self) -> bool {
        matches!(self, DataType::Json)
    }

    pub fn is_vector(&self) -> bool {
        matches!(
            self,
            DataType::BinaryVector | DataType::FloatVector | DataType::Float16Vector
        )
    }

    /// Returns the byte size of a vector of `dim` lanes, or None for
    /// non-vector types.
    ///
    /// Binary vectors pack eight lanes per byte.
    pub fn vector_size(&self, dim: u32) -> Option<usize> {
        let dim = dim as usize;
        match self {
            DataType::BinaryVector => Some(dim / 8),
            DataType::FloatVector => Some(dim * 4),
            DataType::Float16Vector => Some(dim * 2),
            _ => None,
        }
    }
}

impl TryFrom<u8> for DataType {
    type Error = eyre::Report;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(DataType::Bool),
            2 => Ok(DataType::Int8),
            3 => Ok(DataType::Int16),
            4 => Ok(DataType::Int32),
            5 => Ok(DataType::Int64),
            10 => Ok(DataType::Float),
            11 => Ok(DataType::Double),
            20 => Ok(DataType::String),
            21 => Ok(DataType::VarChar),
            22 => Ok(DataType::Array),
            23 => Ok(DataType::Json),
            100 => Ok(DataType::BinaryVector),
            101 => Ok(DataType::FloatVector),
            102 => Ok(DataType::Float16Vector),
            _ => eyre::bail!("invalid DataType discriminant: {}", value),
        }
    }
}
