//! # Field Descriptors
//!
//! This module provides `FieldMeta`, the schema descriptor the column layer
//! consumes. It pairs a `DataType` with the metadata needed to size storage:
//!
//! - `dim`: lane count for vector fields
//! - `max_length`: declared bound for VARCHAR fields (informational only;
//!   storage never truncates)
//!
//! The column layer asks three questions of a field: how wide is one element,
//! is it variable length, and how much trailing padding must be mapped. It
//! does not validate the descriptor against the data it is given.
//!
//! ## Usage
//!
//! ```ignore
//! use segcol::types::{DataType, FieldMeta};
//!
//! let pk = FieldMeta::new("pk", DataType::Int64);
//! let title = FieldMeta::varchar("title", Some(512));
//! let embedding = FieldMeta::vector("embedding", DataType::FloatVector, 768)?;
//! let extra = FieldMeta::json("extra");
//! ```

use eyre::{ensure, Result};

use super::DataType;
use crate::config::{JSON_PADDING, MAX_VECTOR_DIM};
use crate::storage::ViewKind;

/// Field descriptor with type and sizing metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
    name: String,
    data_type: DataType,
    dim: Option<u32>,
    max_length: Option<u32>,
}

impl FieldMeta {
    /// Creates a scalar or variable-length field with no extra metadata.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            dim: None,
            max_length: None,
        }
    }

    /// Creates a VARCHAR(n) field. Pass None for unbounded length.
    pub fn varchar(name: impl Into<String>, max_length: Option<u32>) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::VarChar,
            dim: None,
            max_length,
        }
    }

    pub fn json(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Json)
    }

    pub fn array(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Array)
    }

    /// Creates a vector field of `dim` lanes.
    pub fn vector(name: impl Into<String>, data_type: DataType, dim: u32) -> Result<Self> {
        let name = name.into();
        ensure!(
            data_type.is_vector(),
            "field '{}' has non-vector type {:?}",
            name,
            data_type
        );
        ensure!(
            dim > 0 && dim <= MAX_VECTOR_DIM,
            "field '{}' dimension {} outside 1..={}",
            name,
            dim,
            MAX_VECTOR_DIM
        );
        if data_type == DataType::BinaryVector {
            ensure!(
                dim % 8 == 0,
                "binary vector field '{}' dimension {} is not a multiple of 8",
                name,
                dim
            );
        }

        Ok(Self {
            name,
            data_type,
            dim: Some(dim),
            max_length: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn dim(&self) -> Option<u32> {
        self.dim
    }

    pub fn max_length(&self) -> Option<u32> {
        self.max_length
    }

    /// Byte width of one element, or None for variable-length fields.
    pub fn size_of(&self) -> Option<usize> {
        match self.dim {
            Some(dim) => self.data_type.vector_size(dim),
            None => self.data_type.fixed_size(),
        }
    }

    pub fn is_variable(&self) -> bool {
        self.data_type.is_variable()
    }

    /// Bytes mapped past the end of a column of this field.
    pub fn padding(&self) -> usize {
        if self.data_type.is_json() {
            JSON_PADDING
        } else {
            0
        }
    }

    /// View variant readers receive for rows of this field.
    pub fn view_kind(&self) -> ViewKind {
        ViewKind::for_type(self.data_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_field_size() {
        let f = FieldMeta::new("age", DataType::Int32);
        assert_eq!(f.size_of(), Some(4));
        assert!(!f.is_variable());
        assert_eq!(f.padding(), 0);
    }

    #[test]
    fn vector_field_size_uses_dimension() {
        let f = FieldMeta::vector("emb", DataType::FloatVector, 4).unwrap();
        assert_eq!(f.size_of(), Some(16));
        assert_eq!(f.dim(), Some(4));
    }

    #[test]
    fn vector_rejects_scalar_type() {
        let err = FieldMeta::vector("emb", DataType::Int64, 4).unwrap_err();
        assert!(err.to_string().contains("non-vector type"));
    }

    #[test]
    fn vector_rejects_zero_dim() {
        assert!(FieldMeta::vector("emb", DataType::FloatVector, 0).is_err());
    }

    #[test]
    fn binary_vector_dim_must_pack_into_bytes() {
        assert!(FieldMeta::vector("bits", DataType::BinaryVector, 12).is_err());
        let f = FieldMeta::vector("bits", DataType::BinaryVector, 64).unwrap();
        assert_eq!(f.size_of(), Some(8));
    }

    #[test]
    fn only_json_is_padded() {
        assert_eq!(FieldMeta::json("doc").padding(), JSON_PADDING);
        assert_eq!(FieldMeta::varchar("s", None).padding(), 0);
        assert_eq!(FieldMeta::array("a").padding(), 0);
    }

    #[test]
    fn variable_fields_have_no_element_size() {
        assert_eq!(FieldMeta::varchar("s", Some(16)).size_of(), None);
        assert_eq!(FieldMeta::varchar("s", Some(16)).max_length(), Some(16));
        assert!(FieldMeta::json("doc").is_variable());
    }

    #[test]
    fn view_kind_follows_type() {
        assert_eq!(FieldMeta::varchar("s", None).view_kind(), ViewKind::Text);
        assert_eq!(FieldMeta::new("s", DataType::String).view_kind(), ViewKind::Text);
        assert_eq!(FieldMeta::json("doc").view_kind(), ViewKind::Json);
        assert_eq!(FieldMeta::array("a").view_kind(), ViewKind::Bytes);
    }
}
