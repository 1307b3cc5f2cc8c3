//! # Field Type System
//!
//! The schema-side vocabulary consumed by the column storage layer.
//!
//! ## Module Structure
//!
//! - `data_type`: Canonical `DataType` enum
//! - `field`: `FieldMeta` descriptor with sizing metadata
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | `DataType` | Storage-level type discriminant |
//! | `FieldMeta` | Element size, variable flag, padding and view kind for a field |

mod data_type;
mod field;

pub use data_type::DataType;
pub use field::FieldMeta;
