//! # segcol Configuration Module
//!
//! Centralizes the configuration constants of the column storage layer.
//! Padding and growth values are consumed by `MappedBuffer`; schema bounds
//! are consumed by `FieldMeta`.
//!
//! ## Module Organization
//!
//! - [`constants`]: All numeric configuration values with dependency documentation

pub mod constants;
pub use constants::*;
