//! # Storage Module
//!
//! This module provides the column storage layer: memory-mapped buffers that
//! hold a segment's field data either as growable anonymous memory during
//! ingestion or as read-only file mappings once the segment is sealed.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │   Column trait / Span  (read contract)       │
//! ├──────────────────────┬───────────────────────┤
//! │   FixedColumn        │  VariableColumn ──seal──> SealedVariableColumn
//! ├──────────────────────┴───────────────────────┤
//! │   MappedBuffer  (length / capacity / padding)│
//! ├──────────────────────────────────────────────┤
//! │   MappedRegion  (one mmap, unmapped on drop) │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! - **Zero-copy reads**: spans and row views are slices into the mapping
//! - **Amortized growth**: overflow remaps to twice the required size
//! - **Page-cache serving**: file-backed columns are never copied into memory
//!
//! ## Safety Model
//!
//! Growth replaces the mapping, so any pointer into the old one dangles. As
//! in the rest of the crate, the borrow checker carries this:
//!
//! ```text
//! FixedColumn::view(&self) -> FixedSpan<'_>          // shared borrow
//! VariableColumn::append(&mut self, ..)              // exclusive borrow
//! VariableColumn::seal(self, ..)                     // consumes the builder
//! SealedVariableColumn::get(&self, i) -> RowView<'_> // shared borrow, no append exists
//! ```
//!
//! A view cannot outlive its column, cannot coexist with an append, and a
//! column cannot be sealed twice.
//!
//! ## Thread Safety
//!
//! All column types are `Send + Sync`. Mutation needs `&mut self`, so a single
//! writer is enforced statically; sealed and file-backed columns can be read
//! from any number of threads without locks.
//!
//! ## Platform Support
//!
//! Unix only: regions are created with `mmap(2)` and released with
//! `munmap(2)` through `libc`.
//!
//! ## Module Organization
//!
//! - `region`: `MappedRegion`, the single-owner mmap handle
//! - `buffer`: `MappedBuffer`, growable or file-backed byte storage
//! - `fixed`: `FixedColumn`
//! - `variable`: `VariableColumn` and `SealedVariableColumn`
//! - `view`: `RowView`, `JsonView`, `ViewKind`
//! - `span`: `Column`, `Span`, `FixedSpan`, `VariableSpan`

mod buffer;
mod fixed;
mod region;
mod span;
mod variable;
mod view;

pub use buffer::{BufferMode, MappedBuffer};
pub use fixed::FixedColumn;
pub use region::MappedRegion;
pub use span::{Column, FixedSpan, Span, VariableSpan};
pub use variable::{SealedVariableColumn, VariableColumn};
pub use view::{JsonView, RowSpan, RowView, ViewKind};
