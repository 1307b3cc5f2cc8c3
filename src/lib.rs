//! # segcol - Memory-Mapped Column Storage
//!
//! segcol holds the field data of a vector-database segment. During ingestion
//! each field is a growable anonymous mapping that rows are appended to; once
//! the segment is sealed the same bytes are served read-only from a file
//! mapping. Readers get spans and row views that point straight into the
//! mapping:
//!
//! - **Zero-copy data access**: row views are slices of the mapping
//! - **Single ownership**: each mapping has exactly one owner and is unmapped exactly once
//! - **Compile-time lifetimes**: views borrow their column, so they cannot dangle
//!
//! ## Quick Start
//!
//! ```ignore
//! use segcol::storage::{FixedColumn, RowView, VariableColumn};
//! use segcol::types::{DataType, FieldMeta};
//!
//! let pk = FieldMeta::new("pk", DataType::Int64);
//! let mut ids = FixedColumn::growable(2, &pk)?;
//! ids.append(&1i64.to_le_bytes())?;
//! ids.append(&2i64.to_le_bytes())?;
//! assert_eq!(ids.view().stride(), 8);
//!
//! let title = FieldMeta::varchar("title", None);
//! let mut titles = VariableColumn::growable(2, &title)?;
//! titles.append(b"first")?;
//! titles.append(b"second")?;
//! let titles = titles.seal(None)?;
//! assert_eq!(titles.get(1), RowView::Text("second"));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Query / index code (consumers)    │
//! ├─────────────────────────────────────┤
//! │   Column trait, Span, RowView       │
//! ├─────────────────────────────────────┤
//! │   FixedColumn │ Variable columns    │
//! ├─────────────────────────────────────┤
//! │   MappedBuffer (append / expand)    │
//! ├─────────────────────────────────────┤
//! │   MappedRegion (mmap / munmap)      │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Fallible operations return `eyre::Result`. Failing to unmap a region is
//! not recoverable: it is logged through `tracing` and the process aborts.
//! Contract violations (viewing an empty fixed column, indexing past the
//! last row) panic.
//!
//! ## Module Overview
//!
//! - [`storage`]: Mapped regions, buffers, columns, spans and views
//! - [`types`]: `DataType` and the `FieldMeta` schema descriptor
//! - [`config`]: Padding, growth and schema constants

pub mod config;
pub mod storage;
pub mod types;

pub use storage::{
    Column, FixedColumn, RowView, SealedVariableColumn, Span, VariableColumn,
};
pub use types::{DataType, FieldMeta};
