//! # Variable-Width Columns
//!
//! Variable-width rows (strings, JSON documents, arrays) are stored as raw
//! concatenated bytes in one `MappedBuffer`, with an offset index recording
//! where each row starts:
//!
//! ```text
//! offsets:  [0,    2,       5]
//! buffer:   | a b | c d e | f |
//!             row0   row1   row2      length = 6
//! ```
//!
//! Row `i` spans `[offsets[i], offsets[i + 1])`; the last row ends at
//! `length`.
//!
//! ## Lifecycle
//!
//! ```text
//! VariableColumn::growable ──append*──┐
//!                                     ├──seal(None)──────> SealedVariableColumn
//! VariableColumn::file_backed ────────┴──seal(Some(idx))─┘
//! ```
//!
//! `seal` consumes the builder, so a column is sealed at most once and no
//! append can follow it. View spans are materialized once at seal time; the
//! sealed column hands out `RowView`s borrowing `&self`, which keeps every
//! view inside the column's lifetime.
//!
//! The file-backed path exists for segments whose offset index was persisted
//! separately: the bytes come from the mapping and the index is supplied to
//! `seal` by the loader.

use std::io::Write;
use std::ops::{Index, Range};
use std::os::fd::AsFd;

use eyre::{ensure, Result, WrapErr};
use tracing::{debug, trace};

use super::buffer::MappedBuffer;
use super::span::{Column, Span, VariableSpan};
use super::view::{RowSpan, RowView, ViewKind};
use crate::types::FieldMeta;

/// Append-accepting variable-width column.
#[derive(Debug, Default)]
pub struct VariableColumn {
    buffer: MappedBuffer,
    offsets: Vec<u64>,
    kind: ViewKind,
}

impl VariableColumn {
    /// Creates an empty growable column. `row_count_hint` pre-sizes the
    /// offset index when it can be reserved; row bytes are mapped on the
    /// first append.
    pub fn growable(row_count_hint: usize, field: &FieldMeta) -> Result<Self> {
        ensure_variable(field)?;

        let mut offsets = Vec::new();
        if offsets.try_reserve(row_count_hint).is_err() {
            debug!(
                row_count_hint,
                field = field.name(),
                "offset index hint too large to reserve, growing on demand"
            );
        }

        Ok(Self {
            buffer: MappedBuffer::growable(row_count_hint, field)?,
            offsets,
            kind: field.view_kind(),
        })
    }

    /// Maps `byte_size` bytes of concatenated rows from `file`.
    ///
    /// The offset index starts empty and must be supplied to `seal`.
    pub fn file_backed<F: AsFd>(file: &F, byte_size: usize, field: &FieldMeta) -> Result<Self> {
        ensure_variable(field)?;

        Ok(Self {
            buffer: MappedBuffer::file_backed(file, byte_size, field)?,
            offsets: Vec::new(),
            kind: field.view_kind(),
        })
    }

    /// Appends one row. Rows are stored in append order.
    pub fn append(&mut self, row: &[u8]) -> Result<()> {
        let offset = self.buffer.len() as u64;
        self.buffer.append(row)?;
        self.offsets.push(offset);
        Ok(())
    }

    pub fn row_count(&self) -> usize {
        self.offsets.len()
    }

    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn is_file_backed(&self) -> bool {
        self.buffer.is_file_backed()
    }

    /// Bytes of row `i`, computed from the offset index.
    pub fn raw_at(&self, i: usize) -> &[u8] {
        let span = row_span(&self.offsets, self.buffer.len(), i);
        &self.buffer.data()[span.range()]
    }

    /// Finalizes the column and builds one view span per row.
    ///
    /// A non-empty `offsets` replaces the recorded index wholesale. The index
    /// must be non-decreasing and within the written bytes; text and JSON
    /// rows must be valid UTF-8. Sealing a column with no rows yields an
    /// empty sealed column.
    pub fn seal(self, offsets: Option<Vec<u64>>) -> Result<SealedVariableColumn> {
        self.try_seal(offsets).map_err(|(_, err)| err)
    }

    /// Same as [`seal`](Self::seal), but a failed seal hands the column back
    /// with the error, so the caller can retry with a corrected index.
    pub fn try_seal(
        self,
        offsets: Option<Vec<u64>>,
    ) -> std::result::Result<SealedVariableColumn, (Self, eyre::Report)> {
        let supplied = offsets.filter(|offsets| !offsets.is_empty());

        let rows = match self.row_spans(supplied.as_deref().unwrap_or(self.offsets.as_slice())) {
            Ok(rows) => rows,
            Err(err) => return Err((self, err)),
        };

        let Self {
            buffer,
            offsets: recorded,
            kind,
        } = self;
        let offsets = supplied.unwrap_or(recorded);

        trace!(
            rows = rows.len(),
            bytes = buffer.len(),
            ?kind,
            "sealed variable column"
        );

        Ok(SealedVariableColumn {
            buffer,
            offsets,
            rows,
            kind,
        })
    }

    fn row_spans(&self, offsets: &[u64]) -> Result<Vec<RowSpan>> {
        let length = self.buffer.len();
        validate_offsets(offsets, length)?;

        let rows: Vec<RowSpan> = (0..offsets.len())
            .map(|i| row_span(offsets, length, i))
            .collect();

        if self.kind.requires_utf8() {
            let data = self.buffer.data();
            for (i, span) in rows.iter().enumerate() {
                std::str::from_utf8(&data[span.range()])
                    .wrap_err_with(|| format!("row {} is not valid UTF-8", i))?;
            }
        }

        Ok(rows)
    }
}

/// Read-only variable-width column with materialized row views.
#[derive(Debug, Default)]
pub struct SealedVariableColumn {
    buffer: MappedBuffer,
    offsets: Vec<u64>,
    rows: Vec<RowSpan>,
    kind: ViewKind,
}

impl SealedVariableColumn {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// The offset index, for persisting alongside the row bytes.
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_file_backed(&self) -> bool {
        self.buffer.is_file_backed()
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.buffer.as_ptr()
    }

    pub fn views(&self) -> VariableSpan<'_> {
        VariableSpan::new(self.buffer.padded(), &self.rows, self.kind, self.buffer.padding())
    }

    /// # Panics
    ///
    /// Panics if `i >= row_count()`.
    pub fn get(&self, i: usize) -> RowView<'_> {
        self.views().get(i)
    }

    pub fn iter(&self) -> impl Iterator<Item = RowView<'_>> + '_ {
        self.views().iter()
    }

    pub fn raw_at(&self, i: usize) -> &[u8] {
        let span = row_span(&self.offsets, self.buffer.len(), i);
        &self.buffer.data()[span.range()]
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<u64> {
        self.buffer.write_to(out)
    }

    /// Asks the kernel to page in the bytes of `rows`.
    pub fn prefetch(&self, rows: Range<usize>) {
        let end = rows.end.min(self.rows.len());
        if rows.start >= end {
            return;
        }
        let first = self.rows[rows.start];
        let last = self.rows[end - 1];
        self.buffer.prefetch(first.start..last.start + last.len);
    }
}

impl Index<usize> for SealedVariableColumn {
    type Output = [u8];

    fn index(&self, i: usize) -> &[u8] {
        self.get(i).as_bytes()
    }
}

impl Column for SealedVariableColumn {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    fn data(&self) -> &[u8] {
        self.buffer.data()
    }

    fn span(&self) -> Span<'_> {
        Span::Variable(self.views())
    }
}

fn ensure_variable(field: &FieldMeta) -> Result<()> {
    ensure!(
        field.is_variable(),
        "field '{}' of type {:?} is fixed width",
        field.name(),
        field.data_type()
    );
    Ok(())
}

fn row_span(offsets: &[u64], length: usize, i: usize) -> RowSpan {
    assert!(
        i < offsets.len(),
        "row {} out of bounds (row_count={})",
        i,
        offsets.len()
    );

    // Offsets never exceed `length`: appended ones come from it and supplied
    // ones pass `validate_offsets`.
    let start = offsets[i] as usize;
    let end = match offsets.get(i + 1) {
        Some(&next) => next as usize,
        None => length,
    };

    RowSpan {
        start,
        len: end - start,
    }
}

fn validate_offsets(offsets: &[u64], length: usize) -> Result<()> {
    for (i, pair) in offsets.windows(2).enumerate() {
        ensure!(
            pair[0] <= pair[1],
            "offset index decreases at row {}: {} > {}",
            i + 1,
            pair[0],
            pair[1]
        );
    }

    if let Some(&last) = offsets.last() {
        let in_bounds = usize::try_from(last).is_ok_and(|last| last <= length);
        ensure!(
            in_bounds,
            "offset index points past the data: {} > {}",
            last,
            length
        );
    }

    Ok(())
}
