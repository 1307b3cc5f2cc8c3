//! # Column Spans
//!
//! The read contract handed to query and index code. A span is a borrowed
//! description of a column's rows:
//!
//! - `FixedSpan`: base pointer, row count and a uniform stride
//! - `VariableSpan`: base mapping plus one `RowSpan` per row
//!
//! Both borrow the column, so a span can never be held across a drop or
//! (for growable columns) an append.

use super::view::{RowSpan, RowView, ViewKind};

/// Read surface shared by every column kind.
pub trait Column {
    fn row_count(&self) -> usize;

    /// Content bytes the column can hold without remapping.
    fn capacity(&self) -> usize;

    /// Written row bytes, concatenated.
    fn data(&self) -> &[u8];

    fn span(&self) -> Span<'_>;
}

#[derive(Debug, Clone, Copy)]
pub enum Span<'a> {
    Fixed(FixedSpan<'a>),
    Variable(VariableSpan<'a>),
}

impl<'a> Span<'a> {
    pub fn row_count(&self) -> usize {
        match self {
            Span::Fixed(s) => s.row_count(),
            Span::Variable(s) => s.len(),
        }
    }

    /// Raw bytes of row `i`, whatever the column kind.
    pub fn row_bytes(&self, i: usize) -> &'a [u8] {
        match self {
            Span::Fixed(s) => s.row(i),
            Span::Variable(s) => s.get(i).as_bytes(),
        }
    }
}

/// Uniform-stride rows starting at one base pointer.
#[derive(Debug, Clone, Copy)]
pub struct FixedSpan<'a> {
    data: &'a [u8],
    row_count: usize,
    stride: usize,
}

impl<'a> FixedSpan<'a> {
    pub(crate) fn new(data: &'a [u8], row_count: usize, stride: usize) -> Self {
        debug_assert_eq!(data.len(), row_count * stride);
        Self {
            data,
            row_count,
            stride,
        }
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// All `row_count * stride` addressable bytes.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    pub fn row(&self, i: usize) -> &'a [u8] {
        assert!(
            i < self.row_count,
            "row {} out of bounds (row_count={})",
            i,
            self.row_count
        );
        &self.data[i * self.stride..(i + 1) * self.stride]
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a [u8]> + 'a {
        self.data.chunks_exact(self.stride)
    }
}

/// Per-row views into one variable-width mapping.
#[derive(Debug, Clone, Copy)]
pub struct VariableSpan<'a> {
    mapping: &'a [u8],
    rows: &'a [RowSpan],
    kind: ViewKind,
    padding: usize,
}

impl<'a> VariableSpan<'a> {
    pub(crate) fn new(mapping: &'a [u8], rows: &'a [RowSpan], kind: ViewKind, padding: usize) -> Self {
        Self {
            mapping,
            rows,
            kind,
            padding,
        }
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.mapping.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn row_spans(&self) -> &'a [RowSpan] {
        self.rows
    }

    pub fn get(&self, i: usize) -> RowView<'a> {
        assert!(
            i < self.rows.len(),
            "row {} out of bounds (row_count={})",
            i,
            self.rows.len()
        );
        RowView::from_validated(self.kind, self.mapping, self.rows[i], self.padding)
    }

    pub fn iter(&self) -> impl Iterator<Item = RowView<'a>> + 'a {
        let (mapping, kind, padding) = (self.mapping, self.kind, self.padding);
        self.rows
            .iter()
            .map(move |&span| RowView::from_validated(kind, mapping, span, padding))
    }
}
