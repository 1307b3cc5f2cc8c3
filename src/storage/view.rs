//! # Row Views
//!
//! Readers of a variable-width column never receive copies. Each row is
//! handed out as a `RowView<'a>` borrowing the column's mapping, so a view
//! cannot outlive the column it came from.
//!
//! The variant is chosen once per column from the field's data type:
//!
//! | `ViewKind` | Data types | View |
//! |------------|------------|------|
//! | `Text` | String, VarChar | `RowView::Text(&str)` |
//! | `Json` | Json | `RowView::Json(JsonView)` |
//! | `Bytes` | Array and other self-describing payloads | `RowView::Bytes(&[u8])` |
//!
//! Text and JSON rows are UTF-8 validated when the column is sealed, so
//! building a `&str` per access costs nothing.

use std::ops::Range;

use crate::types::DataType;

/// Closed set of view variants a variable-width column can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewKind {
    Text,
    Json,
    #[default]
    Bytes,
}

impl ViewKind {
    pub fn for_type(data_type: DataType) -> Self {
        if data_type.is_text() {
            ViewKind::Text
        } else if data_type.is_json() {
            ViewKind::Json
        } else {
            ViewKind::Bytes
        }
    }

    /// Returns true if rows must be valid UTF-8.
    pub fn requires_utf8(&self) -> bool {
        matches!(self, ViewKind::Text | ViewKind::Json)
    }
}

/// Byte range of one row inside a column's mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSpan {
    pub start: usize,
    pub len: usize,
}

impl RowSpan {
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }
}

/// A JSON document borrowed from a column, with its trailing padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonView<'a> {
    text: &'a str,
    padded: &'a [u8],
}

impl<'a> JsonView<'a> {
    pub fn as_str(&self) -> &'a str {
        self.text
    }

    /// The document followed by at least `JSON_PADDING` readable bytes.
    ///
    /// Bytes past the document belong to the next row or to the zeroed tail
    /// of the mapping; parsers must treat them as scratch.
    pub fn padded(&self) -> &'a [u8] {
        self.padded
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Zero-copy view of one variable-width row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowView<'a> {
    Text(&'a str),
    Json(JsonView<'a>),
    Bytes(&'a [u8]),
}

impl<'a> RowView<'a> {
    /// Builds the view for `span` inside `mapping`.
    ///
    /// `mapping` is the column's whole mapped region (including padding).
    /// Text and JSON spans must have passed UTF-8 validation at seal time.
    pub(crate) fn from_validated(
        kind: ViewKind,
        mapping: &'a [u8],
        span: RowSpan,
        padding: usize,
    ) -> Self {
        let bytes = &mapping[span.range()];
        match kind {
            ViewKind::Bytes => RowView::Bytes(bytes),
            ViewKind::Text => RowView::Text(validated_str(bytes)),
            ViewKind::Json => RowView::Json(JsonView {
                text: validated_str(bytes),
                padded: &mapping[span.start..span.start + span.len + padding],
            }),
        }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        match *self {
            RowView::Text(s) => s.as_bytes(),
            RowView::Json(j) => j.as_str().as_bytes(),
            RowView::Bytes(b) => b,
        }
    }

    /// The row as text, or None for byte rows.
    pub fn as_str(&self) -> Option<&'a str> {
        match *self {
            RowView::Text(s) => Some(s),
            RowView::Json(j) => Some(j.as_str()),
            RowView::Bytes(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn validated_str(bytes: &[u8]) -> &str {
    debug_assert!(std::str::from_utf8(bytes).is_ok());
    // SAFETY: text and JSON rows are checked with std::str::from_utf8 when
    // the column is sealed, and a sealed column's mapping is immutable.
    unsafe { std::str::from_utf8_unchecked(bytes) }
}
