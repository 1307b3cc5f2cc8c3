//! Fuzz testing for variable-width columns.
//!
//! This fuzz target appends arbitrary rows to a growable column, optionally
//! seals it with an arbitrary replacement index, and checks every view
//! against a plain `Vec<Vec<u8>>` model.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use segcol::storage::{RowView, VariableColumn};
use segcol::types::FieldMeta;

#[derive(Debug, Arbitrary)]
struct ColumnInput {
    kind: FuzzFieldKind,
    row_count_hint: u8,
    rows: Vec<Vec<u8>>,
    replacement: Option<Vec<u16>>,
}

#[derive(Debug, Arbitrary, Clone, Copy)]
enum FuzzFieldKind {
    VarChar,
    Json,
    Array,
}

impl FuzzFieldKind {
    fn field(self) -> FieldMeta {
        match self {
            FuzzFieldKind::VarChar => FieldMeta::varchar("s", None),
            FuzzFieldKind::Json => FieldMeta::json("doc"),
            FuzzFieldKind::Array => FieldMeta::array("a"),
        }
    }
}

fuzz_target!(|input: ColumnInput| {
    if input.rows.len() > 1000 {
        return;
    }

    let field = input.kind.field();
    let mut col = VariableColumn::growable(input.row_count_hint as usize, &field).unwrap();

    let mut offsets = Vec::with_capacity(input.rows.len());
    let mut total = 0u64;
    for row in &input.rows {
        if row.len() > 4096 {
            return;
        }
        col.append(row).unwrap();
        offsets.push(total);
        total += row.len() as u64;
    }

    assert_eq!(col.offsets(), offsets.as_slice());
    for (i, row) in input.rows.iter().enumerate() {
        assert_eq!(col.raw_at(i), row.as_slice());
    }

    let replacement = input
        .replacement
        .map(|idx| idx.into_iter().map(u64::from).collect::<Vec<_>>());
    let expected_offsets = match &replacement {
        Some(idx) if !idx.is_empty() => idx.clone(),
        _ => offsets,
    };

    let sealed = match col.seal(replacement) {
        Ok(sealed) => sealed,
        Err(_) => return,
    };

    assert_eq!(sealed.offsets(), expected_offsets.as_slice());
    assert_eq!(sealed.row_count(), expected_offsets.len());

    for (i, view) in sealed.iter().enumerate() {
        assert_eq!(view.as_bytes(), sealed.raw_at(i));
        match view {
            RowView::Text(s) => assert!(s.len() == view.len()),
            RowView::Json(doc) => assert!(doc.padded().len() >= doc.len()),
            RowView::Bytes(_) => {}
        }
    }
});
