//! End-to-end column lifecycles: ingest, seal, persist, reopen file-backed.

use std::fs::File;
use std::io::Write;

use segcol::storage::{Column, FixedColumn, RowView, SealedVariableColumn, VariableColumn};
use segcol::types::{DataType, FieldMeta};
use tempfile::tempdir;

fn persist(bytes: &[u8]) -> (tempfile::TempDir, File) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("field.bin");
    {
        let mut file = File::create(&path).unwrap();
        file.write_all(bytes).unwrap();
        file.sync_all().unwrap();
    }
    let file = File::open(&path).unwrap();
    (dir, file)
}

fn texts(col: &SealedVariableColumn) -> Vec<String> {
    col.iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

#[test]
fn fixed_column_three_rows() {
    let field = FieldMeta::new("i", DataType::Int32);
    let mut col = FixedColumn::growable(3, &field).unwrap();

    col.append(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]).unwrap();

    let view = col.view();
    assert_eq!(view.row_count(), 3);
    assert_eq!(view.stride(), 4);
    assert_eq!(view.row(1), &[5, 6, 7, 8]);
}

#[test]
fn fixed_column_filled_row_by_row() {
    let n = 257;
    let field = FieldMeta::new("pk", DataType::Int64);
    let mut col = FixedColumn::growable(n, &field).unwrap();

    for i in 0..n as i64 {
        col.append(&i.to_le_bytes()).unwrap();
    }

    let view = col.view();
    assert_eq!(view.stride(), 8);
    assert_eq!(view.as_bytes().len(), n * 8);
    for (i, row) in view.iter().enumerate() {
        assert_eq!(i64::from_le_bytes(row.try_into().unwrap()), i as i64);
    }
}

#[test]
fn variable_column_append_then_seal() {
    let field = FieldMeta::varchar("s", None);
    let mut col = VariableColumn::growable(3, &field).unwrap();

    col.append(b"ab").unwrap();
    col.append(b"cde").unwrap();
    col.append(b"f").unwrap();

    assert_eq!(col.offsets(), &[0, 2, 5]);
    assert_eq!(col.raw_at(0), b"ab");
    assert_eq!(col.raw_at(1), b"cde");
    assert_eq!(col.raw_at(2), b"f");

    let sealed = col.seal(None).unwrap();
    assert_eq!(texts(&sealed), ["ab", "cde", "f"]);
}

#[test]
fn file_backed_variable_column_with_supplied_offsets() {
    let field = FieldMeta::varchar("s", None);
    let (_dir, file) = persist(b"abcdef");

    let col = VariableColumn::file_backed(&file, 6, &field).unwrap();
    assert_eq!(col.row_count(), 0);

    let sealed = col.seal(Some(vec![0, 2, 5])).unwrap();

    assert!(sealed.is_file_backed());
    assert_eq!(sealed.offsets(), &[0, 2, 5]);
    assert_eq!(texts(&sealed), ["ab", "cde", "f"]);
    assert_eq!(sealed.raw_at(1), b"cde");
}

#[test]
fn appended_and_reopened_columns_have_identical_views() {
    let field = FieldMeta::varchar("title", Some(64));
    let rows = ["vector", "database", "", "segment", "mmap"];

    let mut col = VariableColumn::growable(rows.len(), &field).unwrap();
    for row in rows {
        col.append(row.as_bytes()).unwrap();
    }
    let built = col.seal(None).unwrap();

    let mut payload = Vec::new();
    built.write_to(&mut payload).unwrap();
    let (_dir, file) = persist(&payload);

    let reopened = VariableColumn::file_backed(&file, payload.len(), &field)
        .unwrap()
        .seal(Some(built.offsets().to_vec()))
        .unwrap();

    assert_eq!(built.row_count(), reopened.row_count());
    let a: Vec<RowView<'_>> = built.iter().collect();
    let b: Vec<RowView<'_>> = reopened.iter().collect();
    assert_eq!(a, b);
}

#[test]
fn file_backed_fixed_column_derives_row_count() {
    let field = FieldMeta::vector("emb", DataType::FloatVector, 4).unwrap();
    let values: Vec<f32> = (0..12).map(|v| v as f32).collect();
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
    let (_dir, file) = persist(&bytes);

    let col = FixedColumn::file_backed(&file, bytes.len(), &field).unwrap();

    assert_eq!(col.row_count(), 3);
    assert_eq!(col.view().stride(), 16);
    assert_eq!(col.as_slice::<f32>().unwrap(), values.as_slice());

    let mut col = col;
    assert!(col.append(&[0; 16]).is_err());
}

#[test]
fn growth_keeps_every_prior_byte_in_place() {
    let field = FieldMeta::array("payload");
    let mut col = VariableColumn::growable(1, &field).unwrap();
    let mut expected: Vec<Vec<u8>> = Vec::new();
    let mut capacities = Vec::new();

    for i in 0..500u32 {
        let row: Vec<u8> = (0..(i % 37 + 1)).map(|b| (b as u8) ^ (i as u8)).collect();
        col.append(&row).unwrap();
        expected.push(row);
        capacities.push(col.capacity());

        for (j, row) in expected.iter().enumerate() {
            assert_eq!(col.raw_at(j), row.as_slice());
        }
    }

    capacities.dedup();
    assert!(capacities.len() > 3, "expected several expansions");

    let offsets = col.offsets();
    assert!(offsets.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn moved_columns_keep_their_mapping() {
    for round in 0..200 {
        let field = FieldMeta::varchar("s", None);
        let mut col = VariableColumn::growable(4, &field).unwrap();
        col.append(format!("row-{}", round).as_bytes()).unwrap();
        let sealed = col.seal(None).unwrap();
        let base = sealed.as_ptr();

        let boxed = Box::new(sealed);
        let mut holder = vec![*boxed];
        let moved = holder.pop().unwrap();

        assert_eq!(moved.as_ptr(), base);
        assert_eq!(moved.get(0).as_str(), Some(format!("row-{}", round).as_str()));
    }
}

#[test]
fn taken_column_is_inert() {
    let field = FieldMeta::new("i", DataType::Int32);
    let mut col = FixedColumn::growable(1024, &field).unwrap();
    col.append(&[1; 64]).unwrap();
    let base = col.as_ptr();

    let owner = std::mem::take(&mut col);

    assert_eq!(owner.as_ptr(), base);
    assert!(col.as_ptr().is_null());
    assert_eq!(col.row_count(), 0);
    drop(col);
    assert_eq!(&owner.view().row(0)[..4], &[1, 1, 1, 1]);
}

#[test]
fn sealed_column_reads_from_many_threads() {
    let field = FieldMeta::json("doc");
    let mut col = VariableColumn::growable(64, &field).unwrap();
    for i in 0..64 {
        col.append(format!(r#"{{"id":{}}}"#, i).as_bytes()).unwrap();
    }
    let sealed = col.seal(None).unwrap();

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for (i, view) in sealed.iter().enumerate() {
                    match view {
                        RowView::Json(doc) => {
                            assert_eq!(doc.as_str(), format!(r#"{{"id":{}}}"#, i));
                            assert!(doc.padded().len() >= doc.len() + 64);
                        }
                        other => panic!("expected json view, got {:?}", other),
                    }
                }
            });
        }
    });
}

#[test]
fn column_trait_objects_share_one_read_surface() {
    let fixed_field = FieldMeta::new("flag", DataType::Bool);
    let mut flags = FixedColumn::growable(2, &fixed_field).unwrap();
    flags.append(&[1, 0]).unwrap();

    let mut names = VariableColumn::growable(2, &FieldMeta::varchar("name", None)).unwrap();
    names.append(b"on").unwrap();
    names.append(b"off").unwrap();
    let names = names.seal(None).unwrap();

    let columns: Vec<&dyn Column> = vec![&flags, &names];
    let counts: Vec<usize> = columns.iter().map(|c| c.row_count()).collect();
    assert_eq!(counts, [2, 2]);
    assert_eq!(columns[0].span().row_bytes(1), &[0]);
    assert_eq!(columns[1].span().row_bytes(1), b"off");
}
