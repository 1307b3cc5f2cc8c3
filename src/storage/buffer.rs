//! # Mapped Buffers
//!
//! `MappedBuffer` is the storage shared by every column kind: one
//! `MappedRegion` plus the bookkeeping that separates what is mapped from what
//! has been written.
//!
//! ## Layout
//!
//! ```text
//! 0                      length                 capacity        capacity + padding
//! +----------------------+----------------------+----------------+
//! |  written row bytes   |  zeroed, unwritten   |    padding     |
//! +----------------------+----------------------+----------------+
//! ```
//!
//! `padding` is non-zero only for JSON fields, where in-place SIMD parsers
//! read up to `JSON_PADDING` bytes past the last document.
//!
//! ## Modes
//!
//! - **Growable**: anonymous mapping sized from the row estimate. `append`
//!   copies into the tail; overflowing `capacity` triggers `expand`, which maps
//!   a fresh region of `GROWTH_FACTOR * required + padding` bytes of capacity,
//!   copies `[0, length)`, and releases the old region. The mapping is never
//!   resized in place.
//! - **File-backed**: read-only mapping of an existing file with
//!   `length == capacity == byte_size`. Immutable from construction.
//!
//! Variable-length fields carry no element width, so their growable buffers
//! start with zero capacity and grow on the first append. A padded buffer
//! always maps at least its padding, even with zero capacity or over an empty
//! file, so every row is followed by `padding` readable bytes.
//!
//! ## Safety
//!
//! Growth replaces the region, invalidating every pointer into the old one.
//! `append` and `expand` take `&mut self` while `data()` borrows `&self`, so
//! the borrow checker rules out a slice that survives a growth.

use std::io::Write;
use std::ops::Range;
use std::os::fd::AsFd;

use eyre::{ensure, eyre, Result, WrapErr};
use tracing::debug;

use super::region::MappedRegion;
use crate::config::GROWTH_FACTOR;
use crate::types::FieldMeta;

/// How a buffer's region was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferMode {
    /// Anonymous mapping that accepts appends.
    #[default]
    Growable,
    /// Read-only mapping over a file.
    FileBacked,
}

/// Growable or file-backed byte storage for one column.
///
/// `Default` is the moved-from state: nothing mapped, zero capacity, and a
/// drop that releases nothing.
#[derive(Debug, Default)]
pub struct MappedBuffer {
    region: MappedRegion,
    capacity: usize,
    length: usize,
    padding: usize,
    mode: BufferMode,
}

impl MappedBuffer {
    /// Creates a growable buffer with room for `rows` elements of `field`.
    pub fn growable(rows: usize, field: &FieldMeta) -> Result<Self> {
        let padding = field.padding();

        let capacity = match field.size_of() {
            Some(size) => rows.checked_mul(size).ok_or_else(|| {
                eyre!(
                    "capacity overflow for field '{}': {} rows of {} bytes",
                    field.name(),
                    rows,
                    size
                )
            })?,
            None => 0,
        };

        let mapped = capacity.checked_add(padding).ok_or_else(|| {
            eyre!(
                "capacity overflow for field '{}': {} bytes plus {} padding",
                field.name(),
                capacity,
                padding
            )
        })?;
        let region = MappedRegion::anonymous(mapped)
            .wrap_err_with(|| format!("failed to allocate column '{}'", field.name()))?;

        Ok(Self {
            region,
            capacity,
            length: 0,
            padding,
            mode: BufferMode::Growable,
        })
    }

    /// Maps `byte_size` bytes of `file` (plus the field's padding) read-only.
    ///
    /// An empty file cannot be mapped, so a zero-byte padded column gets an
    /// anonymous zeroed region holding just the padding.
    pub fn file_backed<F: AsFd>(file: &F, byte_size: usize, field: &FieldMeta) -> Result<Self> {
        let padding = field.padding();

        let region = if byte_size == 0 {
            MappedRegion::anonymous(padding)
                .wrap_err_with(|| format!("failed to map padding for column '{}'", field.name()))?
        } else {
            let mapped = byte_size.checked_add(padding).ok_or_else(|| {
                eyre!("file size {} overflows with {} padding", byte_size, padding)
            })?;
            MappedRegion::file(file, mapped)
                .wrap_err_with(|| format!("failed to mmap column '{}'", field.name()))?
        };

        Ok(Self {
            region,
            capacity: byte_size,
            length: byte_size,
            padding,
            mode: BufferMode::FileBacked,
        })
    }

    /// Copies `bytes` to the end of the written data, growing if needed.
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        ensure!(
            self.mode == BufferMode::Growable,
            "cannot append {} bytes to a file-backed column",
            bytes.len()
        );

        let required = self
            .length
            .checked_add(bytes.len())
            .ok_or_else(|| eyre!("column length overflow appending {} bytes", bytes.len()))?;

        if required > self.capacity {
            let new_capacity = required
                .checked_mul(GROWTH_FACTOR)
                .and_then(|grown| grown.checked_add(self.padding))
                .ok_or_else(|| eyre!("column length overflow appending {} bytes", bytes.len()))?;
            self.expand(new_capacity)?;
        }

        self.region.as_mut_slice()[self.length..required].copy_from_slice(bytes);
        self.length = required;

        Ok(())
    }

    /// Moves the written bytes into a fresh mapping with `new_capacity` bytes
    /// of capacity. Bytes past `length` are not carried over.
    pub(crate) fn expand(&mut self, new_capacity: usize) -> Result<()> {
        ensure!(
            self.mode == BufferMode::Growable,
            "cannot expand a file-backed column"
        );
        ensure!(
            new_capacity >= self.length,
            "expand to {} bytes would truncate {} written bytes",
            new_capacity,
            self.length
        );

        let mapped = new_capacity
            .checked_add(self.padding)
            .ok_or_else(|| eyre!("expand to {} bytes overflows with padding", new_capacity))?;
        let mut region = MappedRegion::anonymous(mapped)
            .wrap_err_with(|| format!("failed to expand column to {} bytes", new_capacity))?;

        region.as_mut_slice()[..self.length].copy_from_slice(self.data());

        let old = std::mem::replace(&mut self.region, region);
        drop(old);

        debug!(
            old_capacity = self.capacity,
            new_capacity,
            length = self.length,
            "expanded column buffer"
        );

        self.capacity = new_capacity;
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes written so far (growable) or the mapped file size (file-backed).
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    pub fn mode(&self) -> BufferMode {
        self.mode
    }

    pub fn is_file_backed(&self) -> bool {
        self.mode == BufferMode::FileBacked
    }

    /// Base address of the mapping, null when nothing is mapped.
    pub fn as_ptr(&self) -> *const u8 {
        self.region.as_ptr()
    }

    /// Written bytes, `[0, length)`.
    pub fn data(&self) -> &[u8] {
        &self.region.as_slice()[..self.length]
    }

    /// The whole mapping, `capacity + padding` bytes.
    pub fn padded(&self) -> &[u8] {
        self.region.as_slice()
    }

    /// Writes the written bytes to `out`, returning how many were written.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<u64> {
        out.write_all(self.data())
            .wrap_err_with(|| format!("failed to write {} column bytes", self.length))?;
        Ok(self.length as u64)
    }

    /// Asks the kernel to page in `range` of the written bytes.
    pub fn prefetch(&self, range: Range<usize>) {
        let end = range.end.min(self.length);
        if range.start >= end {
            return;
        }
        self.region.advise_willneed(range.start, end - range.start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JSON_PADDING;
    use crate::types::DataType;

    fn int32() -> FieldMeta {
        FieldMeta::new("i", DataType::Int32)
    }

    #[test]
    fn growable_capacity_is_rows_times_size() {
        let buf = MappedBuffer::growable(10, &int32()).unwrap();

        assert_eq!(buf.capacity(), 40);
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.padded().len(), 40);
        assert_eq!(buf.mode(), BufferMode::Growable);
    }

    #[test]
    fn variable_field_defers_mapping() {
        let buf = MappedBuffer::growable(10, &FieldMeta::varchar("s", None)).unwrap();

        assert_eq!(buf.capacity(), 0);
        assert!(buf.as_ptr().is_null());
    }

    #[test]
    fn empty_json_buffer_maps_padding() {
        let mut buf = MappedBuffer::growable(4, &FieldMeta::json("doc")).unwrap();

        assert_eq!(buf.capacity(), 0);
        assert_eq!(buf.padded().len(), JSON_PADDING);

        buf.append(b"").unwrap();
        assert_eq!(buf.capacity(), 0);
        assert_eq!(buf.padded().len(), JSON_PADDING);
    }

    #[test]
    fn empty_json_file_maps_padding() {
        let file = tempfile::tempfile().unwrap();

        let buf = MappedBuffer::file_backed(&file, 0, &FieldMeta::json("doc")).unwrap();

        assert!(buf.is_empty());
        assert_eq!(buf.padded(), &[0u8; JSON_PADDING][..]);
    }

    #[test]
    fn empty_unpadded_file_maps_nothing() {
        let file = tempfile::tempfile().unwrap();

        let buf = MappedBuffer::file_backed(&file, 0, &int32()).unwrap();

        assert!(buf.as_ptr().is_null());
    }

    #[test]
    fn growth_overflow_is_an_error() {
        let mut buf = MappedBuffer::growable(0, &FieldMeta::array("a")).unwrap();
        buf.length = usize::MAX / 2 + 1;

        let err = buf.append(&[1]).unwrap_err();
        assert!(err.to_string().contains("overflow"));
    }

    #[test]
    fn append_within_capacity_does_not_remap() {
        let mut buf = MappedBuffer::growable(4, &int32()).unwrap();
        let base = buf.as_ptr();

        buf.append(&[1, 2, 3, 4]).unwrap();
        buf.append(&[5, 6, 7, 8]).unwrap();

        assert_eq!(buf.as_ptr(), base);
        assert_eq!(buf.capacity(), 16);
        assert_eq!(buf.data(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn overflow_doubles_required_size() {
        let mut buf = MappedBuffer::growable(1, &int32()).unwrap();

        buf.append(&[1, 2, 3, 4]).unwrap();
        buf.append(&[5, 6]).unwrap();

        assert_eq!(buf.capacity(), 12);
        assert_eq!(buf.len(), 6);
        assert_eq!(buf.data(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn json_growth_adds_padding_to_capacity_and_mapping() {
        let mut buf = MappedBuffer::growable(0, &FieldMeta::json("doc")).unwrap();

        buf.append(b"{}").unwrap();

        assert_eq!(buf.capacity(), 2 * 2 + JSON_PADDING);
        assert_eq!(buf.padded().len(), buf.capacity() + JSON_PADDING);
    }

    #[test]
    fn expand_preserves_written_prefix() {
        let mut buf = MappedBuffer::growable(0, &FieldMeta::array("a")).unwrap();
        let payload: Vec<u8> = (0..=255).collect();

        for chunk in payload.chunks(7) {
            buf.append(chunk).unwrap();
        }

        assert_eq!(buf.data(), payload.as_slice());
        assert!(buf.capacity() >= payload.len());
    }

    #[test]
    fn expand_refuses_truncation() {
        let mut buf = MappedBuffer::growable(2, &int32()).unwrap();
        buf.append(&[0; 8]).unwrap();

        let err = buf.expand(4).unwrap_err();
        assert!(err.to_string().contains("would truncate"));
    }

    #[test]
    fn file_backed_length_equals_capacity() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(&[9u8; 12]).unwrap();

        let buf = MappedBuffer::file_backed(&file, 12, &int32()).unwrap();

        assert!(buf.is_file_backed());
        assert_eq!(buf.len(), 12);
        assert_eq!(buf.capacity(), 12);
        assert_eq!(buf.data(), &[9u8; 12]);
    }

    #[test]
    fn file_backed_rejects_append() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(&[0u8; 4]).unwrap();

        let mut buf = MappedBuffer::file_backed(&file, 4, &int32()).unwrap();
        let err = buf.append(&[1]).unwrap_err();

        assert!(err.to_string().contains("file-backed"));
        assert_eq!(buf.len(), 4);
    }

    #[test]
    fn take_transfers_region() {
        let mut buf = MappedBuffer::growable(8, &int32()).unwrap();
        buf.append(&[7; 4]).unwrap();
        let base = buf.as_ptr();

        let moved = std::mem::take(&mut buf);

        assert_eq!(moved.as_ptr(), base);
        assert_eq!(moved.data(), &[7; 4]);
        assert!(buf.as_ptr().is_null());
        assert_eq!(buf.capacity(), 0);
    }

    #[test]
    fn write_to_emits_only_written_bytes() {
        let mut buf = MappedBuffer::growable(8, &int32()).unwrap();
        buf.append(b"abcdef").unwrap();

        let mut out = Vec::new();
        let written = buf.write_to(&mut out).unwrap();

        assert_eq!(written, 6);
        assert_eq!(out, b"abcdef");
    }

    #[test]
    fn prefetch_tolerates_any_range() {
        let mut buf = MappedBuffer::growable(1024, &int32()).unwrap();
        buf.append(&[1; 100]).unwrap();

        buf.prefetch(0..100);
        buf.prefetch(50..10_000);
        buf.prefetch(200..300);
        MappedBuffer::default().prefetch(0..10);
    }
}
