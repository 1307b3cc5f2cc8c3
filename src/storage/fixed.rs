//! # Fixed-Width Columns
//!
//! `FixedColumn` stores rows of identical width back to back in one
//! `MappedBuffer`. Row `i` lives at `[i * stride, (i + 1) * stride)` where
//! `stride = capacity / row_count`.
//!
//! In growable mode the row count is declared up front and capacity is
//! exactly `row_count * element_size`; appends past that are refused so the
//! stride never drifts. In file-backed mode the row count is derived from the
//! file size.

use std::io::Write;
use std::ops::Range;
use std::os::fd::AsFd;

use eyre::{ensure, eyre, Result};
use zerocopy::{FromBytes, Immutable, KnownLayout};

use super::buffer::MappedBuffer;
use super::span::{Column, FixedSpan, Span};
use crate::config::MAX_ELEMENT_SIZE;
use crate::types::FieldMeta;

#[derive(Debug, Default)]
pub struct FixedColumn {
    buffer: MappedBuffer,
    row_count: usize,
    element_size: usize,
}

impl FixedColumn {
    /// Creates a growable column for `row_count` rows of `field`.
    pub fn growable(row_count: usize, field: &FieldMeta) -> Result<Self> {
        let element_size = element_size(field)?;
        let buffer = MappedBuffer::growable(row_count, field)?;

        Ok(Self {
            buffer,
            row_count,
            element_size,
        })
    }

    /// Maps `byte_size` bytes of `file` as rows of `field`.
    ///
    /// `byte_size` must be a multiple of the element size; a remainder means
    /// the file and schema disagree, which the caller validates.
    pub fn file_backed<F: AsFd>(file: &F, byte_size: usize, field: &FieldMeta) -> Result<Self> {
        let element_size = element_size(field)?;
        debug_assert_eq!(
            byte_size % element_size,
            0,
            "file size {} is not a multiple of element size {}",
            byte_size,
            element_size
        );

        let buffer = MappedBuffer::file_backed(file, byte_size, field)?;

        Ok(Self {
            buffer,
            row_count: byte_size / element_size,
            element_size,
        })
    }

    /// Appends raw row bytes. The total may not exceed the declared rows.
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        let limit = self.row_count * self.element_size;
        ensure!(
            self.buffer.len() + bytes.len() <= limit,
            "fixed column of {} rows x {} bytes cannot take {} more bytes (written={})",
            self.row_count,
            self.element_size,
            bytes.len(),
            self.buffer.len()
        );
        self.buffer.append(bytes)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn element_size(&self) -> usize {
        self.element_size
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_file_backed(&self) -> bool {
        self.buffer.is_file_backed()
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.buffer.as_ptr()
    }

    /// Stride view over every declared row.
    ///
    /// # Panics
    ///
    /// Panics on a column with zero rows.
    pub fn view(&self) -> FixedSpan<'_> {
        assert!(self.row_count > 0, "cannot view a fixed column with zero rows");

        let stride = self.buffer.capacity() / self.row_count;
        FixedSpan::new(
            &self.buffer.padded()[..self.row_count * stride],
            self.row_count,
            stride,
        )
    }

    pub fn row(&self, i: usize) -> &[u8] {
        self.view().row(i)
    }

    /// Reinterprets every row as a run of `T` lanes.
    ///
    /// The stride must be a whole number of `T`s, e.g. `f32` over a float
    /// vector field yields `row_count * dim` lanes.
    pub fn as_slice<T>(&self) -> Result<&[T]>
    where
        T: FromBytes + Immutable + KnownLayout,
    {
        let lane = std::mem::size_of::<T>();
        ensure!(lane > 0, "cannot view rows as a zero-sized type");
        ensure!(
            self.element_size % lane == 0,
            "element size {} is not a multiple of {} byte lanes",
            self.element_size,
            lane
        );

        if self.row_count == 0 {
            return Ok(&[]);
        }

        let bytes = self.view().as_bytes();
        <[T]>::ref_from_bytes(bytes)
            .map_err(|_| eyre!("column bytes are misaligned for {} byte lanes", lane))
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<u64> {
        self.buffer.write_to(out)
    }

    pub fn prefetch(&self, rows: Range<usize>) {
        self.buffer.prefetch(
            rows.start.saturating_mul(self.element_size)..rows.end.saturating_mul(self.element_size),
        );
    }
}

impl Column for FixedColumn {
    fn row_count(&self) -> usize {
        self.row_count
    }

    fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    fn data(&self) -> &[u8] {
        self.buffer.data()
    }

    fn span(&self) -> Span<'_> {
        Span::Fixed(self.view())
    }
}

fn element_size(field: &FieldMeta) -> Result<usize> {
    let size = field.size_of().ok_or_else(|| {
        eyre!(
            "field '{}' of type {:?} is variable length",
            field.name(),
            field.data_type()
        )
    })?;
    ensure!(size > 0, "field '{}' has zero element size", field.name());
    ensure!(
        size <= MAX_ELEMENT_SIZE,
        "field '{}' element size {} exceeds {} bytes",
        field.name(),
        size,
        MAX_ELEMENT_SIZE
    );
    Ok(size)
}
