//! # segcol Configuration Constants
//!
//! This module centralizes the numeric knobs of the column storage layer.
//! Interdependent values are co-located and their relationships are enforced
//! through compile-time assertions.
//!
//! ## Dependency Graph
//!
//! ```text
//! JSON_PADDING (64 bytes)
//!       │
//!       └─> Mapped size of a JSON column = capacity + JSON_PADDING
//!             Downstream SIMD JSON parsers read up to this many bytes past
//!             the end of a document. Must be at least SIMD_READ_WIDTH.
//!
//! GROWTH_FACTOR (2)
//!       │
//!       └─> New capacity on overflow = GROWTH_FACTOR * (length + incoming) + padding
//!             Doubling keeps append amortized O(n). Must be >= 2.
//!
//! MAX_VECTOR_DIM (32768)
//!       │
//!       └─> MAX_ELEMENT_SIZE (derived: widest float vector row)
//! ```
//!
//! ## Critical Invariants
//!
//! 1. `JSON_PADDING >= SIMD_READ_WIDTH` (parsers may over-read one vector)
//! 2. `GROWTH_FACTOR >= 2` (otherwise append degrades to O(n^2))
//! 3. `MAX_ELEMENT_SIZE` fits the largest fixed element a schema can declare

// ============================================================================
// PADDING
// Scratch space mapped after the logical end of a column
// ============================================================================

/// Widest single load a downstream SIMD parser issues, in bytes.
pub const SIMD_READ_WIDTH: usize = 64;

/// Extra bytes mapped after a JSON column's capacity.
///
/// Matches the padding simdjson-style tokenizers require so that the last
/// document can be parsed in place without a bounds check.
pub const JSON_PADDING: usize = 64;

const _: () = assert!(
    JSON_PADDING >= SIMD_READ_WIDTH,
    "JSON_PADDING must cover one full SIMD load past the last byte"
);

// ============================================================================
// GROWTH
// ============================================================================

/// Multiplier applied to the required size when a growable buffer overflows.
pub const GROWTH_FACTOR: usize = 2;

const _: () = assert!(GROWTH_FACTOR >= 2, "GROWTH_FACTOR below 2 breaks amortized append");

// ============================================================================
// SCHEMA BOUNDS
// ============================================================================

/// Largest vector dimension a field may declare.
pub const MAX_VECTOR_DIM: u32 = 32768;

/// Upper bound on a single fixed-width element, in bytes.
///
/// The widest fixed element is a float vector of `MAX_VECTOR_DIM` lanes.
pub const MAX_ELEMENT_SIZE: usize = MAX_VECTOR_DIM as usize * 4;

const _: () = assert!(
    MAX_ELEMENT_SIZE == MAX_VECTOR_DIM as usize * std::mem::size_of::<f32>(),
    "MAX_ELEMENT_SIZE derivation mismatch"
);
