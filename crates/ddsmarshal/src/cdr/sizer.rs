// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dry-run size calculator for the CDR writer.
//!
//! Walks the same positions the writer would without touching bytes, so
//! generated marshaling code can size a sample before renting a buffer.
//! Unlike the writer, every method here self-aligns: sizing code cannot
//! forget a pad, and an explicit `align` before a write stays correct
//! because aligning twice is idempotent.

use crate::layout::{align_up, padding_for};

use super::CdrEncoding;

/// Positional mirror of [`crate::cdr::CdrWriter`]. Infallible: it never
/// writes, so there is nothing to exhaust.
#[derive(Debug, Clone)]
pub struct CdrSizer {
    position: usize,
    encoding: CdrEncoding,
}

macro_rules! impl_size {
    ($name:ident, $size:expr) => {
        /// Self-aligning.
        pub fn $name(&mut self) {
            self.position = align_up(self.position, $size) + $size;
        }
    };
}

impl CdrSizer {
    /// Start at `start` — nonzero when sizing a member inside an enclosing
    /// stream, so alignment padding is charged correctly.
    pub fn new(start: usize, encoding: CdrEncoding) -> Self {
        Self {
            position: start,
            encoding,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes consumed since position `from`.
    pub fn size_delta(&self, from: usize) -> usize {
        self.position - from
    }

    pub fn align(&mut self, alignment: usize) {
        self.position += padding_for(self.position, alignment);
    }

    impl_size!(write_u16, 2);
    impl_size!(write_i16, 2);
    impl_size!(write_u32, 4);
    impl_size!(write_i32, 4);
    impl_size!(write_u64, 8);
    impl_size!(write_i64, 8);
    impl_size!(write_f32, 4);
    impl_size!(write_f64, 8);

    pub fn write_byte(&mut self) {
        self.position += 1;
    }

    pub fn write_bool(&mut self) {
        self.position += 1;
    }

    pub fn write_char(&mut self) {
        self.position += 1;
    }

    pub fn write_bytes(&mut self, len: usize) {
        self.position += len;
    }

    /// Length word + content (+ NUL under Xcdr1).
    pub fn write_string(&mut self, value: &str) {
        self.write_u32();
        self.position += value.len();
        if self.encoding.string_length_includes_nul() {
            self.position += 1;
        }
    }

    pub fn write_fixed_bytes(&mut self, fixed_size: usize) {
        self.position += fixed_size;
    }

    /// DHEADER cost: 4 aligned bytes under Xcdr2, nothing under Xcdr1.
    pub fn write_dheader(&mut self) {
        if self.encoding.uses_dheader() {
            self.write_u32();
        }
    }
}
