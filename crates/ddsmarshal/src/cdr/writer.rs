// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Streaming CDR encoder.
//!
//! Single-use and stack-scoped: a writer borrows its sink for the duration
//! of one encode pass and is consumed by [`CdrWriter::complete`], so a
//! flushed writer cannot be reused. Position 0 is the first payload byte;
//! the encapsulation header, if any, is the caller's to emit before
//! constructing the writer (see [`crate::cdr::encaps`]).
//!
//! Primitive writers do not self-align. Callers emit `align(n)` before each
//! field, exactly as the generated serializers do.

use crate::layout::padding_for;

use super::sink::BufferSink;
use super::{CdrEncoding, CdrError, CdrResult};

/// Position bookkeeping returned by [`CdrWriter::begin_dheader`] and
/// consumed by [`CdrWriter::end_dheader`].
#[derive(Debug, Clone, Copy)]
pub struct DheaderMark {
    /// Position of the 4-byte length word, if the variant frames at all.
    length_pos: Option<usize>,
    /// Position of the first byte the DHEADER counts.
    payload_start: usize,
}

macro_rules! impl_write_le {
    ($name:ident, $type:ty) => {
        /// Little-endian, no alignment.
        pub fn $name(&mut self, value: $type) -> CdrResult<()> {
            self.put(&value.to_le_bytes())
        }
    };
}

/// Streaming CDR encoder over a [`BufferSink`].
pub struct CdrWriter<'a, S: BufferSink> {
    sink: &'a mut S,
    encoding: CdrEncoding,
    /// Sink bytes that existed before this writer; writer position 0 maps
    /// to this sink offset.
    base: usize,
    /// Bytes flushed to the sink by this writer.
    committed: usize,
    /// Bytes written into the current span, not yet flushed.
    buffered: usize,
}

impl<'a, S: BufferSink> CdrWriter<'a, S> {
    pub fn new(sink: &'a mut S, encoding: CdrEncoding) -> Self {
        let base = sink.committed();
        Self {
            sink,
            encoding,
            base,
            committed: 0,
            buffered: 0,
        }
    }

    pub fn encoding(&self) -> CdrEncoding {
        self.encoding
    }

    /// Logical stream position: committed + buffered.
    pub fn position(&self) -> usize {
        self.committed + self.buffered
    }

    /// Insert zero padding so the next write lands on an `alignment`
    /// boundary relative to position 0.
    pub fn align(&mut self, alignment: usize) -> CdrResult<()> {
        let padding = padding_for(self.position(), alignment);
        if padding > 0 {
            self.ensure(padding)?;
            let span = self.sink.span_mut();
            span[self.buffered..self.buffered + padding].fill(0);
            self.buffered += padding;
        }
        Ok(())
    }

    impl_write_le!(write_u16, u16);
    impl_write_le!(write_i16, i16);
    impl_write_le!(write_u32, u32);
    impl_write_le!(write_i32, i32);
    impl_write_le!(write_u64, u64);
    impl_write_le!(write_i64, i64);
    impl_write_le!(write_f32, f32);
    impl_write_le!(write_f64, f64);

    pub fn write_byte(&mut self, value: u8) -> CdrResult<()> {
        self.put(&[value])
    }

    pub fn write_i8(&mut self, value: i8) -> CdrResult<()> {
        self.put(&[value as u8])
    }

    pub fn write_bool(&mut self, value: bool) -> CdrResult<()> {
        self.write_byte(u8::from(value))
    }

    /// CDR `char` is a single octet; non-ASCII input has no encoding.
    pub fn write_char(&mut self, value: char) -> CdrResult<()> {
        if !value.is_ascii() {
            return Err(CdrError::InvalidData {
                position: self.position(),
                reason: format!("char '{value}' is not representable as one octet"),
            });
        }
        self.write_byte(value as u8)
    }

    /// Raw bytes, no length prefix.
    pub fn write_bytes(&mut self, data: &[u8]) -> CdrResult<()> {
        self.put(data)
    }

    /// Length-prefixed UTF-8 string.
    ///
    /// Xcdr1: length counts content plus the trailing NUL, and the NUL is
    /// written. Xcdr2: length counts content only, no NUL. The caller
    /// aligns to 4 first.
    pub fn write_string(&mut self, value: &str) -> CdrResult<()> {
        let content = value.as_bytes();
        if self.encoding.string_length_includes_nul() {
            self.write_u32(content.len() as u32 + 1)?;
            self.put(content)?;
            self.write_byte(0)
        } else {
            self.write_u32(content.len() as u32)?;
            self.put(content)
        }
    }

    /// Exactly `fixed_size` bytes: `data` truncated or zero-padded.
    ///
    /// Fixed-size octet-array fields always occupy their declared size
    /// regardless of logical content length.
    pub fn write_fixed_bytes(&mut self, data: &[u8], fixed_size: usize) -> CdrResult<()> {
        self.ensure(fixed_size)?;
        let to_copy = data.len().min(fixed_size);
        let span = self.sink.span_mut();
        span[self.buffered..self.buffered + to_copy].copy_from_slice(&data[..to_copy]);
        span[self.buffered + to_copy..self.buffered + fixed_size].fill(0);
        self.buffered += fixed_size;
        Ok(())
    }

    /// Overwrite a previously written 32-bit word at writer position `pos`.
    pub fn patch_u32(&mut self, pos: usize, value: u32) -> CdrResult<()> {
        if pos + 4 > self.position() {
            return Err(CdrError::WriteFailed {
                position: pos,
                reason: "patch target not yet written".into(),
            });
        }
        self.sink.patch(self.base + pos, &value.to_le_bytes())
    }

    /// Open a DHEADER frame.
    ///
    /// Xcdr2: aligns to 4 and writes a placeholder length word, patched by
    /// [`Self::end_dheader`]. Xcdr1 has no DHEADERs; both calls are no-ops
    /// there, so generated code is variant-agnostic.
    pub fn begin_dheader(&mut self) -> CdrResult<DheaderMark> {
        if !self.encoding.uses_dheader() {
            return Ok(DheaderMark {
                length_pos: None,
                payload_start: self.position(),
            });
        }
        self.align(4)?;
        let length_pos = self.position();
        self.write_u32(0)?;
        Ok(DheaderMark {
            length_pos: Some(length_pos),
            payload_start: self.position(),
        })
    }

    /// Close a DHEADER frame, back-patching the byte count.
    pub fn end_dheader(&mut self, mark: DheaderMark) -> CdrResult<()> {
        let Some(length_pos) = mark.length_pos else {
            return Ok(());
        };
        let length = self.position() - mark.payload_start;
        self.patch_u32(length_pos, length as u32)
    }

    /// Flush buffered bytes and finish, returning total bytes written.
    ///
    /// Consumes the writer; the one exit path on success and error alike.
    pub fn complete(mut self) -> usize {
        self.flush();
        self.committed
    }

    fn flush(&mut self) {
        if self.buffered > 0 {
            self.sink.advance(self.buffered);
            self.committed += self.buffered;
            self.buffered = 0;
        }
    }

    /// Make room for `size` more bytes, flushing and re-reserving if the
    /// current span is too small.
    fn ensure(&mut self, size: usize) -> CdrResult<()> {
        if self.buffered + size > self.sink.span_mut().len() {
            self.flush();
            self.sink.reserve(size)?;
        }
        Ok(())
    }

    fn put(&mut self, bytes: &[u8]) -> CdrResult<()> {
        self.ensure(bytes.len())?;
        let span = self.sink.span_mut();
        span[self.buffered..self.buffered + bytes.len()].copy_from_slice(bytes);
        self.buffered += bytes.len();
        Ok(())
    }
}
