// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Streaming CDR decoder, the bounds-checked mirror of the writer.
//!
//! The reader trusts the caller to supply the same [`CdrEncoding`] the
//! producer used. Decoding with the wrong variant is undefined by contract
//! (lengths shift by one, framing words appear or vanish); there is no
//! runtime detection and none is attempted.

use crate::layout::padding_for;

use super::{CdrEncoding, CdrError, CdrResult};

macro_rules! impl_read_le {
    ($name:ident, $type:ty, $size:expr) => {
        /// Little-endian, no alignment.
        pub fn $name(&mut self) -> CdrResult<$type> {
            let bytes = self.take($size)?;
            let mut raw = [0u8; $size];
            raw.copy_from_slice(bytes);
            Ok(<$type>::from_le_bytes(raw))
        }
    };
}

/// Streaming CDR decoder over a borrowed source buffer.
pub struct CdrReader<'a> {
    buf: &'a [u8],
    pos: usize,
    encoding: CdrEncoding,
}

impl<'a> CdrReader<'a> {
    pub fn new(buf: &'a [u8], encoding: CdrEncoding) -> Self {
        Self {
            buf,
            pos: 0,
            encoding,
        }
    }

    pub fn encoding(&self) -> CdrEncoding {
        self.encoding
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Jump to an absolute position (used to skip DHEADER-framed regions).
    pub fn seek(&mut self, pos: usize) -> CdrResult<()> {
        if pos > self.buf.len() {
            return Err(CdrError::ReadFailed {
                position: pos,
                reason: "seek past end of buffer".into(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Skip padding up to an `alignment` boundary. Pad bytes are not
    /// inspected, matching the writer which only guarantees it wrote zeros.
    pub fn align(&mut self, alignment: usize) -> CdrResult<()> {
        let padding = padding_for(self.pos, alignment);
        if padding > 0 {
            self.take(padding)?;
        }
        Ok(())
    }

    impl_read_le!(read_u16, u16, 2);
    impl_read_le!(read_i16, i16, 2);
    impl_read_le!(read_u32, u32, 4);
    impl_read_le!(read_i32, i32, 4);
    impl_read_le!(read_u64, u64, 8);
    impl_read_le!(read_i64, i64, 8);
    impl_read_le!(read_f32, f32, 4);
    impl_read_le!(read_f64, f64, 8);

    pub fn read_byte(&mut self) -> CdrResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> CdrResult<i8> {
        Ok(self.read_byte()? as i8)
    }

    pub fn read_bool(&mut self) -> CdrResult<bool> {
        Ok(self.read_byte()? != 0)
    }

    pub fn read_char(&mut self) -> CdrResult<char> {
        let byte = self.read_byte()?;
        if !byte.is_ascii() {
            return Err(CdrError::InvalidData {
                position: self.pos - 1,
                reason: format!("byte 0x{byte:02x} is not an ASCII char"),
            });
        }
        Ok(byte as char)
    }

    /// Borrow `n` raw bytes from the source.
    pub fn read_bytes(&mut self, n: usize) -> CdrResult<&'a [u8]> {
        self.take(n)
    }

    /// Read a fixed-size octet field, the mirror of
    /// [`crate::cdr::CdrWriter::write_fixed_bytes`].
    pub fn read_fixed_bytes(&mut self, fixed_size: usize) -> CdrResult<&'a [u8]> {
        self.take(fixed_size)
    }

    /// Length-prefixed UTF-8 string.
    ///
    /// Xcdr1: the last counted byte is the NUL terminator and must be
    /// dropped from the logical value; a length of zero is malformed under
    /// this variant. Xcdr2: every counted byte is content.
    pub fn read_string(&mut self) -> CdrResult<String> {
        let start = self.pos;
        let declared = self.read_u32()? as usize;
        let raw = self.take(declared).map_err(|_| CdrError::ReadFailed {
            position: start,
            reason: format!(
                "string length {declared} exceeds remaining {} bytes",
                self.buf.len() - self.pos
            ),
        })?;

        let content = if self.encoding.string_length_includes_nul() {
            let Some((last, rest)) = raw.split_last() else {
                return Err(CdrError::InvalidData {
                    position: start,
                    reason: "XCDR1 string length 0 leaves no room for NUL".into(),
                });
            };
            if *last != 0 {
                return Err(CdrError::InvalidData {
                    position: start,
                    reason: "XCDR1 string is not NUL-terminated".into(),
                });
            }
            rest
        } else {
            raw
        };

        match std::str::from_utf8(content) {
            Ok(text) => Ok(text.to_owned()),
            Err(e) => Err(CdrError::InvalidData {
                position: start,
                reason: format!("string is not valid UTF-8: {e}"),
            }),
        }
    }

    /// 4-byte element count preceding a sequence.
    pub fn read_sequence_length(&mut self) -> CdrResult<u32> {
        self.read_u32()
    }

    /// Read a DHEADER if the variant frames aggregates.
    ///
    /// Returns `(length, end_position)` under Xcdr2, `None` under Xcdr1.
    /// `end_position` is where the framed region stops; decoders seek there
    /// after consuming the members they know about.
    pub fn read_dheader(&mut self) -> CdrResult<Option<(u32, usize)>> {
        if !self.encoding.uses_dheader() {
            return Ok(None);
        }
        self.align(4)?;
        let start = self.pos;
        let length = self.read_u32()?;
        let end = self.pos + length as usize;
        if end > self.buf.len() {
            return Err(CdrError::ReadFailed {
                position: start,
                reason: format!("DHEADER length {length} exceeds buffer"),
            });
        }
        Ok(Some((length, end)))
    }

    fn take(&mut self, n: usize) -> CdrResult<&'a [u8]> {
        if self.pos + n > self.buf.len() {
            return Err(CdrError::ReadFailed {
                position: self.pos,
                reason: "unexpected end of buffer".into(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }
}
