// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Output sinks for the CDR writer.
//!
//! A [`BufferSink`] is the growable-output abstraction the writer flushes
//! into: a contiguous committed region followed by a writable span. The
//! writer buffers into the span and commits with [`BufferSink::advance`].

use super::{CdrError, CdrResult};

/// Growable output target for [`crate::cdr::CdrWriter`].
///
/// Contract: `committed()` bytes are final; `span_mut()` is scratch space
/// after them; `advance(n)` commits the first `n` span bytes. `reserve`
/// must either make the span at least `min` bytes long or fail, and a
/// failed reserve is fatal to the current encode pass.
pub trait BufferSink {
    /// Bytes committed so far.
    fn committed(&self) -> usize;

    /// Writable scratch span following the committed region.
    fn span_mut(&mut self) -> &mut [u8];

    /// Ensure the span holds at least `min` writable bytes.
    fn reserve(&mut self, min: usize) -> CdrResult<()>;

    /// Commit the first `n` bytes of the span.
    fn advance(&mut self, n: usize);

    /// Overwrite already-written bytes at absolute position `pos`.
    ///
    /// Used for back-patching length prefixes (DHEADERs). `pos + data.len()`
    /// must lie inside the region written so far.
    fn patch(&mut self, pos: usize, data: &[u8]) -> CdrResult<()>;
}

/// Heap-backed sink that grows on demand. The common case.
#[derive(Debug, Default)]
pub struct VecSink {
    buf: Vec<u8>,
    committed: usize,
}

/// Span growth granularity; reserves beyond this use the exact size.
const SPAN_CHUNK: usize = 256;

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            committed: 0,
        }
    }

    /// Committed bytes so far.
    pub fn bytes(&self) -> &[u8] {
        &self.buf[..self.committed]
    }

    /// Consume the sink, returning exactly the committed bytes.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.buf.truncate(self.committed);
        self.buf
    }
}

impl BufferSink for VecSink {
    fn committed(&self) -> usize {
        self.committed
    }

    fn span_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.committed..]
    }

    fn reserve(&mut self, min: usize) -> CdrResult<()> {
        let available = self.buf.len() - self.committed;
        if available < min {
            let grow = min.max(SPAN_CHUNK);
            self.buf.resize(self.committed + grow, 0);
        }
        Ok(())
    }

    fn advance(&mut self, n: usize) {
        debug_assert!(self.committed + n <= self.buf.len());
        self.committed += n;
    }

    fn patch(&mut self, pos: usize, data: &[u8]) -> CdrResult<()> {
        if pos + data.len() > self.buf.len() {
            return Err(CdrError::WriteFailed {
                position: pos,
                reason: "patch outside written region".into(),
            });
        }
        self.buf[pos..pos + data.len()].copy_from_slice(data);
        Ok(())
    }
}

/// Fixed-capacity sink over a caller-provided slice.
///
/// `reserve` fails once the slice is exhausted; that failure is the
/// allocation-failure signal of this codec and propagates as fatal.
#[derive(Debug)]
pub struct SliceSink<'a> {
    buf: &'a mut [u8],
    committed: usize,
}

impl<'a> SliceSink<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, committed: 0 }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf[..self.committed]
    }
}

impl BufferSink for SliceSink<'_> {
    fn committed(&self) -> usize {
        self.committed
    }

    fn span_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.committed..]
    }

    fn reserve(&mut self, min: usize) -> CdrResult<()> {
        let available = self.buf.len() - self.committed;
        if available < min {
            return Err(CdrError::WriteFailed {
                position: self.committed,
                reason: format!("fixed sink exhausted (need {min}, have {available})"),
            });
        }
        Ok(())
    }

    fn advance(&mut self, n: usize) {
        debug_assert!(self.committed + n <= self.buf.len());
        self.committed += n;
    }

    fn patch(&mut self, pos: usize, data: &[u8]) -> CdrResult<()> {
        if pos + data.len() > self.buf.len() {
            return Err(CdrError::WriteFailed {
                position: pos,
                reason: "patch outside written region".into(),
            });
        }
        self.buf[pos..pos + data.len()].copy_from_slice(data);
        Ok(())
    }
}
