// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dual-region marshaling arena.
//!
//! One caller-provided buffer, split at `head_size`: the head holds the
//! fixed-size native struct (zeroed on construction, so a field the
//! marshaling code never sets reads as zero/null, not garbage), the tail
//! holds variable-length payload the head points into. The whole block is
//! handed to the native layer in one piece, no copying.
//!
//! The arena never grows. A request past the buffer end is
//! [`ArenaError::Exhausted`], fatal to the current marshaling call; the
//! caller reallocates a bigger buffer and retries if it wants to.
//!
//! The buffer and its native base address must be 8-byte aligned; tail
//! offsets are aligned relative to the buffer start and stay aligned as
//! addresses only under that precondition.
//!
//! Single-threaded by contract: one arena backs exactly one native buffer
//! construction.

use std::fmt;
use std::marker::PhantomData;

use libc::{c_char, c_void};

use crate::layout::padding_for;

/// Tail allocations are aligned to the widest primitive.
const TAIL_ALIGN: usize = 8;

/// Arena allocation failure.
#[derive(Debug, Clone)]
pub enum ArenaError {
    /// The fixed buffer cannot satisfy the request. Never partially applied.
    Exhausted { need: usize, have: usize },
    /// Declared head size exceeds the buffer.
    HeadTooLarge { head_size: usize, buffer_len: usize },
    /// Buffer or declared base address not aligned for tail allocations.
    Misaligned { address: usize },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArenaError::Exhausted { need, have } => {
                write!(f, "arena exhausted: need {} bytes, {} remain", need, have)
            }
            ArenaError::HeadTooLarge {
                head_size,
                buffer_len,
            } => {
                write!(
                    f,
                    "head size {} exceeds buffer length {}",
                    head_size, buffer_len
                )
            }
            ArenaError::Misaligned { address } => {
                write!(
                    f,
                    "address 0x{:x} is not {}-byte aligned",
                    address, TAIL_ALIGN
                )
            }
        }
    }
}

impl std::error::Error for ArenaError {}

pub type ArenaResult<T> = core::result::Result<T, ArenaError>;

/// Native sequence record, matching the middleware's `dds_sequence_t`.
///
/// This shape is a fixed external contract of the wrapped C library.
/// Targeting a different native library means re-deriving it from that
/// library's headers, not assuming it ports.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SequenceNative {
    pub maximum: u32,
    pub length: u32,
    pub buffer: *mut c_void,
    /// Ownership flag: false here, the arena owns the bytes.
    pub release: bool,
}

impl SequenceNative {
    /// The record an empty sequence marshals to.
    pub fn empty() -> Self {
        Self {
            maximum: 0,
            length: 0,
            buffer: std::ptr::null_mut(),
            release: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// Marker for element types the arena may bulk-copy as raw bytes.
///
/// # Safety
///
/// Implementors must be plain-old-data: no padding with semantic content,
/// no pointers owning anything, valid for any bit pattern produced by
/// copying a live value.
pub unsafe trait ArenaPod: Copy {}

unsafe impl ArenaPod for u8 {}
unsafe impl ArenaPod for i8 {}
unsafe impl ArenaPod for u16 {}
unsafe impl ArenaPod for i16 {}
unsafe impl ArenaPod for u32 {}
unsafe impl ArenaPod for i32 {}
unsafe impl ArenaPod for u64 {}
unsafe impl ArenaPod for i64 {}
unsafe impl ArenaPod for f32 {}
unsafe impl ArenaPod for f64 {}

/// Tail cursor snapshot; see [`NativeArena::mark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaMark(usize);

/// Dual-region allocator over a caller-provided buffer.
pub struct NativeArena<'buf> {
    buffer: &'buf mut [u8],
    /// Native address of `buffer[0]`, used to mint pointers the foreign
    /// runtime can dereference.
    base_address: usize,
    head_size: usize,
    tail: usize,
    /// The arena mints raw pointers into the buffer; keep it !Sync-ish in
    /// spirit by not handing out shared aliases.
    _not_send: PhantomData<*mut u8>,
}

impl<'buf> NativeArena<'buf> {
    /// Wrap `buffer`, zeroing the head region `[0, head_size)`.
    ///
    /// Both the buffer's own address and `base_address` must be 8-byte
    /// aligned: tail offsets are aligned relative to the buffer start, so
    /// the typed views [`allocate_array`](Self::allocate_array) hands out
    /// and the pointers the native side dereferences are only aligned if
    /// the starts themselves are.
    pub fn new(
        buffer: &'buf mut [u8],
        base_address: usize,
        head_size: usize,
    ) -> ArenaResult<Self> {
        let local_address = buffer.as_ptr() as usize;
        if local_address % TAIL_ALIGN != 0 {
            return Err(ArenaError::Misaligned {
                address: local_address,
            });
        }
        if base_address % TAIL_ALIGN != 0 {
            return Err(ArenaError::Misaligned {
                address: base_address,
            });
        }
        if head_size > buffer.len() {
            return Err(ArenaError::HeadTooLarge {
                head_size,
                buffer_len: buffer.len(),
            });
        }
        buffer[..head_size].fill(0);
        Ok(Self {
            buffer,
            base_address,
            head_size,
            tail: head_size,
            _not_send: PhantomData,
        })
    }

    pub fn base_address(&self) -> usize {
        self.base_address
    }

    pub fn head_size(&self) -> usize {
        self.head_size
    }

    /// Bytes consumed in the tail region so far.
    pub fn tail_used(&self) -> usize {
        self.tail - self.head_size
    }

    /// Head and tail as written so far (head + consumed tail).
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.tail]
    }

    /// Snapshot the tail cursor.
    pub fn mark(&self) -> ArenaMark {
        ArenaMark(self.tail)
    }

    /// Release all tail space allocated since `mark`.
    ///
    /// Pointers minted before the mark stay valid; anything minted after
    /// it must not be used again.
    pub fn rewind(&mut self, mark: ArenaMark) {
        debug_assert!(mark.0 >= self.head_size && mark.0 <= self.tail);
        self.tail = mark.0.clamp(self.head_size, self.tail);
    }

    /// Allocate a NUL-terminated UTF-8 string in the tail.
    ///
    /// `None` maps to a null pointer without touching the tail, which is
    /// how an unset optional string field reads on the native side.
    pub fn create_string(&mut self, text: Option<&str>) -> ArenaResult<*mut c_char> {
        let Some(text) = text else {
            return Ok(std::ptr::null_mut());
        };

        self.align_tail()?;
        let bytes = text.as_bytes();
        let offset = self.reserve(bytes.len() + 1)?;
        self.buffer[offset..offset + bytes.len()].copy_from_slice(bytes);
        self.buffer[offset + bytes.len()] = 0;

        log::trace!(
            "[ARENA] string {} bytes at tail offset {}",
            bytes.len() + 1,
            offset
        );
        Ok((self.base_address + offset) as *mut c_char)
    }

    /// Bulk-copy primitive elements into the tail and return the populated
    /// native sequence record.
    ///
    /// An empty slice yields the zero record and does not touch the tail.
    pub fn create_sequence<T: ArenaPod>(&mut self, elements: &[T]) -> ArenaResult<SequenceNative> {
        if elements.is_empty() {
            return Ok(SequenceNative::empty());
        }

        self.align_tail()?;
        let total = std::mem::size_of_val(elements);
        let offset = self.reserve(total)?;

        // ArenaPod guarantees the element bytes are plain data.
        let src = unsafe {
            std::slice::from_raw_parts(elements.as_ptr().cast::<u8>(), total)
        };
        self.buffer[offset..offset + total].copy_from_slice(src);

        log::trace!(
            "[ARENA] sequence {} x {} bytes at tail offset {}",
            elements.len(),
            std::mem::size_of::<T>(),
            offset
        );
        Ok(SequenceNative {
            maximum: elements.len() as u32,
            length: elements.len() as u32,
            buffer: (self.base_address + offset) as *mut c_void,
            release: false,
        })
    }

    /// Allocate a zero-filled array of `count` native elements and return a
    /// typed view for the caller to populate field by field.
    ///
    /// Also returns the native pointer for the head field to store. The
    /// view borrows the arena, so tail allocation pauses while the caller
    /// fills it in.
    pub fn allocate_array<T: ArenaPod>(
        &mut self,
        count: usize,
    ) -> ArenaResult<(*mut c_void, &mut [T])> {
        self.align_tail()?;
        let total = count * std::mem::size_of::<T>();
        let offset = self.reserve(total)?;
        self.buffer[offset..offset + total].fill(0);

        log::trace!(
            "[ARENA] array {} x {} bytes at tail offset {}",
            count,
            std::mem::size_of::<T>(),
            offset
        );

        let ptr = (self.base_address + offset) as *mut c_void;
        // Buffer start and offset are both 8-aligned (checked at
        // construction), T is POD, and the region was just zeroed.
        let view = unsafe {
            std::slice::from_raw_parts_mut(self.buffer[offset..].as_mut_ptr().cast::<T>(), count)
        };
        Ok((ptr, view))
    }

    /// Store raw bytes into the head region (a computed field offset).
    pub fn write_head(&mut self, offset: usize, data: &[u8]) -> ArenaResult<()> {
        if offset + data.len() > self.head_size {
            return Err(ArenaError::Exhausted {
                need: data.len(),
                have: self.head_size.saturating_sub(offset),
            });
        }
        self.buffer[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn align_tail(&mut self) -> ArenaResult<()> {
        let padding = padding_for(self.tail, TAIL_ALIGN);
        if padding > 0 {
            if self.tail + padding > self.buffer.len() {
                return Err(ArenaError::Exhausted {
                    need: padding,
                    have: self.buffer.len() - self.tail,
                });
            }
            self.buffer[self.tail..self.tail + padding].fill(0);
            self.tail += padding;
        }
        Ok(())
    }

    /// Claim `size` tail bytes, returning their buffer offset.
    fn reserve(&mut self, size: usize) -> ArenaResult<usize> {
        if self.tail + size > self.buffer.len() {
            return Err(ArenaError::Exhausted {
                need: size,
                have: self.buffer.len() - self.tail,
            });
        }
        let offset = self.tail;
        self.tail += size;
        Ok(offset)
    }
}

impl fmt::Debug for NativeArena<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeArena")
            .field("base_address", &format_args!("0x{:x}", self.base_address))
            .field("head_size", &self.head_size)
            .field("tail", &self.tail)
            .field("capacity", &self.buffer.len())
            .finish()
    }
}
