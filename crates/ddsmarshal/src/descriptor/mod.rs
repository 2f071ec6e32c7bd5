// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Descriptor ops model: the compact bytecode the native layer consumes
//! for key extraction and sample introspection.
//!
//! One instruction is a 32-bit word: opcode in bits 24..32, primary type
//! code in bits 16..24, subtype code (sequence/array element) in bits
//! 8..16, flags in bits 0..8. A full ops array plus the parallel
//! key-descriptor table fully describe a struct's field layout.
//!
//! Production descriptors come from [`emit`]; [`decode`] walks an ops
//! array back into field facts, and [`extract`] parses an independently
//! generated C artifact. The latter two exist for interop validation and
//! tooling, never as a runtime dependency.

pub mod decode;
pub mod emit;
pub mod extract;

pub use decode::{decode_ops, DecodedDescriptor, DecodedField, DecodedKey};
pub use emit::{build_topic_descriptor, emit_ops};
pub use extract::{extract_from_c_source, extract_from_file, DescriptorData};

use std::fmt;

use crate::cdr::CdrEncoding;
use crate::schema::{Extensibility, SchemaFingerprint};

// Opcodes (bits 24..32).
pub const OP_RTS: u32 = 0x00 << 24;
pub const OP_ADR: u32 = 0x01 << 24;
pub const OP_JSR: u32 = 0x02 << 24;
pub const OP_JEQ: u32 = 0x03 << 24;
pub const OP_DLC: u32 = 0x04 << 24;
pub const OP_PLC: u32 = 0x05 << 24;
pub const OP_PLM: u32 = 0x06 << 24;
pub const OP_KOF: u32 = 0x07 << 24;

// Type codes (primary in bits 16..24, subtype in bits 8..16).
pub const TYPE_1BY: u8 = 0x01;
pub const TYPE_2BY: u8 = 0x02;
pub const TYPE_4BY: u8 = 0x03;
pub const TYPE_8BY: u8 = 0x04;
pub const TYPE_STR: u8 = 0x05;
pub const TYPE_BST: u8 = 0x06;
pub const TYPE_SEQ: u8 = 0x07;
pub const TYPE_ARR: u8 = 0x08;
pub const TYPE_UNI: u8 = 0x09;
pub const TYPE_STU: u8 = 0x0a;
pub const TYPE_BSQ: u8 = 0x0b;
pub const TYPE_ENU: u8 = 0x0c;
pub const TYPE_EXT: u8 = 0x0d;
pub const TYPE_BLN: u8 = 0x0e;

// Flags (bits 0..8).
pub const FLAG_KEY: u32 = 0x01;
pub const FLAG_DEF: u32 = 0x02;
pub const FLAG_SGN: u32 = 0x04;
pub const FLAG_FP: u32 = 0x08;
pub const FLAG_BASE: u32 = 0x10;
pub const FLAG_OPT: u32 = 0x20;

/// Assemble an ADR instruction word.
pub fn adr(type_code: u8, subtype: u8, flags: u32) -> u32 {
    debug_assert_eq!(flags & !0xff, 0, "flags exceed 8 bits");
    OP_ADR | u32::from(type_code) << 16 | u32::from(subtype) << 8 | flags
}

/// Assemble a KOF instruction word (`count` trailing offset words).
pub fn kof(count: u16) -> u32 {
    OP_KOF | u32::from(count)
}

/// Opcode bits of a word.
pub fn opcode(word: u32) -> u32 {
    word & 0xff00_0000
}

pub fn type_code(word: u32) -> u8 {
    ((word >> 16) & 0xff) as u8
}

pub fn subtype_code(word: u32) -> u8 {
    ((word >> 8) & 0xff) as u8
}

pub fn flags(word: u32) -> u32 {
    word & 0xff
}

/// Trailing word count of a KOF instruction.
pub fn kof_count(word: u32) -> u16 {
    (word & 0xffff) as u16
}

/// One entry of the key-descriptor table: which field, where its KOF
/// instruction sits in the ops array, and the key's ordinal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDescriptor {
    pub name: String,
    /// Index of this key's KOF word inside the ops array.
    pub ops_offset: u32,
    /// Position in the key, 0-based declaration order.
    pub index: u32,
}

/// Registration payload for the native layer's type-registration call:
/// everything it needs to allocate, introspect and key a sample.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicDescriptor {
    pub type_name: String,
    /// Native struct size including trailing padding.
    pub size: usize,
    pub alignment: usize,
    pub extensibility: Extensibility,
    pub encoding: CdrEncoding,
    pub ops: Vec<u32>,
    pub keys: Vec<KeyDescriptor>,
    pub fingerprint: SchemaFingerprint,
}

impl TopicDescriptor {
    pub fn nops(&self) -> u32 {
        self.ops.len() as u32
    }

    pub fn nkeys(&self) -> u32 {
        self.keys.len() as u32
    }
}

/// Descriptor emission, decoding or extraction failure.
///
/// Reported distinctly from codec and arena errors: these concern tooling
/// and validation, not runtime marshaling.
#[derive(Debug, Clone)]
pub enum DescriptorError {
    /// A type the ops format cannot express at this nesting depth.
    UnsupportedType { field: String, detail: String },
    /// Extensibility the emitter does not produce (mutable types).
    UnsupportedExtensibility { type_name: String },
    /// Declaration and layout passed to the emitter describe different
    /// field lists.
    LayoutMismatch {
        type_name: String,
        decl_fields: usize,
        layout_fields: usize,
    },
    /// An opcode the decoder does not recognize.
    UnknownOpcode { index: usize, word: u32 },
    /// The ops array ends mid-instruction.
    TruncatedOps { index: usize, expected: String },
    /// Key table and ops array disagree.
    KeyMismatch { name: String, detail: String },
    /// The parsed artifact is missing a required element.
    MissingElement { what: String },
    /// An identifier the extractor's constant table does not know.
    UnknownIdentifier { name: String },
    /// An expression form the extractor does not evaluate.
    MalformedExpression { text: String },
    /// Reading the artifact from disk failed.
    Io { path: String, detail: String },
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorError::UnsupportedType { field, detail } => {
                write!(f, "field '{}' is not expressible: {}", field, detail)
            }
            DescriptorError::UnsupportedExtensibility { type_name } => {
                write!(f, "type '{}' has an extensibility this emitter does not produce", type_name)
            }
            DescriptorError::LayoutMismatch {
                type_name,
                decl_fields,
                layout_fields,
            } => {
                write!(
                    f,
                    "type '{}' declares {} fields but its layout has {}",
                    type_name, decl_fields, layout_fields
                )
            }
            DescriptorError::UnknownOpcode { index, word } => {
                write!(f, "unknown opcode 0x{:08x} at ops[{}]", word, index)
            }
            DescriptorError::TruncatedOps { index, expected } => {
                write!(f, "ops array truncated at [{}], expected {}", index, expected)
            }
            DescriptorError::KeyMismatch { name, detail } => {
                write!(f, "key '{}' inconsistent with ops array: {}", name, detail)
            }
            DescriptorError::MissingElement { what } => {
                write!(f, "artifact is missing {}", what)
            }
            DescriptorError::UnknownIdentifier { name } => {
                write!(f, "unknown identifier '{}' in ops expression", name)
            }
            DescriptorError::MalformedExpression { text } => {
                write!(f, "malformed ops expression '{}'", text)
            }
            DescriptorError::Io { path, detail } => {
                write!(f, "cannot read '{}': {}", path, detail)
            }
        }
    }
}

impl std::error::Error for DescriptorError {}

pub type DescriptorResult<T> = core::result::Result<T, DescriptorError>;
