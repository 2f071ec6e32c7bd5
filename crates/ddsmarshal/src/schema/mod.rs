// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema declarations: the plain-data type model handed to the layout and
//! descriptor engines.
//!
//! A source-generation front end (or a test) describes a topic type as an
//! ordered list of [`FieldDecl`] values. Nothing here reflects over Rust
//! types at runtime; the calculators stay language-agnostic.

pub mod builder;
pub mod fingerprint;

pub use builder::{StructBuilder, UnionBuilder};
pub use fingerprint::{EvolutionChange, SchemaFingerprint};

use crate::cdr::CdrEncoding;

/// Field type tag covering every kind the native layout understands.
///
/// Strings and sequences are stored by pointer in native structs, so both
/// report pointer size/alignment. A bounded string is an inline `char`
/// array of `bound + 1` bytes (content plus NUL).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Bool,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    Char,
    /// u32-backed enumeration; the payload is the highest valid value.
    Enum(u32),
    /// Unbounded UTF-8 string (native: pointer to NUL-terminated chars).
    String,
    /// Bounded string with the given content bound (native: inline array).
    BoundedString(u32),
    /// Unbounded sequence of elements (native: pointer-sized handle).
    Sequence(Box<TypeTag>),
    /// Fixed-length array of elements (native: inline repetition).
    Array(Box<TypeTag>, u32),
}

/// Pointer width in the native ABI this crate targets (64-bit).
pub const POINTER_SIZE: usize = 8;

impl TypeTag {
    /// Native size in bytes. `None` for zero-length arrays, which are
    /// rejected later as a layout error.
    pub fn native_size(&self) -> Option<usize> {
        match self {
            Self::Bool | Self::U8 | Self::I8 | Self::Char => Some(1),
            Self::U16 | Self::I16 => Some(2),
            Self::U32 | Self::I32 | Self::F32 | Self::Enum(_) => Some(4),
            Self::U64 | Self::I64 | Self::F64 => Some(8),
            Self::String | Self::Sequence(_) => Some(POINTER_SIZE),
            Self::BoundedString(bound) => Some(*bound as usize + 1),
            Self::Array(elem, len) => {
                if *len == 0 {
                    None
                } else {
                    elem.native_size().map(|s| s * *len as usize)
                }
            }
        }
    }

    /// Native alignment requirement in bytes.
    pub fn native_alignment(&self) -> usize {
        match self {
            Self::Bool | Self::U8 | Self::I8 | Self::Char | Self::BoundedString(_) => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 | Self::Enum(_) => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
            Self::String | Self::Sequence(_) => POINTER_SIZE,
            Self::Array(elem, _) => elem.native_alignment(),
        }
    }

    /// CDR alignment of the first byte this tag writes on the wire.
    /// Strings, sequences and enums start with a 4-byte field.
    pub fn cdr_alignment(&self) -> usize {
        match self {
            Self::Bool | Self::U8 | Self::I8 | Self::Char | Self::BoundedString(_) => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 | Self::Enum(_) | Self::String => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
            Self::Sequence(_) => 4,
            Self::Array(elem, _) => elem.cdr_alignment(),
        }
    }

    /// True for the signed integer family (descriptor SGN flag).
    pub fn is_signed_int(&self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    /// True for the floating-point family (descriptor FP flag).
    pub fn is_float(&self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Canonical name used by fingerprints and diagnostics.
    pub fn canonical_name(&self) -> String {
        match self {
            Self::Bool => "boolean".into(),
            Self::U8 => "uint8".into(),
            Self::I8 => "int8".into(),
            Self::U16 => "uint16".into(),
            Self::I16 => "int16".into(),
            Self::U32 => "uint32".into(),
            Self::I32 => "int32".into(),
            Self::U64 => "uint64".into(),
            Self::I64 => "int64".into(),
            Self::F32 => "float".into(),
            Self::F64 => "double".into(),
            Self::Char => "char".into(),
            Self::Enum(max) => format!("enum<{}>", max),
            Self::String => "string".into(),
            Self::BoundedString(bound) => format!("string<{}>", bound),
            Self::Sequence(elem) => format!("sequence<{}>", elem.canonical_name()),
            Self::Array(elem, len) => format!("{}[{}]", elem.canonical_name(), len),
        }
    }
}

/// Extensibility class of an aggregate type (XTypes 1.3).
///
/// Governs whether the wire form carries a DHEADER under XCDR2 and which
/// schema evolutions stay compatible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extensibility {
    /// No members may be added or removed.
    Final,
    /// Members may be appended; the wire form is length-delimited under XCDR2.
    #[default]
    Appendable,
    /// Members carry ids and may be reordered (not emitted by this crate's
    /// descriptor encoder).
    Mutable,
}

/// One declared struct member, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub tag: TypeTag,
    /// Participates in the topic's identity key.
    pub key: bool,
    /// Optional member (may be absent on the wire).
    pub optional: bool,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            tag,
            key: false,
            optional: false,
        }
    }

    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// A struct type declaration: ordered fields plus the wire conventions
/// fixed for it at schema-definition time.
#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
    pub extensibility: Extensibility,
    /// CDR variant this type encodes with. Fixed per type; both ends must
    /// agree or decoding corrupts silently.
    pub encoding: CdrEncoding,
}

impl StructDecl {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDecl>) -> Self {
        Self {
            name: name.into(),
            fields,
            extensibility: Extensibility::default(),
            encoding: CdrEncoding::default(),
        }
    }

    /// Key fields in declaration order.
    pub fn key_fields(&self) -> impl Iterator<Item = (usize, &FieldDecl)> {
        self.fields.iter().enumerate().filter(|(_, f)| f.key)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One union arm: the case labels selecting it and the arm's payload type.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionArm {
    pub name: String,
    pub labels: Vec<i64>,
    pub tag: TypeTag,
}

impl UnionArm {
    pub fn new(name: impl Into<String>, labels: Vec<i64>, tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            labels,
            tag,
        }
    }

    /// Single-label arm.
    pub fn single(name: impl Into<String>, label: i64, tag: TypeTag) -> Self {
        Self::new(name, vec![label], tag)
    }
}

/// A union type declaration: discriminator plus case arms.
///
/// The discriminator may be absent while a declaration is being assembled;
/// the layout calculator rejects that as an error rather than defaulting.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionDecl {
    pub name: String,
    pub discriminator: Option<TypeTag>,
    pub arms: Vec<UnionArm>,
}

impl UnionDecl {
    pub fn new(name: impl Into<String>, discriminator: TypeTag, arms: Vec<UnionArm>) -> Self {
        Self {
            name: name.into(),
            discriminator: Some(discriminator),
            arms,
        }
    }

    pub fn arm_by_label(&self, label: i64) -> Option<&UnionArm> {
        self.arms.iter().find(|a| a.labels.contains(&label))
    }
}
