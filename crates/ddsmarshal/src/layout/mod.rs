// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Native-ABI layout engine.
//!
//! Computes struct and union layouts bit-identical to what a C compiler
//! produces for the generated native types, so the head region of a
//! marshaled buffer can be handed to the middleware without copying.
//! Layouts are deterministic functions of the declaration and are computed
//! once per type, then cached by callers.

pub mod align;
pub mod structs;
pub mod unions;

pub use align::{align_up, padding_for};
pub use structs::compute_struct_layout;
pub use unions::compute_union_layout;

use std::fmt;

use crate::schema::TypeTag;

/// Layout construction error. These are programming errors in the type
/// declaration and never occur on the encode/decode path.
#[derive(Debug, Clone)]
pub enum LayoutError {
    MissingDiscriminator { type_name: String },
    EmptyUnion { type_name: String },
    InvalidDiscriminator { type_name: String, tag: String },
    ZeroLengthArray { type_name: String, field: String },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::MissingDiscriminator { type_name } => {
                write!(f, "union '{}' has no discriminator", type_name)
            }
            LayoutError::EmptyUnion { type_name } => {
                write!(f, "union '{}' has no arms", type_name)
            }
            LayoutError::InvalidDiscriminator { type_name, tag } => {
                write!(
                    f,
                    "union '{}' discriminator must be an integer type, got {}",
                    type_name, tag
                )
            }
            LayoutError::ZeroLengthArray { type_name, field } => {
                write!(f, "'{}' field '{}' is a zero-length array", type_name, field)
            }
        }
    }
}

impl std::error::Error for LayoutError {}

pub type LayoutResult<T> = core::result::Result<T, LayoutError>;

/// Layout facts for one struct field. Immutable once computed.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldLayout {
    pub name: String,
    pub tag: TypeTag,
    /// Byte offset inside the native struct.
    pub offset: usize,
    pub size: usize,
    pub alignment: usize,
    /// Padding bytes inserted before this field.
    pub padding_before: usize,
}

/// Complete layout of a native struct.
#[derive(Debug, Clone, PartialEq)]
pub struct StructLayout {
    pub fields: Vec<FieldLayout>,
    /// Total size including trailing padding, so array-of-struct repetition
    /// keeps every element aligned.
    pub total_size: usize,
    /// Max field alignment; the struct's own alignment.
    pub max_alignment: usize,
    pub trailing_padding: usize,
}

impl StructLayout {
    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.field(name).map(|f| f.offset)
    }
}

/// Complete layout of a native union (discriminator + overlapping arms).
#[derive(Debug, Clone, PartialEq)]
pub struct UnionLayout {
    pub discriminator: TypeTag,
    pub discriminator_size: usize,
    pub discriminator_alignment: usize,
    /// Byte offset where the arm payload starts.
    pub payload_offset: usize,
    pub max_arm_size: usize,
    pub max_arm_alignment: usize,
    /// Total size, a multiple of [`Self::alignment`].
    pub total_size: usize,
}

impl UnionLayout {
    /// The union's own alignment.
    pub fn alignment(&self) -> usize {
        self.discriminator_alignment.max(self.max_arm_alignment)
    }
}
