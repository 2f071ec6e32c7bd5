// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builders for struct and union declarations.

use crate::cdr::CdrEncoding;
use crate::schema::{Extensibility, FieldDecl, StructDecl, TypeTag, UnionArm, UnionDecl};

/// Builder for [`StructDecl`].
#[derive(Debug)]
pub struct StructBuilder {
    name: String,
    fields: Vec<FieldDecl>,
    extensibility: Extensibility,
    encoding: CdrEncoding,
}

impl StructBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            extensibility: Extensibility::default(),
            encoding: CdrEncoding::default(),
        }
    }

    /// Add a field.
    pub fn field(mut self, name: impl Into<String>, tag: TypeTag) -> Self {
        self.fields.push(FieldDecl::new(name, tag));
        self
    }

    /// Add a key field.
    pub fn key_field(mut self, name: impl Into<String>, tag: TypeTag) -> Self {
        self.fields.push(FieldDecl::new(name, tag).key());
        self
    }

    /// Add an optional field.
    pub fn optional_field(mut self, name: impl Into<String>, tag: TypeTag) -> Self {
        self.fields.push(FieldDecl::new(name, tag).optional());
        self
    }

    /// Add an unbounded string field.
    pub fn string_field(self, name: impl Into<String>) -> Self {
        self.field(name, TypeTag::String)
    }

    /// Add a sequence field.
    pub fn sequence_field(self, name: impl Into<String>, elem: TypeTag) -> Self {
        self.field(name, TypeTag::Sequence(Box::new(elem)))
    }

    /// Add a fixed-length array field.
    pub fn array_field(self, name: impl Into<String>, elem: TypeTag, len: u32) -> Self {
        self.field(name, TypeTag::Array(Box::new(elem), len))
    }

    pub fn extensibility(mut self, extensibility: Extensibility) -> Self {
        self.extensibility = extensibility;
        self
    }

    pub fn encoding(mut self, encoding: CdrEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn build(self) -> StructDecl {
        StructDecl {
            name: self.name,
            fields: self.fields,
            extensibility: self.extensibility,
            encoding: self.encoding,
        }
    }
}

/// Builder for [`UnionDecl`].
#[derive(Debug)]
pub struct UnionBuilder {
    name: String,
    discriminator: Option<TypeTag>,
    arms: Vec<UnionArm>,
}

impl UnionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            discriminator: None,
            arms: Vec::new(),
        }
    }

    pub fn discriminator(mut self, tag: TypeTag) -> Self {
        self.discriminator = Some(tag);
        self
    }

    pub fn arm(mut self, name: impl Into<String>, labels: Vec<i64>, tag: TypeTag) -> Self {
        self.arms.push(UnionArm::new(name, labels, tag));
        self
    }

    /// Single-label arm.
    pub fn case(self, name: impl Into<String>, label: i64, tag: TypeTag) -> Self {
        self.arm(name, vec![label], tag)
    }

    /// The discriminator stays unset if never supplied; the layout
    /// calculator reports that as an error.
    pub fn build(self) -> UnionDecl {
        UnionDecl {
            name: self.name,
            discriminator: self.discriminator,
            arms: self.arms,
        }
    }
}
