// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # ddsmarshal
//!
//! CDR wire-format codec, C-ABI layout engine and marshaling arena for DDS
//! middleware interop.
//!
//! The crate covers the byte-level contract between managed data and a
//! C-ABI middleware process:
//!
//! - [`cdr`] — streaming CDR encode/decode in the two wire variants
//!   (XCDR1/XCDR2), plus encapsulation headers and a dry-run sizer.
//! - [`layout`] — struct and union layouts bit-identical to a C compiler's
//!   rules, with the alignment arithmetic shared crate-wide.
//! - [`arena`] — the dual-region (head + tail) allocator that assembles a
//!   native sample buffer in one contiguous block.
//! - [`descriptor`] — the ops bytecode and key tables the native layer
//!   consumes for type registration and key extraction.
//! - [`schema`] — plain-data type declarations and schema fingerprints.
//! - [`registry`] — the explicit type-support registry hosts pass around.
//!
//! Everything except the registry is synchronous and single-use per
//! marshaling call. Transport, QoS and entity lifecycle live elsewhere;
//! this crate only defines encodings and layouts.

pub mod arena;
pub mod cdr;
pub mod descriptor;
pub mod layout;
pub mod registry;
pub mod schema;

pub use arena::{ArenaError, ArenaMark, ArenaPod, NativeArena, SequenceNative};
pub use cdr::{
    BufferSink, CdrEncoding, CdrError, CdrReader, CdrSizer, CdrWriter, SliceSink, VecSink,
};
pub use descriptor::{
    build_topic_descriptor, DescriptorError, KeyDescriptor, TopicDescriptor,
};
pub use layout::{
    compute_struct_layout, compute_union_layout, FieldLayout, LayoutError, StructLayout,
    UnionLayout,
};
pub use registry::{RegistryError, TypeSupportRegistry};
pub use schema::{
    Extensibility, FieldDecl, SchemaFingerprint, StructBuilder, StructDecl, TypeTag, UnionArm,
    UnionBuilder, UnionDecl,
};

use std::fmt;

/// Crate-level error aggregating the per-module kinds.
///
/// Nothing here is retried internally: each kind is fatal to the current
/// marshaling operation, and the caller aborts it (a partially written
/// native buffer is unsafe to hand to the native layer).
#[derive(Debug, Clone)]
pub enum Error {
    Cdr(CdrError),
    Arena(ArenaError),
    Layout(LayoutError),
    Descriptor(DescriptorError),
    Registry(RegistryError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Cdr(e) => write!(f, "cdr: {}", e),
            Error::Arena(e) => write!(f, "arena: {}", e),
            Error::Layout(e) => write!(f, "layout: {}", e),
            Error::Descriptor(e) => write!(f, "descriptor: {}", e),
            Error::Registry(e) => write!(f, "registry: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Cdr(e) => Some(e),
            Error::Arena(e) => Some(e),
            Error::Layout(e) => Some(e),
            Error::Descriptor(e) => Some(e),
            Error::Registry(e) => Some(e),
        }
    }
}

impl From<CdrError> for Error {
    fn from(e: CdrError) -> Self {
        Error::Cdr(e)
    }
}

impl From<ArenaError> for Error {
    fn from(e: ArenaError) -> Self {
        Error::Arena(e)
    }
}

impl From<LayoutError> for Error {
    fn from(e: LayoutError) -> Self {
        Error::Layout(e)
    }
}

impl From<DescriptorError> for Error {
    fn from(e: DescriptorError) -> Self {
        Error::Descriptor(e)
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Error::Registry(e)
    }
}

pub type Result<T> = core::result::Result<T, Error>;
