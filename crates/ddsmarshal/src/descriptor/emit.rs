// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Ops bytecode emission from a computed struct layout.
//!
//! Instruction stream shape: an optional DLC prefix (appendable type under
//! an XCDR2 encoding), one ADR group per field in declaration order, an
//! RTS terminator, then one `KOF 1` pair per key field. The parallel
//! key-descriptor table points each key at its KOF word.

use crate::layout::{compute_struct_layout, StructLayout};
use crate::schema::{Extensibility, SchemaFingerprint, StructDecl, TypeTag};

use super::{
    adr, kof, DescriptorError, DescriptorResult, KeyDescriptor, TopicDescriptor, FLAG_FP,
    FLAG_KEY, FLAG_OPT, FLAG_SGN, OP_DLC, OP_RTS, TYPE_1BY, TYPE_2BY, TYPE_4BY, TYPE_8BY,
    TYPE_ARR, TYPE_BLN, TYPE_BST, TYPE_ENU, TYPE_SEQ, TYPE_STR,
};

/// Primary/subtype code for a tag, or `None` for aggregates the flat ops
/// format cannot express inline.
fn element_code(tag: &TypeTag) -> Option<u8> {
    match tag {
        TypeTag::Bool => Some(TYPE_BLN),
        TypeTag::U8 | TypeTag::I8 | TypeTag::Char => Some(TYPE_1BY),
        TypeTag::U16 | TypeTag::I16 => Some(TYPE_2BY),
        TypeTag::U32 | TypeTag::I32 | TypeTag::F32 => Some(TYPE_4BY),
        TypeTag::U64 | TypeTag::I64 | TypeTag::F64 => Some(TYPE_8BY),
        TypeTag::Enum(_) => Some(TYPE_ENU),
        TypeTag::String => Some(TYPE_STR),
        TypeTag::BoundedString(_) => Some(TYPE_BST),
        TypeTag::Sequence(_) | TypeTag::Array(_, _) => None,
    }
}

fn field_flags(tag: &TypeTag, key: bool, optional: bool) -> u32 {
    let mut flags = 0;
    if key {
        flags |= FLAG_KEY;
    }
    if optional {
        flags |= FLAG_OPT;
    }
    if tag.is_signed_int() {
        flags |= FLAG_SGN;
    }
    if tag.is_float() {
        flags |= FLAG_FP;
    }
    flags
}

/// Encode a struct layout into the ops array and key-descriptor table.
///
/// `decl` and `layout` must describe the same type; pass the layout back
/// in rather than recomputing so cached layouts stay the single source of
/// offsets.
pub fn emit_ops(
    decl: &StructDecl,
    layout: &StructLayout,
) -> DescriptorResult<(Vec<u32>, Vec<KeyDescriptor>)> {
    if decl.extensibility == Extensibility::Mutable {
        return Err(DescriptorError::UnsupportedExtensibility {
            type_name: decl.name.clone(),
        });
    }
    if decl.fields.len() != layout.fields.len() {
        return Err(DescriptorError::LayoutMismatch {
            type_name: decl.name.clone(),
            decl_fields: decl.fields.len(),
            layout_fields: layout.fields.len(),
        });
    }

    let mut ops = Vec::with_capacity(decl.fields.len() * 2 + 2);
    if decl.extensibility == Extensibility::Appendable && decl.encoding.uses_dheader() {
        ops.push(OP_DLC);
    }

    // ADR word index per field, for the KOF blocks below.
    let mut adr_index = Vec::with_capacity(decl.fields.len());

    for (field, field_layout) in decl.fields.iter().zip(&layout.fields) {
        debug_assert_eq!(field.name, field_layout.name);
        let flags = field_flags(&field.tag, field.key, field.optional);
        adr_index.push(ops.len());

        match &field.tag {
            TypeTag::Sequence(elem) => {
                let sub = element_code(elem).ok_or_else(|| DescriptorError::UnsupportedType {
                    field: field.name.clone(),
                    detail: format!(
                        "sequence of {} needs a subroutine, which this emitter does not produce",
                        elem.canonical_name()
                    ),
                })?;
                ops.push(adr(TYPE_SEQ, sub, flags));
                ops.push(field_layout.offset as u32);
                if let TypeTag::BoundedString(bound) = elem.as_ref() {
                    ops.push(bound + 1);
                }
            }
            TypeTag::Array(elem, len) => {
                let sub = element_code(elem).ok_or_else(|| DescriptorError::UnsupportedType {
                    field: field.name.clone(),
                    detail: format!(
                        "array of {} needs a subroutine, which this emitter does not produce",
                        elem.canonical_name()
                    ),
                })?;
                ops.push(adr(TYPE_ARR, sub, flags));
                ops.push(field_layout.offset as u32);
                ops.push(*len);
                if let TypeTag::BoundedString(bound) = elem.as_ref() {
                    ops.push(bound + 1);
                }
            }
            TypeTag::BoundedString(bound) => {
                ops.push(adr(TYPE_BST, 0, flags));
                ops.push(field_layout.offset as u32);
                ops.push(bound + 1);
            }
            TypeTag::Enum(max) => {
                ops.push(adr(TYPE_ENU, 0, flags));
                ops.push(field_layout.offset as u32);
                ops.push(*max);
            }
            other => {
                // element_code is total over non-composite tags
                let code = element_code(other).ok_or_else(|| DescriptorError::UnsupportedType {
                    field: field.name.clone(),
                    detail: other.canonical_name(),
                })?;
                ops.push(adr(code, 0, flags));
                ops.push(field_layout.offset as u32);
            }
        }
    }

    ops.push(OP_RTS);

    let mut keys = Vec::new();
    for (key_index, (field_index, field)) in decl.key_fields().enumerate() {
        let kof_index = ops.len();
        ops.push(kof(1));
        ops.push(adr_index[field_index] as u32);
        keys.push(KeyDescriptor {
            name: field.name.clone(),
            ops_offset: kof_index as u32,
            index: key_index as u32,
        });
    }

    log::debug!(
        "[DESCRIPTOR] {}: {} ops, {} keys",
        decl.name,
        ops.len(),
        keys.len()
    );
    Ok((ops, keys))
}

/// Compute layout, ops, keys and fingerprint for a declaration in one go:
/// the complete native registration payload.
pub fn build_topic_descriptor(decl: &StructDecl) -> crate::Result<TopicDescriptor> {
    let layout = compute_struct_layout(decl)?;
    let (ops, keys) = emit_ops(decl, &layout)?;
    Ok(TopicDescriptor {
        type_name: decl.name.clone(),
        size: layout.total_size,
        alignment: layout.max_alignment,
        extensibility: decl.extensibility,
        encoding: decl.encoding,
        ops,
        keys,
        fingerprint: SchemaFingerprint::compute(decl),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdr::CdrEncoding;
    use crate::schema::{FieldDecl, StructBuilder};

    /// The mixed-key reference type: signed key, string key, plain string.
    fn mixed_key_decl() -> StructDecl {
        StructBuilder::new("MixedKeyMessage")
            .key_field("Id", TypeTag::I32)
            .key_field("Name", TypeTag::String)
            .string_field("Note")
            .encoding(CdrEncoding::Xcdr2)
            .build()
    }

    #[test]
    fn test_mixed_key_reference_ops() {
        let decl = mixed_key_decl();
        let layout = compute_struct_layout(&decl).expect("layout should succeed");
        let (ops, keys) = emit_ops(&decl, &layout).expect("emit should succeed");

        // Byte-for-byte the independently generated reference artifact.
        assert_eq!(
            ops,
            vec![
                67108864,  // DLC
                16973829,  // ADR | 4BY | SGN | KEY
                0,         // offsetof Id
                17104897,  // ADR | STR | KEY
                8,         // offsetof Name
                17104896,  // ADR | STR
                16,        // offsetof Note
                0,         // RTS
                117440513, // KOF 1
                1,         // ops index of Id's ADR
                117440513, // KOF 1
                3,         // ops index of Name's ADR
            ]
        );
        assert_eq!(
            keys,
            vec![
                KeyDescriptor {
                    name: "Id".into(),
                    ops_offset: 8,
                    index: 0
                },
                KeyDescriptor {
                    name: "Name".into(),
                    ops_offset: 10,
                    index: 1
                },
            ]
        );
    }

    #[test]
    fn test_string_key_reference_ops() {
        let decl = StructBuilder::new("StringKeyMessage")
            .key_field("KeyId", TypeTag::String)
            .string_field("Payload")
            .encoding(CdrEncoding::Xcdr2)
            .build();
        let layout = compute_struct_layout(&decl).expect("layout should succeed");
        let (ops, keys) = emit_ops(&decl, &layout).expect("emit should succeed");

        assert_eq!(
            ops,
            vec![67108864, 17104897, 0, 17104896, 8, 0, 117440513, 1]
        );
        assert_eq!(keys[0].ops_offset, 6);
        assert_eq!(keys[0].index, 0);
    }

    #[test]
    fn test_no_dlc_for_final_or_xcdr1() {
        let final_decl = StructBuilder::new("T")
            .field("a", TypeTag::U32)
            .extensibility(Extensibility::Final)
            .encoding(CdrEncoding::Xcdr2)
            .build();
        let layout = compute_struct_layout(&final_decl).expect("layout should succeed");
        let (ops, _) = emit_ops(&final_decl, &layout).expect("emit should succeed");
        assert_ne!(ops[0], OP_DLC);

        let v1_decl = StructBuilder::new("T")
            .field("a", TypeTag::U32)
            .encoding(CdrEncoding::Xcdr1)
            .build();
        let layout = compute_struct_layout(&v1_decl).expect("layout should succeed");
        let (ops, _) = emit_ops(&v1_decl, &layout).expect("emit should succeed");
        assert_ne!(ops[0], OP_DLC);
    }

    #[test]
    fn test_composite_fields_emit_extra_words() {
        let decl = StructBuilder::new("T")
            .field("tag", TypeTag::BoundedString(15))
            .array_field("mac", TypeTag::U8, 6)
            .sequence_field("samples", TypeTag::F64)
            .field("state", TypeTag::Enum(3))
            .encoding(CdrEncoding::Xcdr1)
            .build();
        let layout = compute_struct_layout(&decl).expect("layout should succeed");
        let (ops, _) = emit_ops(&decl, &layout).expect("emit should succeed");

        assert_eq!(
            ops,
            vec![
                adr(TYPE_BST, 0, 0),
                0,
                16, // bound + NUL
                adr(TYPE_ARR, TYPE_1BY, 0),
                16,
                6, // element count
                adr(TYPE_SEQ, TYPE_8BY, 0),
                24,
                adr(TYPE_ENU, 0, 0),
                32,
                3, // highest enum value
                OP_RTS,
            ]
        );
    }

    #[test]
    fn test_nested_sequence_is_unsupported() {
        let decl = StructBuilder::new("T")
            .sequence_field(
                "matrix",
                TypeTag::Sequence(Box::new(TypeTag::F64)),
            )
            .build();
        let layout = compute_struct_layout(&decl).expect("layout should succeed");
        let err = emit_ops(&decl, &layout).unwrap_err();
        assert!(matches!(err, DescriptorError::UnsupportedType { .. }));
    }

    #[test]
    fn test_foreign_layout_is_rejected() {
        let decl = mixed_key_decl();
        let other = StructBuilder::new("T")
            .field("a", TypeTag::U32)
            .build();
        let short_layout = compute_struct_layout(&other).expect("layout should succeed");
        let err = emit_ops(&decl, &short_layout).unwrap_err();
        assert!(matches!(err, DescriptorError::LayoutMismatch { .. }));
    }

    #[test]
    fn test_mutable_extensibility_is_rejected() {
        let decl = StructBuilder::new("T")
            .field("a", TypeTag::U32)
            .extensibility(Extensibility::Mutable)
            .build();
        let layout = compute_struct_layout(&decl).expect("layout should succeed");
        let err = emit_ops(&decl, &layout).unwrap_err();
        assert!(matches!(err, DescriptorError::UnsupportedExtensibility { .. }));
    }

    #[test]
    fn test_optional_field_carries_opt_flag() {
        let decl = StructDecl::new(
            "T",
            vec![FieldDecl::new("maybe", TypeTag::F32).optional()],
        );
        let layout = compute_struct_layout(&decl).expect("layout should succeed");
        let (ops, _) = emit_ops(&decl, &layout).expect("emit should succeed");
        let word = ops.iter().find(|&&w| super::super::opcode(w) == super::super::OP_ADR);
        let word = *word.expect("one ADR word");
        assert_eq!(super::super::flags(word), FLAG_OPT | FLAG_FP);
    }

    #[test]
    fn test_build_topic_descriptor_assembles_everything() {
        let decl = mixed_key_decl();
        let desc = build_topic_descriptor(&decl).expect("build should succeed");
        assert_eq!(desc.type_name, "MixedKeyMessage");
        assert_eq!(desc.size, 24);
        assert_eq!(desc.alignment, 8);
        assert_eq!(desc.nops(), 12);
        assert_eq!(desc.nkeys(), 2);
        assert_eq!(desc.fingerprint, SchemaFingerprint::compute(&decl));
    }
}
