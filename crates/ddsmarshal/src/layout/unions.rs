// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! C-compatible union layout computation.

use crate::layout::{align_up, LayoutError, LayoutResult, UnionLayout};
use crate::schema::{TypeTag, UnionDecl};

/// Compute the native layout of a union declaration.
///
/// The payload starts at the discriminator size rounded up to
/// `max(discriminator alignment, max arm alignment)`; the total size is the
/// payload end rounded up to the union's own alignment. A union without a
/// discriminator or without arms is an error, never a zero-size default.
pub fn compute_union_layout(decl: &UnionDecl) -> LayoutResult<UnionLayout> {
    let Some(discriminator) = decl.discriminator.clone() else {
        return Err(LayoutError::MissingDiscriminator {
            type_name: decl.name.clone(),
        });
    };
    if !is_discriminator_tag(&discriminator) {
        return Err(LayoutError::InvalidDiscriminator {
            type_name: decl.name.clone(),
            tag: discriminator.canonical_name(),
        });
    }
    if decl.arms.is_empty() {
        return Err(LayoutError::EmptyUnion {
            type_name: decl.name.clone(),
        });
    }

    // Discriminator tags always have a known size.
    let discriminator_size = discriminator.native_size().unwrap_or(4);
    let discriminator_alignment = discriminator.native_alignment();

    let mut max_arm_size = 0usize;
    let mut max_arm_alignment = 1usize;
    for arm in &decl.arms {
        let size = arm
            .tag
            .native_size()
            .ok_or_else(|| LayoutError::ZeroLengthArray {
                type_name: decl.name.clone(),
                field: arm.name.clone(),
            })?;
        max_arm_size = max_arm_size.max(size);
        max_arm_alignment = max_arm_alignment.max(arm.tag.native_alignment());
    }

    let union_alignment = discriminator_alignment.max(max_arm_alignment);
    let payload_offset = align_up(discriminator_size, union_alignment);
    let total_size = align_up(payload_offset + max_arm_size, union_alignment);

    Ok(UnionLayout {
        discriminator,
        discriminator_size,
        discriminator_alignment,
        payload_offset,
        max_arm_size,
        max_arm_alignment,
        total_size,
    })
}

fn is_discriminator_tag(tag: &TypeTag) -> bool {
    matches!(
        tag,
        TypeTag::Bool
            | TypeTag::U8
            | TypeTag::I8
            | TypeTag::U16
            | TypeTag::I16
            | TypeTag::U32
            | TypeTag::I32
            | TypeTag::U64
            | TypeTag::I64
            | TypeTag::Char
            | TypeTag::Enum(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{UnionArm, UnionDecl};

    #[test]
    fn test_byte_discriminator_with_int_arms() {
        let layout = compute_union_layout(&UnionDecl::new(
            "Value",
            TypeTag::U8,
            vec![
                UnionArm::single("as_int", 0, TypeTag::I32),
                UnionArm::single("as_long", 1, TypeTag::I64),
            ],
        ))
        .expect("Layout should succeed");

        assert_eq!(layout.discriminator_size, 1);
        assert_eq!(layout.payload_offset, 8);
        assert_eq!(layout.max_arm_size, 8);
        assert_eq!(layout.total_size, 16);
        assert_eq!(layout.alignment(), 8);
    }

    #[test]
    fn test_payload_offset_covers_discriminator() {
        let layout = compute_union_layout(&UnionDecl::new(
            "Flags",
            TypeTag::U32,
            vec![UnionArm::single("as_byte", 0, TypeTag::U8)],
        ))
        .expect("Layout should succeed");

        assert!(layout.payload_offset >= layout.discriminator_size);
        assert_eq!(layout.payload_offset, 4);
        assert_eq!(layout.total_size, 8);
    }

    #[test]
    fn test_total_size_is_multiple_of_union_alignment() {
        let layout = compute_union_layout(&UnionDecl::new(
            "Mixed",
            TypeTag::U16,
            vec![
                UnionArm::single("a", 0, TypeTag::F64),
                UnionArm::single("b", 1, TypeTag::Array(Box::new(TypeTag::U8), 3)),
            ],
        ))
        .expect("Layout should succeed");

        assert_eq!(layout.total_size % layout.alignment(), 0);
        assert_eq!(layout.payload_offset, 8);
        assert_eq!(layout.total_size, 16);
    }

    #[test]
    fn test_missing_discriminator_is_an_error() {
        let decl = UnionDecl {
            name: "Broken".into(),
            discriminator: None,
            arms: vec![UnionArm::single("a", 0, TypeTag::I32)],
        };
        let err = compute_union_layout(&decl).unwrap_err();
        match err {
            LayoutError::MissingDiscriminator { type_name } => assert_eq!(type_name, "Broken"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_union_with_no_arms_is_an_error() {
        let decl = UnionDecl::new("Empty", TypeTag::U8, vec![]);
        let err = compute_union_layout(&decl).unwrap_err();
        assert!(matches!(err, LayoutError::EmptyUnion { .. }));
    }

    #[test]
    fn test_string_discriminator_is_rejected() {
        let decl = UnionDecl::new(
            "Bad",
            TypeTag::String,
            vec![UnionArm::single("a", 0, TypeTag::I32)],
        );
        let err = compute_union_layout(&decl).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidDiscriminator { .. }));
    }
}
