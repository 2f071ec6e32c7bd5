// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! C-compatible struct layout computation.

use crate::layout::{align_up, padding_for, FieldLayout, LayoutError, LayoutResult, StructLayout};
use crate::schema::StructDecl;

/// Compute the native layout of a struct declaration.
///
/// Walks fields in declaration order, inserting padding so every field sits
/// at an offset aligned for its type, then pads the total size to a multiple
/// of the struct's own (maximum observed) alignment.
pub fn compute_struct_layout(decl: &StructDecl) -> LayoutResult<StructLayout> {
    let mut fields = Vec::with_capacity(decl.fields.len());
    let mut offset = 0usize;
    let mut max_alignment = 1usize;

    for field in &decl.fields {
        let alignment = field.tag.native_alignment();
        let size = field
            .tag
            .native_size()
            .ok_or_else(|| LayoutError::ZeroLengthArray {
                type_name: decl.name.clone(),
                field: field.name.clone(),
            })?;

        let padding_before = padding_for(offset, alignment);
        let field_offset = offset + padding_before;

        fields.push(FieldLayout {
            name: field.name.clone(),
            tag: field.tag.clone(),
            offset: field_offset,
            size,
            alignment,
            padding_before,
        });

        offset = field_offset + size;
        max_alignment = max_alignment.max(alignment);
    }

    let trailing_padding = padding_for(offset, max_alignment);
    let total_size = offset + trailing_padding;
    debug_assert_eq!(total_size, align_up(offset, max_alignment));

    log::trace!(
        "[LAYOUT] {}: {} fields, size {} (align {}, trailing {})",
        decl.name,
        fields.len(),
        total_size,
        max_alignment,
        trailing_padding
    );

    Ok(StructLayout {
        fields,
        total_size,
        max_alignment,
        trailing_padding,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDecl, StructDecl, TypeTag};

    fn decl_of(fields: Vec<(&str, TypeTag)>) -> StructDecl {
        StructDecl::new(
            "T",
            fields
                .into_iter()
                .map(|(name, tag)| FieldDecl::new(name, tag))
                .collect(),
        )
    }

    #[test]
    fn test_i32_i64_u8_layout() {
        let layout = compute_struct_layout(&decl_of(vec![
            ("a", TypeTag::I32),
            ("b", TypeTag::I64),
            ("c", TypeTag::U8),
        ]))
        .expect("Layout should succeed");

        let offsets: Vec<_> = layout.fields.iter().map(|f| f.offset).collect();
        assert_eq!(offsets, vec![0, 8, 16]);
        assert_eq!(layout.fields[1].padding_before, 4);
        assert_eq!(layout.max_alignment, 8);
        assert_eq!(layout.trailing_padding, 7);
        assert_eq!(layout.total_size, 24);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let decl = decl_of(vec![
            ("x", TypeTag::U16),
            ("y", TypeTag::F64),
            ("z", TypeTag::Bool),
        ]);
        let first = compute_struct_layout(&decl).expect("Layout should succeed");
        let second = compute_struct_layout(&decl).expect("Layout should succeed");
        assert_eq!(first, second);
    }

    #[test]
    fn test_total_size_is_multiple_of_alignment() {
        let cases = vec![
            vec![("a", TypeTag::U8)],
            vec![("a", TypeTag::U8), ("b", TypeTag::U16)],
            vec![("a", TypeTag::F64), ("b", TypeTag::U8)],
            vec![("a", TypeTag::String), ("b", TypeTag::U32)],
        ];
        for fields in cases {
            let layout = compute_struct_layout(&decl_of(fields)).expect("Layout should succeed");
            assert_eq!(layout.total_size % layout.max_alignment, 0);
        }
    }

    #[test]
    fn test_pointer_fields_take_eight_bytes() {
        let layout = compute_struct_layout(&decl_of(vec![
            ("id", TypeTag::I32),
            ("name", TypeTag::String),
            ("samples", TypeTag::Sequence(Box::new(TypeTag::F64))),
        ]))
        .expect("Layout should succeed");

        assert_eq!(layout.offset_of("id"), Some(0));
        assert_eq!(layout.offset_of("name"), Some(8));
        assert_eq!(layout.offset_of("samples"), Some(16));
        assert_eq!(layout.total_size, 24);
    }

    #[test]
    fn test_bounded_string_is_inline() {
        let layout = compute_struct_layout(&decl_of(vec![
            ("tag", TypeTag::BoundedString(15)),
            ("value", TypeTag::U32),
        ]))
        .expect("Layout should succeed");

        // 16 inline chars, then value at the next 4-byte boundary.
        assert_eq!(layout.offset_of("value"), Some(16));
        assert_eq!(layout.total_size, 20);
    }

    #[test]
    fn test_array_field_repeats_elements() {
        let layout = compute_struct_layout(&decl_of(vec![
            ("flag", TypeTag::Bool),
            ("mac", TypeTag::Array(Box::new(TypeTag::U8), 6)),
            ("rate", TypeTag::F32),
        ]))
        .expect("Layout should succeed");

        assert_eq!(layout.offset_of("mac"), Some(1));
        assert_eq!(layout.offset_of("rate"), Some(8));
        assert_eq!(layout.total_size, 12);
    }

    #[test]
    fn test_zero_length_array_is_rejected() {
        let err = compute_struct_layout(&decl_of(vec![(
            "bad",
            TypeTag::Array(Box::new(TypeTag::U8), 0),
        )]))
        .unwrap_err();
        match err {
            LayoutError::ZeroLengthArray { field, .. } => assert_eq!(field, "bad"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_empty_struct_is_zero_sized() {
        let layout = compute_struct_layout(&decl_of(vec![])).expect("Layout should succeed");
        assert_eq!(layout.total_size, 0);
        assert_eq!(layout.max_alignment, 1);
    }
}
