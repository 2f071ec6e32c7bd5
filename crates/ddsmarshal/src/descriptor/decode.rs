// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Ops bytecode decoding: walk an instruction stream back into field facts.
//!
//! Validation counterpart of [`super::emit`]: decoding our own output, or
//! an extracted reference artifact, must reconstruct the same field
//! offset and key mapping the source layout had.

use super::{
    flags, kof_count, opcode, subtype_code, type_code, DescriptorError, DescriptorResult,
    KeyDescriptor, OP_ADR, OP_DLC, OP_KOF, OP_RTS, TYPE_ARR, TYPE_BST, TYPE_ENU,
};

/// One decoded ADR group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedField {
    /// Index of the ADR word in the ops array.
    pub ops_index: usize,
    pub type_code: u8,
    pub subtype: u8,
    pub flags: u32,
    /// Native byte offset of the field.
    pub offset: u32,
    /// Bound word (bounded strings) or element count (arrays).
    pub extra: Option<u32>,
}

/// One reconstructed key: field name, native offset, key ordinal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedKey {
    pub name: String,
    pub field_offset: u32,
    pub index: u32,
}

/// Everything an ops array plus key table says about a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedDescriptor {
    pub has_dheader: bool,
    pub fields: Vec<DecodedField>,
    pub keys: Vec<DecodedKey>,
}

impl DecodedDescriptor {
    pub fn field_offset(&self, ops_index: usize) -> Option<u32> {
        self.fields
            .iter()
            .find(|f| f.ops_index == ops_index)
            .map(|f| f.offset)
    }
}

/// Extra words following an ADR word of the given primary type.
fn adr_extra_words(type_code: u8) -> usize {
    match type_code {
        TYPE_BST | TYPE_ENU | TYPE_ARR => 1,
        _ => 0,
    }
}

/// Walk an ops array and key table into a [`DecodedDescriptor`].
///
/// Malformed input (unknown opcode, truncated group, key pointing at a
/// non-ADR word) is a [`DescriptorError`]; nothing is guessed.
pub fn decode_ops(ops: &[u32], keys: &[KeyDescriptor]) -> DescriptorResult<DecodedDescriptor> {
    let mut fields = Vec::new();
    let mut index = 0;
    let mut has_dheader = false;
    let mut rts_seen = false;

    while index < ops.len() {
        let word = ops[index];
        match opcode(word) {
            OP_DLC if index == 0 => {
                has_dheader = true;
                index += 1;
            }
            OP_ADR if !rts_seen => {
                let primary = type_code(word);
                let extra_words = adr_extra_words(primary);
                if index + 1 + extra_words >= ops.len() {
                    return Err(DescriptorError::TruncatedOps {
                        index,
                        expected: format!("offset word plus {extra_words} extra word(s)"),
                    });
                }
                let mut sub_extra = 0;
                // A sequence/array of bounded strings carries the element
                // bound after the group.
                if subtype_code(word) == TYPE_BST {
                    sub_extra = 1;
                    if index + 1 + extra_words + sub_extra >= ops.len() {
                        return Err(DescriptorError::TruncatedOps {
                            index,
                            expected: "element bound word".into(),
                        });
                    }
                }
                fields.push(DecodedField {
                    ops_index: index,
                    type_code: primary,
                    subtype: subtype_code(word),
                    flags: flags(word),
                    offset: ops[index + 1],
                    extra: (extra_words > 0).then(|| ops[index + 2]),
                });
                index += 2 + extra_words + sub_extra;
            }
            OP_RTS if !rts_seen => {
                rts_seen = true;
                index += 1;
            }
            OP_KOF if rts_seen => {
                let count = kof_count(word) as usize;
                if index + count >= ops.len() {
                    return Err(DescriptorError::TruncatedOps {
                        index,
                        expected: format!("{count} KOF offset word(s)"),
                    });
                }
                index += 1 + count;
            }
            _ => {
                return Err(DescriptorError::UnknownOpcode { index, word });
            }
        }
    }

    if !rts_seen {
        return Err(DescriptorError::TruncatedOps {
            index: ops.len(),
            expected: "RTS terminator".into(),
        });
    }

    // Resolve the key table against the decoded fields.
    let mut decoded_keys = Vec::with_capacity(keys.len());
    for key in keys {
        let kof_index = key.ops_offset as usize;
        if kof_index + 1 >= ops.len() || opcode(ops[kof_index]) != OP_KOF {
            return Err(DescriptorError::KeyMismatch {
                name: key.name.clone(),
                detail: format!("ops[{kof_index}] is not a KOF instruction"),
            });
        }
        let adr_index = ops[kof_index + 1] as usize;
        let Some(field) = fields.iter().find(|f| f.ops_index == adr_index) else {
            return Err(DescriptorError::KeyMismatch {
                name: key.name.clone(),
                detail: format!("KOF target ops[{adr_index}] is not an ADR group"),
            });
        };
        if field.flags & super::FLAG_KEY == 0 {
            return Err(DescriptorError::KeyMismatch {
                name: key.name.clone(),
                detail: "target field lacks the KEY flag".into(),
            });
        }
        decoded_keys.push(DecodedKey {
            name: key.name.clone(),
            field_offset: field.offset,
            index: key.index,
        });
    }

    Ok(DecodedDescriptor {
        has_dheader,
        fields,
        keys: decoded_keys,
    })
}
