// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Descriptor extraction from an independently generated C artifact.
//!
//! Validation tooling only: parses the `dds_topic_descriptor_t` pieces of
//! a generated C source (typename, nops/nkeys, the `_ops[]` initializer
//! with symbolic opcode constants and `offsetof` expressions, the key
//! table, the type info/map blobs) so the emitter's output can be
//! cross-checked against a reference. Production descriptors never come
//! from here.
//!
//! `offsetof(T, field)` is resolved symbolically: field offsets are
//! accumulated from the size/alignment each preceding ADR word implies,
//! and cached per field name so repeated references agree. Unknown
//! identifiers and expression forms are errors, never guessed at.

use std::path::Path;

use super::{DescriptorError, DescriptorResult, KeyDescriptor};

/// Everything extracted from a generated descriptor source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorData {
    pub type_name: String,
    pub nops: u32,
    pub nkeys: u32,
    pub ops: Vec<u32>,
    pub keys: Vec<KeyDescriptor>,
    pub type_info: Vec<u8>,
    pub type_map: Vec<u8>,
}

/// Parse a descriptor artifact from disk.
pub fn extract_from_file(path: &Path) -> DescriptorResult<DescriptorData> {
    let content = std::fs::read_to_string(path).map_err(|e| DescriptorError::Io {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;
    extract_from_c_source(&content)
}

/// Parse a descriptor artifact from source text.
pub fn extract_from_c_source(content: &str) -> DescriptorResult<DescriptorData> {
    let clean = strip_comments(content);

    let type_name = quoted_after(&clean, ".m_typename").ok_or_else(|| {
        DescriptorError::MissingElement {
            what: ".m_typename".into(),
        }
    })?;
    let file_nops = uint_after(&clean, ".m_nops").unwrap_or(0);
    let nkeys = uint_after(&clean, ".m_nkeys").unwrap_or(0);

    let ops_body = initializer_body(&clean, "_ops").ok_or_else(|| {
        DescriptorError::MissingElement {
            what: "_ops[] initializer".into(),
        }
    })?;
    let ops = parse_ops_body(ops_body)?;
    if file_nops != 0 && file_nops as usize != ops.len() {
        log::warn!(
            "[DESCRIPTOR] {}: .m_nops {} disagrees with {} parsed ops",
            type_name,
            file_nops,
            ops.len()
        );
    }

    let keys = if nkeys > 0 {
        let body = initializer_body(&clean, "dds_key_descriptor_t").ok_or_else(|| {
            DescriptorError::MissingElement {
                what: "dds_key_descriptor_t table".into(),
            }
        })?;
        parse_key_table(body)?
    } else {
        Vec::new()
    };
    if keys.len() != nkeys as usize {
        return Err(DescriptorError::MissingElement {
            what: format!(".m_nkeys says {} keys, table has {}", nkeys, keys.len()),
        });
    }

    let type_info = define_blob(&clean, "TYPE_INFO_CDR").unwrap_or_default();
    let type_map = define_blob(&clean, "TYPE_MAP_CDR").unwrap_or_default();

    Ok(DescriptorData {
        type_name,
        nops: ops.len() as u32,
        nkeys,
        ops,
        keys,
        type_info,
        type_map,
    })
}

/// Drop `/* */` and `//` comments. String literals in these artifacts
/// never contain comment markers, so no literal tracking is needed.
fn strip_comments(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let bytes = content.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'*' {
            i += 2;
            while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                i += 1;
            }
            i = (i + 2).min(bytes.len());
        } else if bytes[i] == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
        } else {
            out.push(bytes[i] as char);
            i += 1;
        }
    }
    out
}

/// The quoted string following `marker ... = "..."`.
fn quoted_after(content: &str, marker: &str) -> Option<String> {
    let at = content.find(marker)? + marker.len();
    let rest = &content[at..];
    let open = rest.find('"')?;
    let rest = &rest[open + 1..];
    let close = rest.find('"')?;
    Some(rest[..close].to_string())
}

/// The unsigned integer following `marker = N` (optional `u` suffix).
fn uint_after(content: &str, marker: &str) -> Option<u32> {
    let at = content.find(marker)? + marker.len();
    let rest = content[at..].trim_start();
    let rest = rest.strip_prefix('=')?.trim_start();
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// The `{ ... }` initializer body following the first occurrence of
/// `marker`, with nested braces balanced.
fn initializer_body<'a>(content: &'a str, marker: &str) -> Option<&'a str> {
    let at = content.find(marker)? + marker.len();
    let rest = &content[at..];
    let eq = rest.find('=')?;
    let rest = &rest[eq..];
    let open = rest.find('{')?;
    let mut depth = 0usize;
    for (i, c) in rest[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&rest[open + 1..open + i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split an initializer body on commas outside parentheses.
fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Native size/alignment implied by an instruction word, used to advance
/// the symbolic `offsetof` cursor. Mirrors the C compiler's rules the
/// layout calculators implement.
fn analyze_word(word: u32, pending_align: &mut u32, pending_size: &mut u32) {
    let type_code = (word >> 16) & 0xff;
    let subtype = (word >> 8) & 0xff;
    match type_code {
        0x01 | 0x0e => {
            *pending_size = 1;
            *pending_align = 1;
        }
        0x02 => {
            *pending_size = 2;
            *pending_align = 2;
        }
        0x03 | 0x0c | 0x0f => {
            *pending_size = 4;
            *pending_align = 4;
        }
        0x04 => {
            *pending_size = 8;
            *pending_align = 8;
        }
        0x05 | 0x07 | 0x0d => {
            *pending_size = 8;
            *pending_align = 8;
        }
        0x08 => {
            // Array: element alignment; the size comes from the count word
            // which offsetof resolution does not consume here.
            *pending_align = match subtype {
                0x01 | 0x0e => 1,
                0x02 => 2,
                0x03 | 0x0c => 4,
                0x04 | 0x05 | 0x07 => 8,
                _ => 1,
            };
            *pending_size = 0;
        }
        _ => {
            *pending_size = 0;
            *pending_align = 1;
        }
    }
}

fn parse_ops_body(body: &str) -> DescriptorResult<Vec<u32>> {
    let mut ops = Vec::new();
    let mut current_offset = 0u32;
    let mut field_offsets: Vec<(String, u32)> = Vec::new();
    let mut pending_align = 1u32;
    let mut pending_size = 0u32;

    for part in split_top_level(body) {
        if let Some(field) = offsetof_field(part) {
            if let Some((_, cached)) = field_offsets.iter().find(|(name, _)| name == &field) {
                ops.push(*cached);
            } else {
                if pending_align > 1 {
                    let mask = pending_align - 1;
                    current_offset = (current_offset + mask) & !mask;
                }
                field_offsets.push((field, current_offset));
                ops.push(current_offset);
                current_offset += pending_size;
                pending_align = 1;
                pending_size = 0;
            }
            continue;
        }

        let word = evaluate_expression(part)?;
        ops.push(word);
        analyze_word(word, &mut pending_align, &mut pending_size);
    }

    Ok(ops)
}

/// The field name inside `offsetof(Type, field)`, if `text` is one.
fn offsetof_field(text: &str) -> Option<String> {
    let at = text.find("offsetof")?;
    let rest = &text[at + "offsetof".len()..];
    let open = rest.find('(')?;
    let close = rest.find(')')?;
    let inner = &rest[open + 1..close];
    let (_, field) = inner.split_once(',')?;
    Some(field.trim().to_string())
}

/// Evaluate a constant expression: `+`-separated terms of `|`-combined
/// atoms, atoms being known identifiers, decimal/hex literals, or a
/// `value << shift` pair.
fn evaluate_expression(text: &str) -> DescriptorResult<u32> {
    let stripped = text
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .trim();
    if stripped.is_empty() {
        return Err(DescriptorError::MalformedExpression {
            text: text.to_string(),
        });
    }
    if stripped.contains("sizeof") {
        return Err(DescriptorError::MalformedExpression {
            text: stripped.to_string(),
        });
    }

    let mut sum = 0u32;
    for term in stripped.split('+') {
        let term = term.trim();
        if let Some((value, shift)) = term.split_once("<<") {
            let value = resolve_atom(value.trim())?;
            let shift = resolve_atom(shift.trim())?;
            sum = sum.wrapping_add(value << shift);
        } else {
            let mut ored = 0u32;
            for atom in term.split('|') {
                ored |= resolve_atom(atom.trim())?;
            }
            sum = sum.wrapping_add(ored);
        }
    }
    Ok(sum)
}

fn resolve_atom(atom: &str) -> DescriptorResult<u32> {
    if let Some(value) = op_constant(atom) {
        return Ok(value);
    }
    let numeric = atom.trim_end_matches(['u', 'U']);
    if let Some(hex) = numeric.strip_prefix("0x").or_else(|| numeric.strip_prefix("0X")) {
        return u32::from_str_radix(hex, 16).map_err(|_| DescriptorError::MalformedExpression {
            text: atom.to_string(),
        });
    }
    if numeric.chars().all(|c| c.is_ascii_digit()) && !numeric.is_empty() {
        return numeric
            .parse()
            .map_err(|_| DescriptorError::MalformedExpression {
                text: atom.to_string(),
            });
    }
    Err(DescriptorError::UnknownIdentifier {
        name: atom.to_string(),
    })
}

/// Symbolic constant table of the generated artifacts.
fn op_constant(name: &str) -> Option<u32> {
    let value = match name {
        "DDS_OP_RTS" => 0x00 << 24,
        "DDS_OP_ADR" => 0x01 << 24,
        "DDS_OP_JSR" => 0x02 << 24,
        "DDS_OP_JEQ" => 0x03 << 24,
        "DDS_OP_DLC" => 0x04 << 24,
        "DDS_OP_PLC" => 0x05 << 24,
        "DDS_OP_PLM" => 0x06 << 24,
        "DDS_OP_KOF" => 0x07 << 24,

        "DDS_OP_FLAG_KEY" => super::FLAG_KEY,
        "DDS_OP_FLAG_DEF" => super::FLAG_DEF,
        "DDS_OP_FLAG_SGN" => super::FLAG_SGN,
        "DDS_OP_FLAG_FP" => super::FLAG_FP,
        "DDS_OP_FLAG_BASE" => super::FLAG_BASE,
        "DDS_OP_FLAG_OPT" => super::FLAG_OPT,

        _ => {
            if let Some(code) = name.strip_prefix("DDS_OP_TYPE_") {
                return val_code(code).map(|v| u32::from(v) << 16);
            }
            if let Some(code) = name.strip_prefix("DDS_OP_SUBTYPE_") {
                return val_code(code).map(|v| u32::from(v) << 8);
            }
            if let Some(code) = name.strip_prefix("DDS_OP_VAL_") {
                return val_code(code).map(u32::from);
            }
            return None;
        }
    };
    Some(value)
}

fn val_code(suffix: &str) -> Option<u8> {
    let code = match suffix {
        "1BY" => super::TYPE_1BY,
        "2BY" => super::TYPE_2BY,
        "4BY" => super::TYPE_4BY,
        "8BY" => super::TYPE_8BY,
        "STR" => super::TYPE_STR,
        "BST" => super::TYPE_BST,
        "SEQ" => super::TYPE_SEQ,
        "ARR" => super::TYPE_ARR,
        "UNI" => super::TYPE_UNI,
        "STU" => super::TYPE_STU,
        "BSQ" => super::TYPE_BSQ,
        "ENU" => super::TYPE_ENU,
        "EXT" => super::TYPE_EXT,
        "BLN" => super::TYPE_BLN,
        _ => return None,
    };
    Some(code)
}

/// Parse `{ "name", offset, index }` triples out of a key-table body.
fn parse_key_table(body: &str) -> DescriptorResult<Vec<KeyDescriptor>> {
    let mut keys = Vec::new();
    let mut rest = body;
    while let Some(open) = rest.find('{') {
        let close = rest[open..]
            .find('}')
            .ok_or_else(|| DescriptorError::MissingElement {
                what: "closing brace in key table".into(),
            })?;
        let entry = &rest[open + 1..open + close];
        rest = &rest[open + close + 1..];

        let fields: Vec<&str> = entry.split(',').map(str::trim).collect();
        if fields.len() != 3 {
            return Err(DescriptorError::MissingElement {
                what: format!("three key-entry fields, got '{entry}'"),
            });
        }
        let name = fields[0].trim_matches('"').to_string();
        if name.is_empty() || !fields[0].starts_with('"') {
            return Err(DescriptorError::MissingElement {
                what: format!("quoted key name in '{entry}'"),
            });
        }
        let ops_offset = resolve_atom(fields[1])?;
        let index = resolve_atom(fields[2])?;
        keys.push(KeyDescriptor {
            name,
            ops_offset,
            index,
        });
    }
    Ok(keys)
}

/// Parse the `0x..` bytes of a `#define NAME_... (unsigned char []){ ... }`
/// blob, tolerating line continuations.
fn define_blob(content: &str, prefix: &str) -> Option<Vec<u8>> {
    let define = format!("#define {prefix}");
    let at = content.find(&define)?;
    let rest = &content[at..];
    let open = rest.find('{')?;
    let close = rest[open..].find('}')?;
    let body = rest[open + 1..open + close].replace('\\', " ");

    let mut bytes = Vec::new();
    for token in body.split([',', '\n', '\r', ' ', '\t']) {
        let token = token.trim();
        if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
            if let Ok(byte) = u8::from_str_radix(hex, 16) {
                bytes.push(byte);
            }
        }
    }
    Some(bytes)
}
