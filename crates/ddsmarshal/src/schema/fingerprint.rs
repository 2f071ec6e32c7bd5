// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema fingerprints for evolution checking.
//!
//! A fingerprint is the MD5 of the canonical member string
//! `"{index}:{name}:{type};"*`, truncated to 14 bytes (the same truncated-MD5
//! shape XTypes uses for type identity). Two declarations with the same
//! fingerprint have the same member order, names and types.

use std::fmt;

use md5::{Digest, Md5};

use crate::schema::StructDecl;

/// 14-byte truncated MD5 over a struct declaration's canonical members.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaFingerprint([u8; 14]);

impl SchemaFingerprint {
    pub const fn from_bytes(bytes: [u8; 14]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 14] {
        &self.0
    }

    pub const fn zero() -> Self {
        Self([0u8; 14])
    }

    /// Compute the fingerprint of a declaration.
    pub fn compute(decl: &StructDecl) -> Self {
        let mut canonical = String::new();
        for (index, field) in decl.fields.iter().enumerate() {
            use fmt::Write;
            // Infallible for String.
            let _ = write!(
                canonical,
                "{}:{}:{};",
                index,
                field.name,
                field.tag.canonical_name()
            );
        }

        let mut hasher = Md5::new();
        hasher.update(canonical.as_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 14];
        bytes.copy_from_slice(&digest[..14]);
        Self(bytes)
    }
}

impl fmt::Debug for SchemaFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchemaFingerprint(")?;
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for SchemaFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl From<[u8; 14]> for SchemaFingerprint {
    fn from(bytes: [u8; 14]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl AsRef<[u8]> for SchemaFingerprint {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// One classified difference between two revisions of a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvolutionChange {
    /// Breaking: readers of the old revision misinterpret the new wire form.
    Breaking(String),
    /// Safe under appendable extensibility: members appended at the end.
    AppendedMembers(usize),
}

impl EvolutionChange {
    pub fn is_breaking(&self) -> bool {
        matches!(self, Self::Breaking(_))
    }
}

/// Compare two revisions of the same type for schema evolution.
///
/// Removing, renaming, reordering or retyping a member is breaking.
/// Appending members at the end is compatible for appendable types and is
/// reported as informational.
pub fn compare_for_evolution(old: &StructDecl, new: &StructDecl) -> Vec<EvolutionChange> {
    let mut changes = Vec::new();

    if old.name != new.name {
        changes.push(EvolutionChange::Breaking(format!(
            "type name changed from '{}' to '{}'",
            old.name, new.name
        )));
        return changes;
    }

    for (index, old_field) in old.fields.iter().enumerate() {
        let Some(new_field) = new.fields.get(index) else {
            changes.push(EvolutionChange::Breaking(format!(
                "member '{}' at index {} was removed",
                old_field.name, index
            )));
            continue;
        };

        if old_field.name != new_field.name {
            changes.push(EvolutionChange::Breaking(format!(
                "member at index {} renamed from '{}' to '{}' or reordered",
                index, old_field.name, new_field.name
            )));
        }

        if old_field.tag != new_field.tag {
            changes.push(EvolutionChange::Breaking(format!(
                "member '{}' type changed from '{}' to '{}'",
                old_field.name,
                old_field.tag.canonical_name(),
                new_field.tag.canonical_name()
            )));
        }
    }

    if new.fields.len() > old.fields.len() {
        let added = new.fields.len() - old.fields.len();
        log::debug!(
            "[SCHEMA] {}: {} member(s) appended (appendable-safe)",
            new.name,
            added
        );
        changes.push(EvolutionChange::AppendedMembers(added));
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDecl, TypeTag};

    fn sample() -> StructDecl {
        StructDecl::new(
            "Telemetry",
            vec![
                FieldDecl::new("id", TypeTag::I32).key(),
                FieldDecl::new("label", TypeTag::String),
            ],
        )
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = SchemaFingerprint::compute(&sample());
        let b = SchemaFingerprint::compute(&sample());
        assert_eq!(a, b);
        assert_ne!(a, SchemaFingerprint::zero());
    }

    #[test]
    fn test_fingerprint_changes_with_member_order() {
        let reordered = StructDecl::new(
            "Telemetry",
            vec![
                FieldDecl::new("label", TypeTag::String),
                FieldDecl::new("id", TypeTag::I32).key(),
            ],
        );
        assert_ne!(
            SchemaFingerprint::compute(&sample()),
            SchemaFingerprint::compute(&reordered)
        );
    }

    #[test]
    fn test_fingerprint_display_is_hex() {
        let text = SchemaFingerprint::zero().to_string();
        assert_eq!(text, "0000000000000000000000000000");
        assert_eq!(text.len(), 28);
    }

    #[test]
    fn test_appended_member_is_not_breaking() {
        let mut new = sample();
        new.fields.push(FieldDecl::new("unit", TypeTag::String));

        let changes = compare_for_evolution(&sample(), &new);
        assert_eq!(changes, vec![EvolutionChange::AppendedMembers(1)]);
        assert!(!changes[0].is_breaking());
    }

    #[test]
    fn test_removed_member_is_breaking() {
        let mut new = sample();
        new.fields.pop();

        let changes = compare_for_evolution(&sample(), &new);
        assert_eq!(changes.len(), 1);
        assert!(changes[0].is_breaking());
    }

    #[test]
    fn test_retyped_member_is_breaking() {
        let mut new = sample();
        new.fields[0].tag = TypeTag::I64;

        let changes = compare_for_evolution(&sample(), &new);
        assert!(changes.iter().any(EvolutionChange::is_breaking));
    }

    #[test]
    fn test_renamed_type_short_circuits() {
        let mut new = sample();
        new.name = "Telemetry2".into();

        let changes = compare_for_evolution(&sample(), &new);
        assert_eq!(changes.len(), 1);
        assert!(changes[0].is_breaking());
    }
}
