// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Explicit type-support registry.
//!
//! The host application constructs one of these at initialization and
//! passes it wherever type registration happens. There is no process-wide
//! static; two independent registries never observe each other.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::descriptor::TopicDescriptor;
use crate::schema::SchemaFingerprint;

/// Registration conflict.
#[derive(Debug, Clone)]
pub enum RegistryError {
    /// Same type name, different schema fingerprint.
    Conflict {
        type_name: String,
        existing: SchemaFingerprint,
        offered: SchemaFingerprint,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Conflict {
                type_name,
                existing,
                offered,
            } => {
                write!(
                    f,
                    "type '{}' already registered with fingerprint {} (offered {})",
                    type_name, existing, offered
                )
            }
        }
    }
}

impl std::error::Error for RegistryError {}

pub type RegistryResult<T> = core::result::Result<T, RegistryError>;

/// Name -> descriptor map shared by the host's readers and writers.
///
/// The one thread-safe piece of this crate: hosts register from wherever
/// they create endpoints.
#[derive(Debug, Default)]
pub struct TypeSupportRegistry {
    types: RwLock<HashMap<String, Arc<TopicDescriptor>>>,
}

impl TypeSupportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor under its type name.
    ///
    /// Re-registering an identical schema is idempotent and returns the
    /// already-stored descriptor. A different fingerprint under the same
    /// name is a conflict.
    pub fn register(
        &self,
        descriptor: TopicDescriptor,
    ) -> RegistryResult<Arc<TopicDescriptor>> {
        let mut types = self.types.write();
        if let Some(existing) = types.get(&descriptor.type_name) {
            if existing.fingerprint == descriptor.fingerprint {
                return Ok(Arc::clone(existing));
            }
            return Err(RegistryError::Conflict {
                type_name: descriptor.type_name.clone(),
                existing: existing.fingerprint,
                offered: descriptor.fingerprint,
            });
        }

        log::debug!(
            "[REGISTRY] registered '{}' ({} ops, {} keys)",
            descriptor.type_name,
            descriptor.nops(),
            descriptor.nkeys()
        );
        let stored = Arc::new(descriptor);
        types.insert(stored.type_name.clone(), Arc::clone(&stored));
        Ok(stored)
    }

    pub fn lookup(&self, type_name: &str) -> Option<Arc<TopicDescriptor>> {
        self.types.read().get(type_name).cloned()
    }

    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }

    /// Registered type names, unordered.
    pub fn names(&self) -> Vec<String> {
        self.types.read().keys().cloned().collect()
    }
}
