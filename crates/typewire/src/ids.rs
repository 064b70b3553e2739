// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Encoding-id resolution: static ids, the protocol id table, and one-time
//! runtime allocation.

use crate::schema::{SchemaError, StructuredTypeSchema};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// First id handed out by the runtime allocator, above the protocol's
/// statically assigned range.
pub const RUNTIME_ID_BASE: u32 = 0x7F00_0000;

/// How a schema obtains its binary encoding id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaId {
    /// Protocol-assigned id declared on the schema itself.
    Static(u32),
    /// Allocate a process-unique id on first compilation.
    RuntimeGenerated,
}

/// Read-only protocol table mapping `<TypeName>_Encoding_DefaultBinary` /
/// `_Xml` entries to numeric identifiers.
#[derive(Debug, Clone, Default)]
pub struct IdTable {
    entries: HashMap<String, u32>,
}

impl IdTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, id: u32) {
        self.entries.insert(key.into(), id);
    }

    pub fn lookup(&self, key: &str) -> Option<u32> {
        self.entries.get(key).copied()
    }

    pub fn binary_id(&self, type_name: &str) -> Option<u32> {
        self.lookup(&format!("{}_Encoding_DefaultBinary", type_name))
    }

    pub fn xml_id(&self, type_name: &str) -> Option<u32> {
        self.lookup(&format!("{}_Encoding_DefaultXml", type_name))
    }
}

impl FromIterator<(String, u32)> for IdTable {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Process-unique id source; compile-time only, never on the codec hot path.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self {
            next: AtomicU32::new(RUNTIME_ID_BASE),
        }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&self) -> u32 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Resolved encoding identifiers for one compiled type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingIds {
    pub binary: u32,
    pub xml: Option<u32>,
}

/// Resolve a schema's encoding ids: static declaration first, then the
/// protocol table, then one-time runtime allocation when requested.
pub fn assign_encoding_ids(
    schema: &StructuredTypeSchema,
    table: &IdTable,
    allocator: &IdAllocator,
) -> Result<EncodingIds, SchemaError> {
    match schema.id {
        Some(SchemaId::Static(binary)) => Ok(EncodingIds {
            binary,
            xml: table.xml_id(&schema.name),
        }),
        Some(SchemaId::RuntimeGenerated) => {
            let binary = allocator.allocate();
            log::debug!("allocated runtime binary id {} for {}", binary, schema.name);
            Ok(EncodingIds { binary, xml: None })
        }
        None => match table.binary_id(&schema.name) {
            Some(binary) => Ok(EncodingIds {
                binary,
                xml: table.xml_id(&schema.name),
            }),
            None => Err(SchemaError::MissingEncodingId {
                type_name: schema.name.clone(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_id_wins() {
        let schema = StructuredTypeSchema::new("Hello").with_id(668);
        let ids = assign_encoding_ids(&schema, &IdTable::new(), &IdAllocator::new()).unwrap();
        assert_eq!(ids.binary, 668);
        assert_eq!(ids.xml, None);
    }

    #[test]
    fn test_table_lookup() {
        let mut table = IdTable::new();
        table.insert("ReadRequest_Encoding_DefaultBinary", 631);
        table.insert("ReadRequest_Encoding_DefaultXml", 630);
        let schema = StructuredTypeSchema::new("ReadRequest");
        let ids = assign_encoding_ids(&schema, &table, &IdAllocator::new()).unwrap();
        assert_eq!(ids.binary, 631);
        assert_eq!(ids.xml, Some(630));
    }

    #[test]
    fn test_runtime_allocation_is_unique() {
        let allocator = IdAllocator::new();
        let table = IdTable::new();
        let a = assign_encoding_ids(
            &StructuredTypeSchema::new("A").runtime_id(),
            &table,
            &allocator,
        )
        .unwrap();
        let b = assign_encoding_ids(
            &StructuredTypeSchema::new("B").runtime_id(),
            &table,
            &allocator,
        )
        .unwrap();
        assert!(a.binary >= RUNTIME_ID_BASE);
        assert_ne!(a.binary, b.binary);
    }

    #[test]
    fn test_missing_binary_id_is_fatal() {
        let schema = StructuredTypeSchema::new("Orphan");
        assert!(matches!(
            assign_encoding_ids(&schema, &IdTable::new(), &IdAllocator::new()),
            Err(SchemaError::MissingEncodingId { .. })
        ));
    }
}
