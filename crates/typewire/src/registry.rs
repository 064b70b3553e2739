// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-wide registry of compiled type definitions.
//!
//! Definitions compile lazily on first reference and publish write-once per
//! name; after the schema-load phase the registry is effectively read-only
//! and encode/decode never take the compile lock.

use crate::codec::{self, EncodeError};
use crate::compiler;
use crate::ids::{IdAllocator, IdTable, SchemaId};
use crate::object::{self, ObjectInstance};
use crate::schema::{SchemaError, SchemaRegistry};
use crate::stream::{BinaryStream, DecodeError};
use crate::typedef::TypeDefinition;
use crate::value::ValueMap;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// Name under which the inheritance root is published.
pub const BASE_OBJECT: &str = "BaseObject";

/// Write-once store of compiled definitions with by-name and by-id lookup.
#[derive(Debug)]
pub struct TypeRegistry {
    schemas: SchemaRegistry,
    id_table: IdTable,
    allocator: IdAllocator,
    compiled: DashMap<String, Arc<TypeDefinition>>,
    by_id: DashMap<u32, Arc<TypeDefinition>>,
    compile_lock: Mutex<()>,
    root: Arc<TypeDefinition>,
}

impl TypeRegistry {
    /// Build a registry over loaded schemas and the protocol id table.
    ///
    /// The root object definition is pre-published.
    pub fn new(schemas: SchemaRegistry, id_table: IdTable) -> Self {
        let root = Arc::new(TypeDefinition::root(BASE_OBJECT));
        let registry = Self {
            schemas,
            id_table,
            allocator: IdAllocator::new(),
            compiled: DashMap::new(),
            by_id: DashMap::new(),
            compile_lock: Mutex::new(()),
            root: root.clone(),
        };
        registry.compiled.insert(root.name.clone(), root.clone());
        registry.by_id.insert(root.binary_id, root);
        registry
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    pub(crate) fn id_table(&self) -> &IdTable {
        &self.id_table
    }

    pub(crate) fn allocator(&self) -> &IdAllocator {
        &self.allocator
    }

    /// The inheritance root definition.
    pub fn base_object(&self) -> Arc<TypeDefinition> {
        self.root.clone()
    }

    /// Look up an already compiled definition.
    pub fn get(&self, name: &str) -> Option<Arc<TypeDefinition>> {
        self.compiled.get(name).map(|d| d.value().clone())
    }

    /// Look up an already compiled definition by binary encoding id.
    pub fn get_by_id(&self, id: u32) -> Option<Arc<TypeDefinition>> {
        self.by_id.get(&id).map(|d| d.value().clone())
    }

    /// Get a definition, compiling it (and its base chain) on first use.
    pub fn get_or_compile(&self, name: &str) -> Result<Arc<TypeDefinition>, SchemaError> {
        if let Some(def) = self.get(name) {
            return Ok(def);
        }
        let _guard = self.compile_lock.lock();
        self.compile_stacked(name, &mut Vec::new())
    }

    /// Compile under the held lock; `stack` detects base-chain cycles.
    pub(crate) fn compile_stacked(
        &self,
        name: &str,
        stack: &mut Vec<String>,
    ) -> Result<Arc<TypeDefinition>, SchemaError> {
        if let Some(def) = self.get(name) {
            return Ok(def);
        }
        if stack.iter().any(|n| n == name) {
            return Err(SchemaError::RecursiveBase {
                type_name: name.to_string(),
            });
        }
        let schema = self
            .schemas
            .schema(name)
            .ok_or_else(|| SchemaError::UnknownType {
                name: name.to_string(),
            })?;
        stack.push(name.to_string());
        let compiled = compiler::compile(self, &schema, stack);
        stack.pop();
        self.publish(Arc::new(compiled?))
    }

    /// Publish a definition; shadowing an existing name is an error.
    fn publish(&self, def: Arc<TypeDefinition>) -> Result<Arc<TypeDefinition>, SchemaError> {
        if self.compiled.contains_key(&def.name) {
            return Err(SchemaError::DuplicateType {
                name: def.name.clone(),
            });
        }
        self.compiled.insert(def.name.clone(), def.clone());
        self.by_id.insert(def.binary_id, def.clone());
        Ok(def)
    }

    /// Construct an instance from an options mapping.
    pub fn construct(&self, type_name: &str, options: ValueMap) -> crate::Result<ObjectInstance> {
        let def = self.get_or_compile(type_name)?;
        object::construct(self, &def, options)
    }

    /// Fast-path construction, for callers about to decode over the result.
    pub fn construct_fast(&self, type_name: &str) -> Result<ObjectInstance, SchemaError> {
        Ok(object::fast_construct(&self.get_or_compile(type_name)?))
    }

    /// Encode an instance onto a stream.
    pub fn encode(
        &self,
        instance: &ObjectInstance,
        stream: &mut BinaryStream,
    ) -> Result<(), EncodeError> {
        codec::encode(self, instance, stream)
    }

    /// Decode an instance of a named type from a stream.
    pub fn decode(
        &self,
        type_name: &str,
        stream: &mut BinaryStream,
    ) -> crate::Result<ObjectInstance> {
        let def = self.get_or_compile(type_name)?;
        Ok(codec::decode(self, &def, stream)?)
    }

    /// Decode with per-field diagnostics on the debug log.
    pub fn decode_debug(
        &self,
        type_name: &str,
        stream: &mut BinaryStream,
    ) -> crate::Result<ObjectInstance> {
        let def = self.get_or_compile(type_name)?;
        Ok(codec::decode_debug(self, &def, stream)?)
    }

    /// Decode dispatching on a binary encoding id, for callers that only
    /// know the id from the wire.
    pub fn decode_by_id(
        &self,
        id: u32,
        stream: &mut BinaryStream,
    ) -> crate::Result<ObjectInstance> {
        let def = match self.get_by_id(id) {
            Some(def) => def,
            None => self
                .find_and_compile_by_id(id)?
                .ok_or(DecodeError::UnknownTypeId(id))?,
        };
        Ok(codec::decode(self, &def, stream)?)
    }

    /// Statically assigned ids are decodable before their type's first
    /// by-name reference; scan the schema store and compile on a hit.
    fn find_and_compile_by_id(&self, id: u32) -> Result<Option<Arc<TypeDefinition>>, SchemaError> {
        for name in self.schemas.schema_names() {
            let Some(schema) = self.schemas.schema(&name) else {
                continue;
            };
            let matches = match schema.id {
                Some(SchemaId::Static(static_id)) => static_id == id,
                Some(SchemaId::RuntimeGenerated) => false,
                None => self.id_table.binary_id(&name) == Some(id),
            };
            if matches {
                return self.get_or_compile(&name).map(Some);
            }
        }
        Ok(None)
    }

    /// Flattened field names of a type, base fields first.
    pub fn possible_fields(&self, type_name: &str) -> Result<Vec<String>, SchemaError> {
        Ok(self.get_or_compile(type_name)?.possible_fields.clone())
    }
}
