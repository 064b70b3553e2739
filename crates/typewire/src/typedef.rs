// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Compiled type definitions.
//!
//! A `TypeDefinition` is the executable form of a schema: its fields are
//! partitioned into closed plan variants so encode/decode dispatch
//! exhaustively without re-inspecting the descriptor, and the base chain is
//! an explicit linked list of compiled definitions.

use crate::basic_types::BasicType;
use crate::enumeration::EnumDescriptor;
use crate::registry::TypeRegistry;
use crate::schema::{
    ConstructHookFn, DecodeFieldFn, DecodeHookFn, DefaultValue, EncodeHookFn, IsValidFn,
    SchemaError,
};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// By-name binding to another compiled type, resolved on first use.
///
/// Binding is established at compile time; the target compiles lazily, which
/// is what lets forward, mutual and self references work.
pub struct TypeLink {
    name: String,
    target: OnceLock<Arc<TypeDefinition>>,
}

impl TypeLink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve the target definition, compiling it on first use.
    pub fn resolve(&self, registry: &TypeRegistry) -> Result<Arc<TypeDefinition>, SchemaError> {
        if let Some(def) = self.target.get() {
            return Ok(def.clone());
        }
        let def = registry.get_or_compile(&self.name)?;
        Ok(self.target.get_or_init(|| def).clone())
    }
}

impl fmt::Debug for TypeLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeLink").field(&self.name).finish()
    }
}

/// What one field element is at runtime.
pub enum ElementPlan {
    Basic(BasicType),
    Enumeration(Arc<EnumDescriptor>),
    Complex(TypeLink),
}

impl fmt::Debug for ElementPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic(b) => f.debug_tuple("Basic").field(b).finish(),
            Self::Enumeration(e) => f.debug_tuple("Enumeration").field(&e.name).finish(),
            Self::Complex(link) => f.debug_tuple("Complex").field(&link.name()).finish(),
        }
    }
}

/// Scalar or ordered-sequence shape of a field, fixed at compile time.
#[derive(Debug)]
pub enum FieldPlan {
    Scalar(ElementPlan),
    Array(ElementPlan),
}

impl FieldPlan {
    pub fn element(&self) -> &ElementPlan {
        match self {
            Self::Scalar(e) | Self::Array(e) => e,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }
}

/// One compiled field.
pub struct CompiledField {
    pub name: String,
    pub plan: FieldPlan,
    pub default: Option<DefaultValue>,
    pub decode: Option<DecodeFieldFn>,
}

impl fmt::Debug for CompiledField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledField")
            .field("name", &self.name)
            .field("plan", &self.plan)
            .finish_non_exhaustive()
    }
}

/// Compiled, executable form of a schema.
pub struct TypeDefinition {
    pub name: String,
    pub base: Option<Arc<TypeDefinition>>,
    pub own_fields: Vec<CompiledField>,
    /// Base field names followed by own field names, declaration order.
    pub possible_fields: Vec<String>,
    pub binary_id: u32,
    pub xml_id: Option<u32>,
    pub(crate) construct_hook: Option<ConstructHookFn>,
    pub(crate) encode_hook: Option<EncodeHookFn>,
    pub(crate) decode_hook: Option<DecodeHookFn>,
    pub(crate) decode_debug_hook: Option<DecodeHookFn>,
    pub(crate) is_valid_hook: Option<IsValidFn>,
}

impl TypeDefinition {
    /// The inheritance root: no fields, identity encode/decode.
    pub(crate) fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: None,
            own_fields: Vec::new(),
            possible_fields: Vec::new(),
            binary_id: 0,
            xml_id: None,
            construct_hook: None,
            encode_hook: None,
            decode_hook: None,
            decode_debug_hook: None,
            is_valid_hook: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.base.is_none()
    }

    /// Find a field by name, searching own fields then the base chain.
    pub fn field(&self, name: &str) -> Option<&CompiledField> {
        match self.own_fields.iter().find(|f| f.name == name) {
            Some(field) => Some(field),
            None => self.base.as_deref().and_then(|base| base.field(name)),
        }
    }

    /// Whether a validation hook is attached anywhere on the chain.
    pub fn has_validation(&self) -> bool {
        self.is_valid_hook.is_some()
            || self
                .base
                .as_deref()
                .is_some_and(TypeDefinition::has_validation)
    }
}

impl fmt::Debug for TypeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDefinition")
            .field("name", &self.name)
            .field("base", &self.base.as_deref().map(|b| &b.name))
            .field("own_fields", &self.own_fields)
            .field("binary_id", &self.binary_id)
            .finish_non_exhaustive()
    }
}
