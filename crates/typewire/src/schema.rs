// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema descriptors, the schema registry and name resolution.
//!
//! Descriptors are the declarative input of the compiler: a named, ordered
//! field list over basic, complex and enumeration categories, loaded once at
//! process start and immutable afterwards.

use crate::basic_types::{BasicType, BUILTIN_ALIASES};
use crate::codec::EncodeError;
use crate::enumeration::EnumDescriptor;
use crate::ids::SchemaId;
use crate::object::ObjectInstance;
use crate::stream::{BinaryStream, DecodeError};
use crate::value::{Value, ValueMap};
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

/// Schema-correctness and compilation errors; fatal to the affected type.
#[derive(Debug, Clone)]
pub enum SchemaError {
    MissingName,
    MalformedField { type_name: String, field: String },
    DecodeWithoutDecodeDebug { type_name: String },
    DuplicateType { name: String },
    UnknownType { name: String },
    UnresolvedFieldType { type_name: String, field: String, field_type: String },
    CategoryMismatch { type_name: String, field: String, field_type: String },
    DuplicateField { type_name: String, field: String },
    MissingEncodingId { type_name: String },
    RecursiveBase { type_name: String },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingName => write!(f, "schema has no name"),
            Self::MalformedField { type_name, field } => {
                write!(f, "{}: field {} lacks a name or type", type_name, field)
            }
            Self::DecodeWithoutDecodeDebug { type_name } => {
                write!(f, "{}: decode hook requires a decode_debug hook", type_name)
            }
            Self::DuplicateType { name } => {
                write!(f, "type name already registered: {}", name)
            }
            Self::UnknownType { name } => write!(f, "unknown type: {}", name),
            Self::UnresolvedFieldType { type_name, field, field_type } => {
                write!(f, "{}.{}: unresolved field type {}", type_name, field, field_type)
            }
            Self::CategoryMismatch { type_name, field, field_type } => {
                write!(
                    f,
                    "{}.{}: {} does not match the declared field category",
                    type_name, field, field_type
                )
            }
            Self::DuplicateField { type_name, field } => {
                write!(f, "{}: duplicate field {}", type_name, field)
            }
            Self::MissingEncodingId { type_name } => {
                write!(f, "{} has no binary encoding id", type_name)
            }
            Self::RecursiveBase { type_name } => {
                write!(f, "{}: base type chain is recursive", type_name)
            }
        }
    }
}

impl std::error::Error for SchemaError {}

/// Field category, fixed per field in the descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCategory {
    Basic,
    Complex,
    Enumeration,
}

/// A field default: a literal value or a generator invoked per construction.
#[derive(Clone)]
pub enum DefaultValue {
    Literal(Value),
    Generator(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    pub fn produce(&self) -> Value {
        match self {
            Self::Literal(v) => v.clone(),
            Self::Generator(f) => f(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            Self::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

/// Custom per-field decode, replacing the primitive decode for that field.
pub type DecodeFieldFn = Arc<dyn Fn(&mut BinaryStream) -> Result<Value, DecodeError> + Send + Sync>;

/// Hook transforming the options mapping before construction.
pub type ConstructHookFn = Arc<dyn Fn(ValueMap) -> ValueMap + Send + Sync>;
/// Hook replacing the compiled encode of a type.
pub type EncodeHookFn =
    Arc<dyn Fn(&ObjectInstance, &mut BinaryStream) -> Result<(), EncodeError> + Send + Sync>;
/// Hook replacing the compiled decode of a type.
pub type DecodeHookFn =
    Arc<dyn Fn(&mut ObjectInstance, &mut BinaryStream) -> Result<(), DecodeError> + Send + Sync>;
/// Validation hook; validity is assumed when absent.
pub type IsValidFn = Arc<dyn Fn(&ObjectInstance) -> bool + Send + Sync>;

/// One declared field of a structured type.
#[derive(Clone)]
pub struct FieldSchema {
    pub name: String,
    pub field_type: String,
    pub category: FieldCategory,
    pub is_array: bool,
    pub default: Option<DefaultValue>,
    pub decode: Option<DecodeFieldFn>,
    pub documentation: String,
}

impl FieldSchema {
    fn new(name: impl Into<String>, field_type: impl Into<String>, category: FieldCategory) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            category,
            is_array: false,
            default: None,
            decode: None,
            documentation: String::new(),
        }
    }

    /// Declare a basic (primitive) field.
    pub fn basic(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self::new(name, field_type, FieldCategory::Basic)
    }

    /// Declare a complex (nested structured) field.
    pub fn complex(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self::new(name, field_type, FieldCategory::Complex)
    }

    /// Declare an enumeration field.
    pub fn enumeration(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self::new(name, field_type, FieldCategory::Enumeration)
    }

    /// Mark as an ordered-sequence field.
    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// Set a literal default.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    /// Set a generated default, invoked on every construction.
    pub fn with_default_fn(
        mut self,
        generator: impl Fn() -> Value + Send + Sync + 'static,
    ) -> Self {
        self.default = Some(DefaultValue::Generator(Arc::new(generator)));
        self
    }

    /// Override the wire decode for this field only.
    pub fn with_decode(
        mut self,
        decode: impl Fn(&mut BinaryStream) -> Result<Value, DecodeError> + Send + Sync + 'static,
    ) -> Self {
        self.decode = Some(Arc::new(decode));
        self
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }
}

impl fmt::Debug for FieldSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSchema")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("category", &self.category)
            .field("is_array", &self.is_array)
            .finish_non_exhaustive()
    }
}

/// Declarative description of a structured type, prior to compilation.
#[derive(Clone, Default)]
pub struct StructuredTypeSchema {
    pub name: String,
    pub base_type: Option<String>,
    pub fields: Vec<FieldSchema>,
    pub id: Option<SchemaId>,
    pub documentation: String,
    pub construct_hook: Option<ConstructHookFn>,
    pub encode_hook: Option<EncodeHookFn>,
    pub decode_hook: Option<DecodeHookFn>,
    pub decode_debug_hook: Option<DecodeHookFn>,
    pub is_valid_hook: Option<IsValidFn>,
}

impl StructuredTypeSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the base type; types without one derive from the root object.
    pub fn base(mut self, base_type: impl Into<String>) -> Self {
        self.base_type = Some(base_type.into());
        self
    }

    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    /// Use a statically assigned binary encoding id.
    pub fn with_id(mut self, id: u32) -> Self {
        self.id = Some(SchemaId::Static(id));
        self
    }

    /// Request one-time runtime allocation of the binary encoding id.
    pub fn runtime_id(mut self) -> Self {
        self.id = Some(SchemaId::RuntimeGenerated);
        self
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }

    pub fn construct_hook(
        mut self,
        hook: impl Fn(ValueMap) -> ValueMap + Send + Sync + 'static,
    ) -> Self {
        self.construct_hook = Some(Arc::new(hook));
        self
    }

    pub fn encode_hook(
        mut self,
        hook: impl Fn(&ObjectInstance, &mut BinaryStream) -> Result<(), EncodeError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.encode_hook = Some(Arc::new(hook));
        self
    }

    pub fn decode_hook(
        mut self,
        hook: impl Fn(&mut ObjectInstance, &mut BinaryStream) -> Result<(), DecodeError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.decode_hook = Some(Arc::new(hook));
        self
    }

    pub fn decode_debug_hook(
        mut self,
        hook: impl Fn(&mut ObjectInstance, &mut BinaryStream) -> Result<(), DecodeError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.decode_debug_hook = Some(Arc::new(hook));
        self
    }

    pub fn is_valid_hook(mut self, hook: impl Fn(&ObjectInstance) -> bool + Send + Sync + 'static) -> Self {
        self.is_valid_hook = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for StructuredTypeSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuredTypeSchema")
            .field("name", &self.name)
            .field("base_type", &self.base_type)
            .field("fields", &self.fields)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Target of a resolved field-type name.
#[derive(Debug, Clone)]
pub enum Resolved {
    Basic(BasicType),
    Enumeration(Arc<EnumDescriptor>),
    Structured(Arc<StructuredTypeSchema>),
}

/// Store of schema descriptors, enumerations and primitive aliases.
///
/// Names are write-once across all three namespaces; canonical primitive
/// names and the builtin aliases are reserved up front.
#[derive(Debug)]
pub struct SchemaRegistry {
    aliases: DashMap<String, BasicType>,
    enums: DashMap<String, Arc<EnumDescriptor>>,
    schemas: DashMap<String, Arc<StructuredTypeSchema>>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    pub fn new() -> Self {
        let registry = Self {
            aliases: DashMap::new(),
            enums: DashMap::new(),
            schemas: DashMap::new(),
        };
        for (alias, target) in BUILTIN_ALIASES {
            registry.aliases.insert((*alias).to_string(), *target);
        }
        registry
    }

    fn is_taken(&self, name: &str) -> bool {
        BasicType::by_name(name).is_some()
            || self.aliases.contains_key(name)
            || self.enums.contains_key(name)
            || self.schemas.contains_key(name)
    }

    /// Register a schema descriptor after checking its correctness.
    pub fn register_schema(
        &self,
        schema: StructuredTypeSchema,
    ) -> Result<Arc<StructuredTypeSchema>, SchemaError> {
        self.check_correctness(&schema)?;
        if self.is_taken(&schema.name) {
            return Err(SchemaError::DuplicateType { name: schema.name });
        }
        let schema = Arc::new(schema);
        self.schemas.insert(schema.name.clone(), schema.clone());
        Ok(schema)
    }

    /// Register a typed enumeration.
    pub fn register_enumeration(
        &self,
        descriptor: EnumDescriptor,
    ) -> Result<Arc<EnumDescriptor>, SchemaError> {
        if descriptor.name.is_empty() {
            return Err(SchemaError::MissingName);
        }
        if self.is_taken(&descriptor.name) {
            return Err(SchemaError::DuplicateType {
                name: descriptor.name,
            });
        }
        let descriptor = Arc::new(descriptor);
        self.enums.insert(descriptor.name.clone(), descriptor.clone());
        Ok(descriptor)
    }

    /// Register an alternate name for a primitive codec.
    pub fn register_basic_alias(&self, alias: &str, target: BasicType) -> Result<(), SchemaError> {
        if alias.is_empty() {
            return Err(SchemaError::MissingName);
        }
        if self.is_taken(alias) {
            return Err(SchemaError::DuplicateType {
                name: alias.to_string(),
            });
        }
        self.aliases.insert(alias.to_string(), target);
        Ok(())
    }

    /// Resolve a type name to its primitive codec, enumeration or schema.
    ///
    /// Resolving a schema name binds only; it never forces compilation.
    pub fn resolve(&self, name: &str) -> Option<Resolved> {
        if let Some(basic) = BasicType::by_name(name) {
            return Some(Resolved::Basic(basic));
        }
        if let Some(basic) = self.aliases.get(name) {
            return Some(Resolved::Basic(*basic.value()));
        }
        if let Some(e) = self.enums.get(name) {
            return Some(Resolved::Enumeration(e.value().clone()));
        }
        if let Some(s) = self.schemas.get(name) {
            return Some(Resolved::Structured(s.value().clone()));
        }
        None
    }

    pub fn schema(&self, name: &str) -> Option<Arc<StructuredTypeSchema>> {
        self.schemas.get(name).map(|s| s.value().clone())
    }

    /// Names of all registered schemas.
    pub fn schema_names(&self) -> Vec<String> {
        self.schemas.iter().map(|s| s.key().clone()).collect()
    }

    /// Reject structurally broken schemas before they reach the compiler.
    pub fn check_correctness(&self, schema: &StructuredTypeSchema) -> Result<(), SchemaError> {
        if schema.name.is_empty() {
            return Err(SchemaError::MissingName);
        }
        for (index, field) in schema.fields.iter().enumerate() {
            if field.name.is_empty() || field.field_type.is_empty() {
                return Err(SchemaError::MalformedField {
                    type_name: schema.name.clone(),
                    field: if field.name.is_empty() {
                        format!("#{}", index)
                    } else {
                        field.name.clone()
                    },
                });
            }
        }
        if schema.decode_hook.is_some() && schema.decode_debug_hook.is_none() {
            return Err(SchemaError::DecodeWithoutDecodeDebug {
                type_name: schema.name.clone(),
            });
        }
        Ok(())
    }
}
