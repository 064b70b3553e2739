// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Object instances and the construction engine.
//!
//! Instances are built either from an options mapping (normal path) or via
//! the fast path that skips default computation entirely, used only right
//! before decode overwrites every field.

use crate::enumeration::CoercionError;
use crate::registry::TypeRegistry;
use crate::typedef::{CompiledField, ElementPlan, FieldPlan, TypeDefinition};
use crate::value::{Value, ValueMap};
use crate::Error;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Raised when an instance fails its schema's validation hook.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub type_name: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance of {} failed validation", self.type_name)
    }
}

impl std::error::Error for ValidationError {}

/// A field-name to value mapping tagged with its compiled type.
///
/// Exclusively owned by its creator; the caller holds sole write access
/// while an instance is being decoded into.
#[derive(Clone)]
pub struct ObjectInstance {
    type_def: Arc<TypeDefinition>,
    fields: HashMap<String, Value>,
}

impl ObjectInstance {
    pub fn type_def(&self) -> &Arc<TypeDefinition> {
        &self.type_def
    }

    pub fn type_name(&self) -> &str {
        &self.type_def.name
    }

    pub fn binary_id(&self) -> u32 {
        self.type_def.binary_id
    }

    /// Whether this instance's type chain contains `name`.
    pub fn is_a(&self, name: &str) -> bool {
        let mut current = Some(self.type_def.as_ref());
        while let Some(def) = current {
            if def.name == name {
                return true;
            }
            current = def.base.as_deref();
        }
        false
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Typed field access; `None` when missing or of another kind.
    pub fn get_as<T: crate::value::FromValue>(&self, name: &str) -> Option<T> {
        self.fields.get(name).and_then(T::from_value)
    }

    /// Set a field, coercing the value against the compiled field plan.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), CoercionError> {
        let value = value.into();
        let coerced = match self.type_def.field(name) {
            None => {
                return Err(CoercionError::UnknownField {
                    type_name: self.type_def.name.clone(),
                    field: name.to_string(),
                })
            }
            Some(field) => match (&field.plan, value) {
                (FieldPlan::Scalar(ElementPlan::Basic(basic)), v) => basic.coerce(v)?,
                (FieldPlan::Scalar(ElementPlan::Enumeration(e)), v) => e.coerce(&v)?,
                (FieldPlan::Scalar(ElementPlan::Complex(link)), Value::Object(obj)) => {
                    if !obj.is_a(link.name()) {
                        return Err(CoercionError::InvalidValue {
                            target: link.name().to_string(),
                            got: obj.type_name().to_string(),
                        });
                    }
                    Value::Object(obj)
                }
                (FieldPlan::Scalar(ElementPlan::Complex(_)), Value::Null) => Value::Null,
                (FieldPlan::Array(_), v @ (Value::Array(_) | Value::Null)) => v,
                (_, v) => {
                    return Err(CoercionError::InvalidValue {
                        target: name.to_string(),
                        got: v.kind_name().to_string(),
                    })
                }
            },
        };
        self.fields.insert(name.to_string(), coerced);
        Ok(())
    }

    /// Iterate over present fields.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Run the type's validation hook, if one exists.
    pub fn is_valid(&self) -> Option<bool> {
        self.type_def.is_valid_hook.as_ref().map(|hook| hook(self))
    }

    /// Surface the validation verdict as a result; validity is assumed when
    /// no hook exists.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.is_valid() {
            Some(false) => Err(ValidationError {
                type_name: self.type_def.name.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Set a field without plan coercion; the decode path and decode hooks
    /// write already-canonical values through this.
    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.insert(name.to_string(), value.into());
    }
}

impl PartialEq for ObjectInstance {
    fn eq(&self, other: &Self) -> bool {
        self.type_def.name == other.type_def.name && self.fields == other.fields
    }
}

impl fmt::Debug for ObjectInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(&self.type_def.name)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Normal construction from an options mapping.
pub(crate) fn construct(
    registry: &TypeRegistry,
    def: &Arc<TypeDefinition>,
    options: ValueMap,
) -> Result<ObjectInstance, Error> {
    for key in options.keys() {
        if !def.possible_fields.iter().any(|f| f == key) {
            log::warn!("{}: ignoring unknown option key {}", def.name, key);
        }
    }
    let mut fields = HashMap::new();
    construct_level(registry, def, &options, &mut fields)?;
    Ok(ObjectInstance {
        type_def: def.clone(),
        fields,
    })
}

/// Fast-path construction: base chain first, own complex fields absent,
/// basic/enumeration fields left for decode to populate.
pub(crate) fn fast_construct(def: &Arc<TypeDefinition>) -> ObjectInstance {
    let mut fields = HashMap::new();
    fast_level(def, &mut fields);
    ObjectInstance {
        type_def: def.clone(),
        fields,
    }
}

fn fast_level(def: &TypeDefinition, fields: &mut HashMap<String, Value>) {
    if let Some(base) = &def.base {
        fast_level(base, fields);
    }
    for field in &def.own_fields {
        if let ElementPlan::Complex(_) = field.plan.element() {
            fields.insert(field.name.clone(), Value::Null);
        }
    }
}

fn construct_level(
    registry: &TypeRegistry,
    def: &TypeDefinition,
    options: &ValueMap,
    fields: &mut HashMap<String, Value>,
) -> Result<(), Error> {
    let transformed;
    let options = match &def.construct_hook {
        Some(hook) => {
            transformed = hook(options.clone());
            &transformed
        }
        None => options,
    };
    if let Some(base) = &def.base {
        construct_level(registry, base, options, fields)?;
    }
    for field in &def.own_fields {
        let value = init_field(registry, field, options.get(&field.name))?;
        fields.insert(field.name.clone(), value);
    }
    Ok(())
}

fn init_field(
    registry: &TypeRegistry,
    field: &CompiledField,
    supplied: Option<&Value>,
) -> Result<Value, Error> {
    match &field.plan {
        FieldPlan::Scalar(element) => match supplied {
            Some(value) => init_element(registry, element, value),
            None => default_scalar(registry, field, element),
        },
        FieldPlan::Array(element) => match supplied {
            Some(Value::Null) => Ok(Value::Null),
            Some(Value::Array(items)) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(init_element(registry, element, item)?);
                }
                Ok(Value::Array(out))
            }
            Some(other) => Err(CoercionError::InvalidValue {
                target: format!("{}[]", field.name),
                got: other.kind_name().to_string(),
            }
            .into()),
            None => match &field.default {
                Some(default) => match default.produce() {
                    Value::Null => Ok(Value::Null),
                    Value::Array(items) => {
                        let mut out = Vec::with_capacity(items.len());
                        for item in &items {
                            out.push(init_element(registry, element, item)?);
                        }
                        Ok(Value::Array(out))
                    }
                    other => Err(CoercionError::InvalidValue {
                        target: format!("{}[]", field.name),
                        got: other.kind_name().to_string(),
                    }
                    .into()),
                },
                None => Ok(Value::Array(Vec::new())),
            },
        },
    }
}

/// Coerce one supplied element against its compiled plan.
fn init_element(
    registry: &TypeRegistry,
    element: &ElementPlan,
    value: &Value,
) -> Result<Value, Error> {
    match element {
        ElementPlan::Basic(basic) => Ok(basic.coerce(value.clone())?),
        ElementPlan::Enumeration(e) => Ok(e.coerce(value)?),
        ElementPlan::Complex(link) => match value {
            Value::Map(sub) => {
                let target = link.resolve(registry)?;
                Ok(Value::Object(Box::new(construct(
                    registry,
                    &target,
                    sub.clone(),
                )?)))
            }
            Value::Object(obj) => {
                if obj.is_a(link.name()) {
                    Ok(value.clone())
                } else {
                    Err(CoercionError::InvalidValue {
                        target: link.name().to_string(),
                        got: obj.type_name().to_string(),
                    }
                    .into())
                }
            }
            Value::Null => Ok(Value::Null),
            other => Err(CoercionError::InvalidValue {
                target: link.name().to_string(),
                got: other.kind_name().to_string(),
            }
            .into()),
        },
    }
}

fn default_scalar(
    registry: &TypeRegistry,
    field: &CompiledField,
    element: &ElementPlan,
) -> Result<Value, Error> {
    if let Some(default) = &field.default {
        return init_element(registry, element, &default.produce());
    }
    Ok(match element {
        ElementPlan::Basic(basic) => basic.default_value(),
        ElementPlan::Enumeration(e) => e.default_value(),
        ElementPlan::Complex(_) => Value::Null,
    })
}
