// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema compilation: descriptor to executable type definition.

use crate::ids::assign_encoding_ids;
use crate::registry::TypeRegistry;
use crate::schema::{FieldCategory, Resolved, SchemaError, StructuredTypeSchema};
use crate::typedef::{CompiledField, ElementPlan, FieldPlan, TypeDefinition, TypeLink};
use std::sync::Arc;

/// Compile one schema.
///
/// The base chain compiles eagerly through `stack` (which carries the names
/// currently being compiled, for cycle detection); complex field targets are
/// only bound by name and compile lazily on first use.
pub(crate) fn compile(
    registry: &TypeRegistry,
    schema: &Arc<StructuredTypeSchema>,
    stack: &mut Vec<String>,
) -> Result<TypeDefinition, SchemaError> {
    let schemas = registry.schemas();
    schemas.check_correctness(schema)?;

    let base = match &schema.base_type {
        None => registry.base_object(),
        Some(base_name) => registry.compile_stacked(base_name, stack)?,
    };

    let mut possible_fields = base.possible_fields.clone();
    let mut own_fields = Vec::with_capacity(schema.fields.len());
    for field in &schema.fields {
        if possible_fields.iter().any(|name| name == &field.name) {
            return Err(SchemaError::DuplicateField {
                type_name: schema.name.clone(),
                field: field.name.clone(),
            });
        }
        let resolved =
            schemas
                .resolve(&field.field_type)
                .ok_or_else(|| SchemaError::UnresolvedFieldType {
                    type_name: schema.name.clone(),
                    field: field.name.clone(),
                    field_type: field.field_type.clone(),
                })?;
        let element = match (field.category, resolved) {
            (FieldCategory::Basic, Resolved::Basic(basic)) => ElementPlan::Basic(basic),
            (FieldCategory::Enumeration, Resolved::Enumeration(e)) => ElementPlan::Enumeration(e),
            (FieldCategory::Complex, Resolved::Structured(_)) => {
                ElementPlan::Complex(TypeLink::new(&field.field_type))
            }
            _ => {
                return Err(SchemaError::CategoryMismatch {
                    type_name: schema.name.clone(),
                    field: field.name.clone(),
                    field_type: field.field_type.clone(),
                })
            }
        };
        own_fields.push(CompiledField {
            name: field.name.clone(),
            plan: if field.is_array {
                FieldPlan::Array(element)
            } else {
                FieldPlan::Scalar(element)
            },
            default: field.default.clone(),
            decode: field.decode.clone(),
        });
        possible_fields.push(field.name.clone());
    }

    let ids = assign_encoding_ids(schema, registry.id_table(), registry.allocator())?;
    log::debug!(
        "compiled {} ({} own fields, binary id {})",
        schema.name,
        own_fields.len(),
        ids.binary
    );

    Ok(TypeDefinition {
        name: schema.name.clone(),
        base: Some(base),
        own_fields,
        possible_fields,
        binary_id: ids.binary,
        xml_id: ids.xml,
        construct_hook: schema.construct_hook.clone(),
        encode_hook: schema.encode_hook.clone(),
        decode_hook: schema.decode_hook.clone(),
        decode_debug_hook: schema.decode_debug_hook.clone(),
        is_valid_hook: schema.is_valid_hook.clone(),
    })
}
