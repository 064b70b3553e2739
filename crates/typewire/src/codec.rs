// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire encode/decode for compiled types.
//!
//! Field order on the wire is schema declaration order with base fields
//! first; encode and decode walk the compiled chain identically. Arrays in
//! every category share one frame: `[Int32 count][element]*`, count −1 for
//! an absent array, 0 for an empty one.

use crate::basic_types::{datetime_from_ticks, datetime_to_ticks, BasicType};
use crate::object::{fast_construct, ObjectInstance};
use crate::registry::TypeRegistry;
use crate::schema::SchemaError;
use crate::stream::{BinaryStream, DecodeError};
use crate::typedef::{CompiledField, ElementPlan, FieldPlan, TypeDefinition};
use crate::value::{NodeId, Value};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Count written for an absent array.
const ABSENT_ARRAY: i32 = -1;

/// Errors raised while encoding an instance.
#[derive(Debug)]
pub enum EncodeError {
    Schema(SchemaError),
    MissingField(String),
    TypeMismatch { expected: String, got: String },
    LengthOverflow { field: String, length: usize },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(e) => write!(f, "schema error during encode: {}", e),
            Self::MissingField(name) => write!(f, "missing field: {}", name),
            Self::TypeMismatch { expected, got } => {
                write!(f, "type mismatch: expected {}, got {}", expected, got)
            }
            Self::LengthOverflow { field, length } => {
                write!(f, "{}: length {} exceeds the wire count range", field, length)
            }
        }
    }
}

impl std::error::Error for EncodeError {}

impl From<SchemaError> for EncodeError {
    fn from(e: SchemaError) -> Self {
        Self::Schema(e)
    }
}

/// Encode an instance onto a stream, base fields first.
pub fn encode(
    registry: &TypeRegistry,
    instance: &ObjectInstance,
    stream: &mut BinaryStream,
) -> Result<(), EncodeError> {
    encode_chain(registry, instance.type_def(), instance, stream)
}

fn encode_chain(
    registry: &TypeRegistry,
    def: &TypeDefinition,
    instance: &ObjectInstance,
    stream: &mut BinaryStream,
) -> Result<(), EncodeError> {
    if let Some(hook) = &def.encode_hook {
        return hook(instance, stream);
    }
    if let Some(base) = &def.base {
        encode_chain(registry, base, instance, stream)?;
    }
    for field in &def.own_fields {
        encode_field(registry, def, field, instance, stream)?;
    }
    Ok(())
}

fn encode_field(
    registry: &TypeRegistry,
    def: &TypeDefinition,
    field: &CompiledField,
    instance: &ObjectInstance,
    stream: &mut BinaryStream,
) -> Result<(), EncodeError> {
    let value = instance
        .get(&field.name)
        .ok_or_else(|| EncodeError::MissingField(format!("{}.{}", def.name, field.name)))?;
    match &field.plan {
        FieldPlan::Scalar(element) => encode_element(registry, element, value, stream),
        FieldPlan::Array(element) => match value {
            Value::Null => {
                stream.write_i32(ABSENT_ARRAY);
                Ok(())
            }
            Value::Array(items) => {
                let count =
                    i32::try_from(items.len()).map_err(|_| EncodeError::LengthOverflow {
                        field: field.name.clone(),
                        length: items.len(),
                    })?;
                stream.write_i32(count);
                for item in items {
                    encode_element(registry, element, item, stream)?;
                }
                Ok(())
            }
            other => Err(EncodeError::TypeMismatch {
                expected: "array".into(),
                got: other.kind_name().into(),
            }),
        },
    }
}

fn encode_element(
    registry: &TypeRegistry,
    element: &ElementPlan,
    value: &Value,
    stream: &mut BinaryStream,
) -> Result<(), EncodeError> {
    match element {
        ElementPlan::Basic(basic) => encode_basic(*basic, value, stream),
        ElementPlan::Enumeration(e) => match value {
            Value::Enum(ordinal, _) => {
                e.encode(*ordinal, stream);
                Ok(())
            }
            other => Err(EncodeError::TypeMismatch {
                expected: e.name.clone(),
                got: other.kind_name().into(),
            }),
        },
        ElementPlan::Complex(link) => match value {
            Value::Object(nested) => encode_chain(registry, nested.type_def(), nested, stream),
            other => Err(EncodeError::TypeMismatch {
                expected: link.name().into(),
                got: other.kind_name().into(),
            }),
        },
    }
}

/// Decode a fresh instance of `def` from the stream.
pub fn decode(
    registry: &TypeRegistry,
    def: &Arc<TypeDefinition>,
    stream: &mut BinaryStream,
) -> Result<ObjectInstance, DecodeError> {
    let mut instance = fast_construct(def);
    decode_into(registry, &mut instance, stream, false)?;
    Ok(instance)
}

/// Decode with per-field diagnostics on the debug log.
pub fn decode_debug(
    registry: &TypeRegistry,
    def: &Arc<TypeDefinition>,
    stream: &mut BinaryStream,
) -> Result<ObjectInstance, DecodeError> {
    let mut instance = fast_construct(def);
    decode_into(registry, &mut instance, stream, true)?;
    Ok(instance)
}

pub(crate) fn decode_into(
    registry: &TypeRegistry,
    instance: &mut ObjectInstance,
    stream: &mut BinaryStream,
    debug: bool,
) -> Result<(), DecodeError> {
    let def = instance.type_def().clone();
    decode_chain(registry, &def, instance, stream, debug)
}

fn decode_chain(
    registry: &TypeRegistry,
    def: &TypeDefinition,
    instance: &mut ObjectInstance,
    stream: &mut BinaryStream,
    debug: bool,
) -> Result<(), DecodeError> {
    let hook = if debug {
        &def.decode_debug_hook
    } else {
        &def.decode_hook
    };
    if let Some(hook) = hook {
        return hook(instance, stream);
    }
    if let Some(base) = &def.base {
        decode_chain(registry, base, instance, stream, debug)?;
    }
    for field in &def.own_fields {
        if debug {
            log::debug!(
                "decode {}.{} at offset {}",
                def.name,
                field.name,
                stream.position()
            );
        }
        let value = decode_field(registry, field, stream, debug)?;
        instance.insert(&field.name, value);
    }
    Ok(())
}

fn decode_field(
    registry: &TypeRegistry,
    field: &CompiledField,
    stream: &mut BinaryStream,
    debug: bool,
) -> Result<Value, DecodeError> {
    match &field.plan {
        FieldPlan::Scalar(element) => {
            if let (Some(custom), ElementPlan::Basic(_)) = (&field.decode, element) {
                return custom(stream);
            }
            decode_element(registry, element, stream, debug)
        }
        FieldPlan::Array(element) => {
            let count = stream.read_i32()?;
            if count == ABSENT_ARRAY {
                return Ok(Value::Null);
            }
            if count < 0 {
                return Err(DecodeError::InvalidData(format!(
                    "invalid array count {} for {}",
                    count, field.name
                )));
            }
            let mut items = Vec::with_capacity(count as usize);
            for _ in 0..count {
                items.push(decode_element(registry, element, stream, debug)?);
            }
            Ok(Value::Array(items))
        }
    }
}

fn decode_element(
    registry: &TypeRegistry,
    element: &ElementPlan,
    stream: &mut BinaryStream,
    debug: bool,
) -> Result<Value, DecodeError> {
    match element {
        ElementPlan::Basic(basic) => decode_basic(*basic, stream),
        ElementPlan::Enumeration(e) => e.decode(stream),
        ElementPlan::Complex(link) => {
            let target = link.resolve(registry)?;
            let mut nested = fast_construct(&target);
            decode_chain(registry, &target, &mut nested, stream, debug)?;
            Ok(Value::Object(Box::new(nested)))
        }
    }
}

/// Encode one basic value in its fixed or length-prefixed form.
pub(crate) fn encode_basic(
    kind: BasicType,
    value: &Value,
    stream: &mut BinaryStream,
) -> Result<(), EncodeError> {
    match (kind, value) {
        (BasicType::Boolean, Value::Boolean(v)) => stream.write_u8(u8::from(*v)),
        (BasicType::SByte, Value::SByte(v)) => stream.write_i8(*v),
        (BasicType::Byte, Value::Byte(v)) => stream.write_u8(*v),
        (BasicType::Int16, Value::Int16(v)) => stream.write_i16(*v),
        (BasicType::UInt16, Value::UInt16(v)) => stream.write_u16(*v),
        (BasicType::Int32, Value::Int32(v)) => stream.write_i32(*v),
        (BasicType::UInt32, Value::UInt32(v)) => stream.write_u32(*v),
        (BasicType::Int64, Value::Int64(v)) => stream.write_i64(*v),
        (BasicType::UInt64, Value::UInt64(v)) => stream.write_u64(*v),
        (BasicType::Float, Value::Float(v)) => stream.write_f32(*v),
        (BasicType::Double, Value::Double(v)) => stream.write_f64(*v),
        (BasicType::String, Value::String(s)) => {
            write_length_prefixed(s.as_bytes(), "String", stream)?;
        }
        (BasicType::String | BasicType::ByteString, Value::Null) => {
            stream.write_i32(ABSENT_ARRAY);
        }
        (BasicType::ByteString, Value::ByteString(bytes)) => {
            write_length_prefixed(bytes, "ByteString", stream)?;
        }
        (BasicType::DateTime, Value::DateTime(dt)) => stream.write_i64(datetime_to_ticks(dt)),
        (BasicType::Guid, Value::Guid(guid)) => {
            let (d1, d2, d3, d4) = guid.as_fields();
            stream.write_u32(d1);
            stream.write_u16(d2);
            stream.write_u16(d3);
            stream.write_bytes(d4);
        }
        (BasicType::NodeId, Value::NodeId(node_id)) => encode_node_id(*node_id, stream),
        (kind, other) => {
            return Err(EncodeError::TypeMismatch {
                expected: kind.name().into(),
                got: other.kind_name().into(),
            })
        }
    }
    Ok(())
}

/// Decode one basic value.
pub(crate) fn decode_basic(
    kind: BasicType,
    stream: &mut BinaryStream,
) -> Result<Value, DecodeError> {
    match kind {
        BasicType::Boolean => Ok(Value::Boolean(stream.read_u8()? != 0)),
        BasicType::SByte => Ok(Value::SByte(stream.read_i8()?)),
        BasicType::Byte => Ok(Value::Byte(stream.read_u8()?)),
        BasicType::Int16 => Ok(Value::Int16(stream.read_i16()?)),
        BasicType::UInt16 => Ok(Value::UInt16(stream.read_u16()?)),
        BasicType::Int32 => Ok(Value::Int32(stream.read_i32()?)),
        BasicType::UInt32 => Ok(Value::UInt32(stream.read_u32()?)),
        BasicType::Int64 => Ok(Value::Int64(stream.read_i64()?)),
        BasicType::UInt64 => Ok(Value::UInt64(stream.read_u64()?)),
        BasicType::Float => Ok(Value::Float(stream.read_f32()?)),
        BasicType::Double => Ok(Value::Double(stream.read_f64()?)),
        BasicType::String => match read_length_prefixed(stream)? {
            None => Ok(Value::Null),
            Some(bytes) => Ok(Value::String(String::from_utf8(bytes)?)),
        },
        BasicType::ByteString => match read_length_prefixed(stream)? {
            None => Ok(Value::Null),
            Some(bytes) => Ok(Value::ByteString(bytes)),
        },
        BasicType::DateTime => {
            let ticks = stream.read_i64()?;
            match datetime_from_ticks(ticks) {
                Some(dt) => Ok(Value::DateTime(dt)),
                None => Err(DecodeError::InvalidData(format!(
                    "date-time ticks out of range: {}",
                    ticks
                ))),
            }
        }
        BasicType::Guid => {
            let d1 = stream.read_u32()?;
            let d2 = stream.read_u16()?;
            let d3 = stream.read_u16()?;
            let mut d4 = [0u8; 8];
            d4.copy_from_slice(stream.read_bytes(8)?);
            Ok(Value::Guid(Uuid::from_fields(d1, d2, d3, &d4)))
        }
        BasicType::NodeId => decode_node_id(stream),
    }
}

fn write_length_prefixed(
    bytes: &[u8],
    what: &str,
    stream: &mut BinaryStream,
) -> Result<(), EncodeError> {
    let length = i32::try_from(bytes.len()).map_err(|_| EncodeError::LengthOverflow {
        field: what.to_string(),
        length: bytes.len(),
    })?;
    stream.write_i32(length);
    stream.write_bytes(bytes);
    Ok(())
}

/// Read an Int32-length-prefixed byte run; −1 is the null value.
fn read_length_prefixed(stream: &mut BinaryStream) -> Result<Option<Vec<u8>>, DecodeError> {
    let length = stream.read_i32()?;
    if length == ABSENT_ARRAY {
        return Ok(None);
    }
    if length < 0 {
        return Err(DecodeError::InvalidData(format!(
            "invalid length prefix {}",
            length
        )));
    }
    Ok(Some(stream.read_bytes(length as usize)?.to_vec()))
}

// Three-form numeric identifier: two-byte, four-byte, or full.
const NODE_ID_TWO_BYTE: u8 = 0x00;
const NODE_ID_FOUR_BYTE: u8 = 0x01;
const NODE_ID_NUMERIC: u8 = 0x02;

fn encode_node_id(node_id: NodeId, stream: &mut BinaryStream) {
    if node_id.namespace == 0 && node_id.value <= 0xFF {
        stream.write_u8(NODE_ID_TWO_BYTE);
        stream.write_u8(node_id.value as u8);
    } else if node_id.namespace <= 0xFF && node_id.value <= 0xFFFF {
        stream.write_u8(NODE_ID_FOUR_BYTE);
        stream.write_u8(node_id.namespace as u8);
        stream.write_u16(node_id.value as u16);
    } else {
        stream.write_u8(NODE_ID_NUMERIC);
        stream.write_u16(node_id.namespace);
        stream.write_u32(node_id.value);
    }
}

fn decode_node_id(stream: &mut BinaryStream) -> Result<Value, DecodeError> {
    let encoding = stream.read_u8()?;
    let node_id = match encoding {
        NODE_ID_TWO_BYTE => NodeId::new(0, u32::from(stream.read_u8()?)),
        NODE_ID_FOUR_BYTE => {
            let namespace = u16::from(stream.read_u8()?);
            NodeId::new(namespace, u32::from(stream.read_u16()?))
        }
        NODE_ID_NUMERIC => {
            let namespace = stream.read_u16()?;
            NodeId::new(namespace, stream.read_u32()?)
        }
        other => {
            return Err(DecodeError::InvalidData(format!(
                "unsupported identifier encoding {:#04x}",
                other
            )))
        }
    };
    Ok(Value::NodeId(node_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn round_trip(kind: BasicType, value: Value) -> Value {
        let mut stream = BinaryStream::new();
        encode_basic(kind, &value, &mut stream).expect("encode");
        decode_basic(kind, &mut stream).expect("decode")
    }

    #[test]
    fn test_basic_round_trips() {
        assert_eq!(round_trip(BasicType::Boolean, Value::Boolean(true)), Value::Boolean(true));
        assert_eq!(round_trip(BasicType::Int16, Value::Int16(-300)), Value::Int16(-300));
        assert_eq!(round_trip(BasicType::UInt32, Value::UInt32(0)), Value::UInt32(0));
        assert_eq!(round_trip(BasicType::Double, Value::Double(2.5)), Value::Double(2.5));
        assert_eq!(
            round_trip(BasicType::String, Value::String("opc.tcp://host".into())),
            Value::String("opc.tcp://host".into())
        );
        assert_eq!(
            round_trip(BasicType::ByteString, Value::ByteString(vec![1, 2, 3])),
            Value::ByteString(vec![1, 2, 3])
        );
    }

    #[test]
    fn test_null_string_wire_form() {
        let mut stream = BinaryStream::new();
        encode_basic(BasicType::String, &Value::Null, &mut stream).unwrap();
        assert_eq!(stream.as_bytes(), &[0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(decode_basic(BasicType::String, &mut stream).unwrap(), Value::Null);
    }

    #[test]
    fn test_datetime_round_trip() {
        let dt = DateTime::from_timestamp(1_700_000_000, 500_000_000).unwrap();
        assert_eq!(
            round_trip(BasicType::DateTime, Value::DateTime(dt)),
            Value::DateTime(dt)
        );
    }

    #[test]
    fn test_guid_round_trip_and_layout() {
        let guid = Uuid::from_fields(
            0x72962B91,
            0xFA75,
            0x4AE6,
            &[0x8D, 0x28, 0xB4, 0x04, 0xDC, 0x7D, 0xAF, 0x63],
        );
        let mut stream = BinaryStream::new();
        encode_basic(BasicType::Guid, &Value::Guid(guid), &mut stream).unwrap();
        assert_eq!(
            stream.as_bytes(),
            &[
                0x91, 0x2B, 0x96, 0x72, 0x75, 0xFA, 0xE6, 0x4A, 0x8D, 0x28, 0xB4, 0x04, 0xDC,
                0x7D, 0xAF, 0x63
            ]
        );
        assert_eq!(decode_basic(BasicType::Guid, &mut stream).unwrap(), Value::Guid(guid));
    }

    #[test]
    fn test_node_id_three_forms() {
        for node_id in [
            NodeId::new(0, 255),
            NodeId::new(4, 1025),
            NodeId::new(300, 0x0001_0000),
        ] {
            assert_eq!(
                round_trip(BasicType::NodeId, Value::NodeId(node_id)),
                Value::NodeId(node_id)
            );
        }
        let mut stream = BinaryStream::new();
        encode_node_id(NodeId::new(0, 5), &mut stream);
        assert_eq!(stream.as_bytes(), &[0x00, 0x05]);
    }

    #[test]
    fn test_type_mismatch() {
        let mut stream = BinaryStream::new();
        assert!(matches!(
            encode_basic(BasicType::UInt32, &Value::Boolean(true), &mut stream),
            Err(EncodeError::TypeMismatch { .. })
        ));
    }
}
