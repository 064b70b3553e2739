// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field value types.

use crate::object::ObjectInstance;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Options mapping handed to construction: field name to supplied value.
pub type ValueMap = HashMap<String, Value>;

/// Numeric structured identifier (namespace + numeric value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeId {
    pub namespace: u16,
    pub value: u32,
}

impl NodeId {
    pub fn new(namespace: u16, value: u32) -> Self {
        Self { namespace, value }
    }
}

/// A value held by an object instance field.
///
/// `Null` doubles as the absent state: an absent array, an absent complex
/// reference, or a null string on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(String),
    ByteString(Vec<u8>),
    DateTime(DateTime<Utc>),
    Guid(Uuid),
    NodeId(NodeId),

    /// Canonical enumeration member: (ordinal, member name).
    Enum(i32, String),
    /// Nested typed object.
    Object(Box<ObjectInstance>),
    /// Ordered sequence; `Null` is the distinct absent-array state.
    Array(Vec<Value>),
    /// Raw sub-options for a complex field, consumed by construction.
    Map(ValueMap),
}

impl Value {
    /// Check if value is null/absent.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short kind name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::SByte(_) => "sbyte",
            Self::Byte(_) => "byte",
            Self::Int16(_) => "int16",
            Self::UInt16(_) => "uint16",
            Self::Int32(_) => "int32",
            Self::UInt32(_) => "uint32",
            Self::Int64(_) => "int64",
            Self::UInt64(_) => "uint64",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::ByteString(_) => "bytestring",
            Self::DateTime(_) => "datetime",
            Self::Guid(_) => "guid",
            Self::NodeId(_) => "nodeid",
            Self::Enum(_, _) => "enum",
            Self::Object(_) => "object",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }

    /// Widen any integer variant (or enum ordinal) to i64.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::SByte(v) => Some(i64::from(*v)),
            Self::Byte(v) => Some(i64::from(*v)),
            Self::Int16(v) => Some(i64::from(*v)),
            Self::UInt16(v) => Some(i64::from(*v)),
            Self::Int32(v) => Some(i64::from(*v)),
            Self::UInt32(v) => Some(i64::from(*v)),
            Self::Int64(v) => Some(*v),
            Self::UInt64(v) => i64::try_from(*v).ok(),
            Self::Enum(v, _) => Some(i64::from(*v)),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(f64::from(*v)),
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectInstance> {
        match self {
            Self::Object(v) => Some(v),
            _ => None,
        }
    }

    /// Get enum member name.
    pub fn enum_member(&self) -> Option<&str> {
        match self {
            Self::Enum(_, name) => Some(name),
            _ => None,
        }
    }

    /// Get enum ordinal.
    pub fn enum_value(&self) -> Option<i32> {
        match self {
            Self::Enum(value, _) => Some(*value),
            _ => None,
        }
    }
}

// Conversion traits
macro_rules! impl_from {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Self::$variant(v)
            }
        }
    };
}

impl_from!(bool, Boolean);
impl_from!(i8, SByte);
impl_from!(u8, Byte);
impl_from!(i16, Int16);
impl_from!(u16, UInt16);
impl_from!(i32, Int32);
impl_from!(u32, UInt32);
impl_from!(i64, Int64);
impl_from!(u64, UInt64);
impl_from!(f32, Float);
impl_from!(f64, Double);
impl_from!(String, String);
impl_from!(DateTime<Utc>, DateTime);
impl_from!(Uuid, Guid);
impl_from!(NodeId, NodeId);

impl From<ObjectInstance> for Value {
    fn from(v: ObjectInstance) -> Self {
        Self::Object(Box::new(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<ValueMap> for Value {
    fn from(v: ValueMap) -> Self {
        Self::Map(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::Array(v.into_iter().map(Into::into).collect())
    }
}

/// Trait for extracting a typed value out of a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_from_value {
    ($ty:ty, $variant:ident) => {
        impl FromValue for $ty {
            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(*v),
                    _ => None,
                }
            }
        }
    };
}

impl_from_value!(bool, Boolean);
impl_from_value!(i8, SByte);
impl_from_value!(u8, Byte);
impl_from_value!(i16, Int16);
impl_from_value!(u16, UInt16);
impl_from_value!(i32, Int32);
impl_from_value!(u32, UInt32);
impl_from_value!(i64, Int64);
impl_from_value!(u64, UInt64);
impl_from_value!(f32, Float);
impl_from_value!(f64, Double);
impl_from_value!(NodeId, NodeId);
impl_from_value!(Uuid, Guid);

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::ByteString(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::DateTime(v) => Some(*v),
            _ => None,
        }
    }
}
