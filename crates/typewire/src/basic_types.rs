// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Basic (primitive) wire types: name table, defaults and coercion.
//!
//! The wire encode/decode of each kind lives in [`crate::codec`]; this module
//! owns the closed kind set and the construction-time value rules.

use crate::enumeration::CoercionError;
use crate::value::{NodeId, Value};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 100 ns intervals between 1601-01-01 and the Unix epoch.
pub(crate) const EPOCH_OFFSET_100NS: i64 = 116_444_736_000_000_000;

/// Primitive wire type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicType {
    Boolean,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    String,
    ByteString,
    DateTime,
    Guid,
    NodeId,
}

/// Well-known alternate names for primitive codecs, pre-registered in every
/// schema registry.
pub(crate) const BUILTIN_ALIASES: &[(&str, BasicType)] = &[
    ("IntegerId", BasicType::UInt32),
    ("Counter", BasicType::UInt32),
    ("VersionTime", BasicType::UInt32),
    ("UAString", BasicType::String),
    ("LocaleId", BasicType::String),
    ("Duration", BasicType::Double),
    ("UtcTime", BasicType::DateTime),
];

impl BasicType {
    /// Look up a canonical primitive name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "Boolean" => Some(Self::Boolean),
            "SByte" => Some(Self::SByte),
            "Byte" => Some(Self::Byte),
            "Int16" => Some(Self::Int16),
            "UInt16" => Some(Self::UInt16),
            "Int32" => Some(Self::Int32),
            "UInt32" => Some(Self::UInt32),
            "Int64" => Some(Self::Int64),
            "UInt64" => Some(Self::UInt64),
            "Float" => Some(Self::Float),
            "Double" => Some(Self::Double),
            "String" => Some(Self::String),
            "ByteString" => Some(Self::ByteString),
            "DateTime" => Some(Self::DateTime),
            "Guid" => Some(Self::Guid),
            "NodeId" => Some(Self::NodeId),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::SByte => "SByte",
            Self::Byte => "Byte",
            Self::Int16 => "Int16",
            Self::UInt16 => "UInt16",
            Self::Int32 => "Int32",
            Self::UInt32 => "UInt32",
            Self::Int64 => "Int64",
            Self::UInt64 => "UInt64",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::String => "String",
            Self::ByteString => "ByteString",
            Self::DateTime => "DateTime",
            Self::Guid => "Guid",
            Self::NodeId => "NodeId",
        }
    }

    /// Zero value used when construction is given neither a value nor a
    /// field default. String-like kinds default to the null value.
    pub fn default_value(&self) -> Value {
        match self {
            Self::Boolean => Value::Boolean(false),
            Self::SByte => Value::SByte(0),
            Self::Byte => Value::Byte(0),
            Self::Int16 => Value::Int16(0),
            Self::UInt16 => Value::UInt16(0),
            Self::Int32 => Value::Int32(0),
            Self::UInt32 => Value::UInt32(0),
            Self::Int64 => Value::Int64(0),
            Self::UInt64 => Value::UInt64(0),
            Self::Float => Value::Float(0.0),
            Self::Double => Value::Double(0.0),
            Self::String | Self::ByteString => Value::Null,
            Self::DateTime => Value::DateTime(windows_epoch()),
            Self::Guid => Value::Guid(Uuid::nil()),
            Self::NodeId => Value::NodeId(NodeId::default()),
        }
    }

    /// Coerce a supplied value into this kind's canonical variant.
    pub fn coerce(&self, value: Value) -> Result<Value, CoercionError> {
        macro_rules! int_coercion {
            ($target:ty, $variant:ident) => {
                match value.as_integer().and_then(|v| <$target>::try_from(v).ok()) {
                    Some(v) => return Ok(Value::$variant(v)),
                    None => {}
                }
            };
        }

        match (self, &value) {
            (Self::Boolean, Value::Boolean(_)) => return Ok(value),
            (Self::Float, Value::Float(_)) => return Ok(value),
            (Self::Float, Value::Double(v)) => return Ok(Value::Float(*v as f32)),
            (Self::Double, Value::Double(_)) => return Ok(value),
            (Self::Double, Value::Float(v)) => return Ok(Value::Double(f64::from(*v))),
            (Self::String, Value::String(_) | Value::Null) => return Ok(value),
            (Self::ByteString, Value::ByteString(_) | Value::Null) => return Ok(value),
            (Self::DateTime, Value::DateTime(_)) => return Ok(value),
            (Self::Guid, Value::Guid(_)) => return Ok(value),
            (Self::Guid, Value::String(s)) => {
                if let Ok(guid) = Uuid::parse_str(s) {
                    return Ok(Value::Guid(guid));
                }
            }
            (Self::NodeId, Value::NodeId(_)) => return Ok(value),
            (Self::NodeId, _) => {
                if let Some(id) = value.as_integer().and_then(|v| u32::try_from(v).ok()) {
                    return Ok(Value::NodeId(NodeId::new(0, id)));
                }
            }
            (Self::SByte, _) => int_coercion!(i8, SByte),
            (Self::Byte, _) => int_coercion!(u8, Byte),
            (Self::Int16, _) => int_coercion!(i16, Int16),
            (Self::UInt16, _) => int_coercion!(u16, UInt16),
            (Self::Int32, _) => int_coercion!(i32, Int32),
            (Self::UInt32, _) => int_coercion!(u32, UInt32),
            (Self::Int64, _) => int_coercion!(i64, Int64),
            (Self::UInt64, _) => {
                if let Value::UInt64(_) = value {
                    return Ok(value);
                }
                int_coercion!(u64, UInt64)
            }
            (Self::Float | Self::Double, _) => {
                if let Some(v) = value.as_integer() {
                    return Ok(match self {
                        Self::Float => Value::Float(v as f32),
                        _ => Value::Double(v as f64),
                    });
                }
            }
            _ => {}
        }

        Err(CoercionError::InvalidValue {
            target: self.name().to_string(),
            got: value.kind_name().to_string(),
        })
    }
}

/// 1601-01-01T00:00:00Z, the zero of the wire date-time form.
pub(crate) fn windows_epoch() -> DateTime<Utc> {
    datetime_from_ticks(0).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Convert to 100 ns intervals since 1601-01-01.
pub(crate) fn datetime_to_ticks(dt: &DateTime<Utc>) -> i64 {
    dt.timestamp()
        .saturating_mul(10_000_000)
        .saturating_add(i64::from(dt.timestamp_subsec_nanos() / 100))
        .saturating_add(EPOCH_OFFSET_100NS)
}

/// Convert 100 ns intervals since 1601-01-01 back to a date-time.
pub(crate) fn datetime_from_ticks(ticks: i64) -> Option<DateTime<Utc>> {
    let unix_100ns = ticks - EPOCH_OFFSET_100NS;
    let secs = unix_100ns.div_euclid(10_000_000);
    let nanos = (unix_100ns.rem_euclid(10_000_000) as u32) * 100;
    DateTime::from_timestamp(secs, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name_round_trip() {
        for name in ["Boolean", "UInt32", "String", "DateTime", "NodeId"] {
            let kind = BasicType::by_name(name).expect(name);
            assert_eq!(kind.name(), name);
        }
        assert!(BasicType::by_name("Complex").is_none());
    }

    #[test]
    fn test_integer_coercion_range_checked() {
        assert_eq!(
            BasicType::Byte.coerce(Value::Int32(200)).unwrap(),
            Value::Byte(200)
        );
        assert!(BasicType::Byte.coerce(Value::Int32(300)).is_err());
        assert!(BasicType::UInt32.coerce(Value::Int32(-1)).is_err());
    }

    #[test]
    fn test_string_kinds_accept_null() {
        assert_eq!(
            BasicType::String.coerce(Value::Null).unwrap(),
            Value::Null
        );
        assert!(BasicType::Int32.coerce(Value::Null).is_err());
    }

    #[test]
    fn test_guid_from_string() {
        let s = "72962b91-fa75-4ae6-8d28-b404dc7daf63";
        match BasicType::Guid.coerce(Value::String(s.into())).unwrap() {
            Value::Guid(g) => assert_eq!(g.to_string(), s),
            other => panic!("expected guid, got {:?}", other),
        }
    }

    #[test]
    fn test_datetime_ticks_round_trip() {
        let dt = DateTime::from_timestamp(1_702_900_000, 123_456_700).unwrap();
        let ticks = datetime_to_ticks(&dt);
        assert_eq!(datetime_from_ticks(ticks), Some(dt));
    }

    #[test]
    fn test_windows_epoch_is_tick_zero() {
        assert_eq!(datetime_to_ticks(&windows_epoch()), 0);
    }
}
