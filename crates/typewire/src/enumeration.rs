// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Enumeration descriptors, value coercion and Int32 wire codec.

use crate::stream::{BinaryStream, DecodeError};
use crate::value::Value;
use std::fmt;

/// Errors raised while coercing a supplied value into a field.
///
/// An instance whose construction failed with a coercion error must not be
/// used.
#[derive(Debug)]
pub enum CoercionError {
    UnknownMember { enum_name: String, got: String },
    InvalidValue { target: String, got: String },
    UnknownField { type_name: String, field: String },
}

impl fmt::Display for CoercionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMember { enum_name, got } => {
                write!(f, "value cannot be coerced to {}: {}", enum_name, got)
            }
            Self::InvalidValue { target, got } => {
                write!(f, "value cannot be coerced to {}: got {}", target, got)
            }
            Self::UnknownField { type_name, field } => {
                write!(f, "{} has no field named {}", type_name, field)
            }
        }
    }
}

impl std::error::Error for CoercionError {}

/// A single enumeration member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub name: String,
    pub value: i32,
}

impl EnumMember {
    pub fn new(name: impl Into<String>, value: i32) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A typed enumeration: named members over an Int32 wire form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    pub name: String,
    pub members: Vec<EnumMember>,
}

impl EnumDescriptor {
    pub fn new(name: impl Into<String>, members: Vec<EnumMember>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }

    /// Get member by name.
    pub fn member(&self, name: &str) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Get member by ordinal.
    pub fn member_by_value(&self, value: i32) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.value == value)
    }

    /// Canonical value for the first declared member.
    pub fn default_value(&self) -> Value {
        match self.members.first() {
            Some(m) => Value::Enum(m.value, m.name.clone()),
            None => Value::Enum(0, String::new()),
        }
    }

    /// Map a supplied representation to the canonical member value.
    ///
    /// Accepts a member name, an ordinal in any integer width, or an
    /// already-typed enum value. Anything unrecognized fails.
    pub fn coerce(&self, value: &Value) -> Result<Value, CoercionError> {
        let member = match value {
            Value::String(name) => self.member(name),
            other => match other.as_integer() {
                Some(ordinal) => i32::try_from(ordinal)
                    .ok()
                    .and_then(|v| self.member_by_value(v)),
                None => None,
            },
        };
        match member {
            Some(m) => Ok(Value::Enum(m.value, m.name.clone())),
            None => Err(CoercionError::UnknownMember {
                enum_name: self.name.clone(),
                got: format!("{:?}", value),
            }),
        }
    }

    pub fn encode(&self, value: i32, stream: &mut BinaryStream) {
        stream.write_i32(value);
    }

    /// Decode an ordinal; unknown ordinals keep the raw value with an empty
    /// member name.
    pub fn decode(&self, stream: &mut BinaryStream) -> Result<Value, DecodeError> {
        let ordinal = stream.read_i32()?;
        let name = self
            .member_by_value(ordinal)
            .map(|m| m.name.clone())
            .unwrap_or_default();
        Ok(Value::Enum(ordinal, name))
    }
}
