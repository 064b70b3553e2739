// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # Typewire - schema-driven binary codec compiler
//!
//! Turns declarative type schemas (name, base type, ordered fields over
//! basic/complex/enumeration categories) into executable type definitions
//! that construct, validate, encode and decode object instances on a
//! compact little-endian wire format, with multi-level inheritance, arrays
//! and protocol-assigned encoding identifiers.
//!
//! ## Quick Start
//!
//! ```rust
//! use typewire::{
//!     BinaryStream, FieldSchema, IdTable, SchemaRegistry, StructuredTypeSchema, TypeRegistry,
//!     Value,
//! };
//!
//! fn main() -> typewire::Result<()> {
//!     // Schema-load phase: declare the types once.
//!     let schemas = SchemaRegistry::new();
//!     schemas.register_schema(
//!         StructuredTypeSchema::new("ChannelRequest")
//!             .with_id(451)
//!             .field(FieldSchema::basic("requestHandle", "IntegerId"))
//!             .field(FieldSchema::basic("endpointUrl", "String")),
//!     )?;
//!     let registry = TypeRegistry::new(schemas, IdTable::new());
//!
//!     // Construct, encode, decode.
//!     let request = registry.construct(
//!         "ChannelRequest",
//!         [
//!             ("requestHandle".to_string(), Value::from(7u32)),
//!             ("endpointUrl".to_string(), Value::from("opc.tcp://host:4840")),
//!         ]
//!         .into_iter()
//!         .collect(),
//!     )?;
//!     let mut stream = BinaryStream::new();
//!     registry.encode(&request, &mut stream)?;
//!     stream.rewind();
//!     let decoded = registry.decode("ChannelRequest", &mut stream)?;
//!     assert_eq!(decoded.get_as::<u32>("requestHandle"), Some(7));
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! | Layer | Role |
//! |-------|------|
//! | [`SchemaRegistry`] | Descriptor store, name resolution, correctness checks |
//! | [`TypeRegistry`] | Lazy compilation, write-once publish, decode-by-name/id |
//! | [`TypeDefinition`] | Compiled field plans over an explicit base chain |
//! | [`ObjectInstance`] | Field-name to value mapping tagged with its type |
//! | [`BinaryStream`] | Position-tracked byte cursor the codecs run over |
//!
//! Encode and decode walk the compiled chain in identical order: base
//! fields first, then own fields in declaration order. Compilation happens
//! once per type name; after the schema-load phase all codec paths are
//! lock-free and safe to run concurrently, one stream and one instance per
//! call.

mod basic_types;
mod codec;
mod compiler;
mod enumeration;
mod ids;
mod object;
mod registry;
mod schema;
mod stream;
mod typedef;
mod value;

pub use basic_types::BasicType;
pub use codec::{decode, decode_debug, encode, EncodeError};
pub use enumeration::{CoercionError, EnumDescriptor, EnumMember};
pub use ids::{EncodingIds, IdAllocator, IdTable, SchemaId, RUNTIME_ID_BASE};
pub use object::{ObjectInstance, ValidationError};
pub use registry::{TypeRegistry, BASE_OBJECT};
pub use schema::{
    DefaultValue, FieldCategory, FieldSchema, Resolved, SchemaError, SchemaRegistry,
    StructuredTypeSchema,
};
pub use stream::{BinaryStream, DecodeError};
pub use typedef::{CompiledField, ElementPlan, FieldPlan, TypeDefinition, TypeLink};
pub use value::{FromValue, NodeId, Value, ValueMap};

use std::fmt;

/// Crate-wide error, one variant per failure family.
#[derive(Debug)]
pub enum Error {
    Schema(SchemaError),
    Coercion(CoercionError),
    Validation(ValidationError),
    Encode(EncodeError),
    Decode(DecodeError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(e) => e.fmt(f),
            Self::Coercion(e) => e.fmt(f),
            Self::Validation(e) => e.fmt(f),
            Self::Encode(e) => e.fmt(f),
            Self::Decode(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for Error {}

impl From<SchemaError> for Error {
    fn from(e: SchemaError) -> Self {
        Self::Schema(e)
    }
}

impl From<CoercionError> for Error {
    fn from(e: CoercionError) -> Self {
        Self::Coercion(e)
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<EncodeError> for Error {
    fn from(e: EncodeError) -> Self {
        Self::Encode(e)
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
