// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Position-tracked byte cursor for wire encoding/decoding.
//!
//! Writes append little-endian bytes to a growable buffer; reads are
//! bounds-checked against the remaining bytes.

use crate::schema::SchemaError;
use std::fmt;

/// Errors raised while decoding from a stream.
#[derive(Debug)]
pub enum DecodeError {
    Truncated { need: usize, have: usize },
    InvalidData(String),
    Utf8(std::string::FromUtf8Error),
    UnknownTypeId(u32),
    Schema(SchemaError),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { need, have } => {
                write!(f, "stream truncated: need {} bytes, have {}", need, have)
            }
            Self::InvalidData(msg) => write!(f, "invalid data: {}", msg),
            Self::Utf8(e) => write!(f, "invalid utf-8: {}", e),
            Self::UnknownTypeId(id) => write!(f, "no type registered for binary id {}", id),
            Self::Schema(e) => write!(f, "schema error during decode: {}", e),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<std::string::FromUtf8Error> for DecodeError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Self::Utf8(e)
    }
}

impl From<SchemaError> for DecodeError {
    fn from(e: SchemaError) -> Self {
        Self::Schema(e)
    }
}

/// Generate write methods for fixed-width primitives.
///
/// Each generated method converts the value via `to_le_bytes()` and appends
/// it at the end of the buffer.
macro_rules! impl_write_le {
    ($name:ident, $type:ty) => {
        pub fn $name(&mut self, value: $type) {
            self.buffer.extend_from_slice(&value.to_le_bytes());
        }
    };
}

/// Generate read methods for fixed-width primitives.
///
/// Each generated method:
/// 1. Checks remaining bytes (returns `DecodeError::Truncated` on overflow)
/// 2. Converts bytes to value via `from_le_bytes()`
/// 3. Advances the position
macro_rules! impl_read_le {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> Result<$type, DecodeError> {
            if self.pos + $size > self.buffer.len() {
                return Err(DecodeError::Truncated {
                    need: $size,
                    have: self.remaining(),
                });
            }
            let mut bytes = [0u8; $size];
            bytes.copy_from_slice(&self.buffer[self.pos..self.pos + $size]);
            self.pos += $size;
            Ok(<$type>::from_le_bytes(bytes))
        }
    };
}

/// Byte stream with a single read position; writes always append.
#[derive(Debug, Default)]
pub struct BinaryStream {
    buffer: Vec<u8>,
    pos: usize,
}

impl BinaryStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap received bytes for decoding, read position at the start.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            buffer: bytes,
            pos: 0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.pos)
    }

    /// Reset the read position to the start of the buffer.
    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    impl_write_le!(write_u8, u8);
    impl_write_le!(write_i8, i8);
    impl_write_le!(write_u16, u16);
    impl_write_le!(write_i16, i16);
    impl_write_le!(write_u32, u32);
    impl_write_le!(write_i32, i32);
    impl_write_le!(write_u64, u64);
    impl_write_le!(write_i64, i64);

    pub fn write_f32(&mut self, value: f32) {
        self.write_u32(value.to_bits());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.write_u64(value.to_bits());
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    impl_read_le!(read_u8, u8, 1);
    impl_read_le!(read_i8, i8, 1);
    impl_read_le!(read_u16, u16, 2);
    impl_read_le!(read_i16, i16, 2);
    impl_read_le!(read_u32, u32, 4);
    impl_read_le!(read_i32, i32, 4);
    impl_read_le!(read_u64, u64, 8);
    impl_read_le!(read_i64, i64, 8);

    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&[u8], DecodeError> {
        if self.pos + count > self.buffer.len() {
            return Err(DecodeError::Truncated {
                need: count,
                have: self.remaining(),
            });
        }
        let slice = &self.buffer[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }
}
