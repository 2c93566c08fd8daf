//! Reconstruction of typed scalars from raw Modbus responses.
//!
//! The two wire paths surface different raw shapes: register functions
//! return 16-bit words, bit functions return a packed byte stream. Both are
//! first normalized to a flat byte buffer (low byte then high byte of each
//! word, in order), then a single gather applies the tag's byte-layout
//! permutation, so equivalent inputs decode identically on both paths.
//!
//! A format token addresses the target byte as the high/low half of
//! consecutive little-endian 16-bit words: token `t` lands on little-endian
//! byte position `t ^ 1`. With words `[0x4048, 0xF5C3]` and format
//! `"3_2_1_0"` this yields the IEEE-754 bits of `3.14f32`.

use crate::error::DecodeError;
use crate::sample::ScalarValue;
use crate::tag::{ByteFormat, DataType};

/// Raw response of a single wire transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    /// Register reads: one 16-bit word per register.
    Words(Vec<u16>),
    /// Coil/discrete-input reads: bits packed LSB-first into bytes.
    Packed(Vec<u8>),
}

impl RawPayload {
    /// Packs coil/discrete-input bits LSB-first, as they travel on the wire.
    pub fn from_bits(bits: &[bool]) -> Self {
        let mut bytes = vec![0u8; bits.len().div_ceil(8)];
        for (i, bit) in bits.iter().enumerate() {
            if *bit {
                bytes[i / 8] |= 1 << (i % 8);
            }
        }
        Self::Packed(bytes)
    }

    fn normalize(&self) -> Vec<u8> {
        match self {
            Self::Words(words) => {
                let mut bytes = Vec::with_capacity(words.len() * 2);
                for word in words {
                    bytes.push(*word as u8);
                    bytes.push((*word >> 8) as u8);
                }
                bytes
            }
            Self::Packed(bytes) => bytes.clone(),
        }
    }
}

/// Decodes a raw response into a typed scalar using the tag's byte layout.
pub fn decode_value(
    payload: &RawPayload,
    data_type: DataType,
    format: &ByteFormat,
) -> Result<ScalarValue, DecodeError> {
    let bytes = payload.normalize();
    if bytes.is_empty() {
        return Err(DecodeError::EmptyPayload(data_type.to_string()));
    }

    // Bool bypasses the permutation: first payload byte, zero or not.
    if data_type == DataType::Bool {
        return Ok(ScalarValue::UInt(u64::from(bytes[0] != 0)));
    }

    let width = data_type.byte_width();
    if bytes.len() < width {
        return Err(DecodeError::ShortPayload {
            data_type: data_type.to_string(),
            want: width,
            got: bytes.len(),
        });
    }

    let mut ordered = [0u8; 8];
    for (i, token) in format.as_slice().iter().enumerate() {
        ordered[usize::from(token ^ 1)] = bytes[i];
    }

    let pair = [ordered[0], ordered[1]];
    let quad = [ordered[0], ordered[1], ordered[2], ordered[3]];
    let value = match data_type {
        DataType::Bool => ScalarValue::UInt(u64::from(bytes[0] != 0)),
        DataType::Word => ScalarValue::UInt(u64::from(u16::from_le_bytes(pair))),
        DataType::ShortInt => ScalarValue::Int(i64::from(i16::from_le_bytes(pair))),
        DataType::Integer => ScalarValue::Int(i64::from(i32::from_le_bytes(quad))),
        DataType::DWord => ScalarValue::UInt(u64::from(u32::from_le_bytes(quad))),
        DataType::Float => ScalarValue::Float(f64::from(f32::from_le_bytes(quad))),
        DataType::Int64 => ScalarValue::Int(i64::from_le_bytes(ordered)),
        DataType::Double => ScalarValue::Float(f64::from_le_bytes(ordered)),
    };

    Ok(value)
}
