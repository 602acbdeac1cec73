// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record model - shapes and typed socket records

use serde::{Deserialize, Serialize};

use crate::frame::{FRAME_OVERHEAD, TRAILER_LEN};

/// Positional layout of a socket's payload, agreed out-of-band per socket id.
///
/// Payload order is all bits (1 byte each), then ints (2 bytes), longs
/// (4 bytes) and reals (4 bytes). Nothing on the wire describes the layout;
/// the only check is that the frame's length field matches
/// [`Shape::payload_len`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Shape {
    /// Socket id (frame `type`); 0 is a wildcard for direct decoding only
    pub socket_id: u8,
    /// Number of boolean fields
    #[serde(default)]
    pub bit_count: u8,
    /// Number of i16 fields
    #[serde(default)]
    pub int_count: u8,
    /// Number of i32 fields
    #[serde(default)]
    pub long_count: u8,
    /// Number of f32 fields
    #[serde(default)]
    pub real_count: u8,
}

impl Shape {
    /// Create a new shape
    pub const fn new(
        socket_id: u8,
        bit_count: u8,
        int_count: u8,
        long_count: u8,
        real_count: u8,
    ) -> Self {
        Self {
            socket_id,
            bit_count,
            int_count,
            long_count,
            real_count,
        }
    }

    /// Total number of fields
    pub const fn field_count(&self) -> usize {
        self.bit_count as usize
            + self.int_count as usize
            + self.long_count as usize
            + self.real_count as usize
    }

    /// Bytes occupied by the fields
    pub const fn field_bytes(&self) -> usize {
        self.bit_count as usize
            + self.int_count as usize * 2
            + self.long_count as usize * 4
            + self.real_count as usize * 4
    }

    /// Value of the header length field for a frame of this shape
    pub const fn payload_len(&self) -> usize {
        self.field_bytes() + TRAILER_LEN
    }

    /// Total frame size for this shape
    pub const fn frame_len(&self) -> usize {
        self.payload_len() + FRAME_OVERHEAD
    }
}

/// One decoded or to-be-encoded socket record.
///
/// Field identity is positional: `ints[2]` is the third int of the socket,
/// there are no names on the wire. Records produced by decoding carry
/// `valid == false` when the frame did not match the expected shape; such
/// records have empty field vectors and must not be used.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Record {
    /// Socket id and field counts
    pub shape: Shape,
    /// Sender NAD (0 on outbound records = use the endpoint's own NAD)
    pub sender: u32,
    /// Whether decoding succeeded
    pub valid: bool,
    /// Boolean fields
    pub bits: Vec<bool>,
    /// i16 fields
    pub ints: Vec<i16>,
    /// i32 fields
    pub longs: Vec<i32>,
    /// f32 fields
    pub reals: Vec<f32>,
}

impl Record {
    /// Create an empty outbound record for `socket_id`
    pub fn new(socket_id: u8) -> Self {
        Self {
            shape: Shape {
                socket_id,
                ..Shape::default()
            },
            ..Self::default()
        }
    }

    /// Set the sender NAD
    pub fn with_sender(mut self, sender: u32) -> Self {
        self.sender = sender;
        self
    }

    /// Socket id
    pub const fn socket_id(&self) -> u8 {
        self.shape.socket_id
    }

    /// Append a boolean field
    pub fn append_bit(&mut self, value: bool) {
        self.bits.push(value);
        self.shape.bit_count = saturating_count(self.bits.len());
    }

    /// Append an i16 field
    pub fn append_int(&mut self, value: i16) {
        self.ints.push(value);
        self.shape.int_count = saturating_count(self.ints.len());
    }

    /// Append an i32 field
    pub fn append_long(&mut self, value: i32) {
        self.longs.push(value);
        self.shape.long_count = saturating_count(self.longs.len());
    }

    /// Append an f32 field. NaN is stored as `0.0`.
    pub fn append_real(&mut self, value: f32) {
        self.reals.push(if value.is_nan() { 0.0 } else { value });
        self.shape.real_count = saturating_count(self.reals.len());
    }

    /// Number of fields actually held
    pub fn field_count(&self) -> usize {
        self.bits.len() + self.ints.len() + self.longs.len() + self.reals.len()
    }

    /// Header length field needed to carry the held fields
    pub fn payload_len(&self) -> usize {
        self.bits.len()
            + self.ints.len() * 2
            + self.longs.len() * 4
            + self.reals.len() * 4
            + TRAILER_LEN
    }

    /// Total frame size needed to carry the held fields
    pub fn frame_len(&self) -> usize {
        self.payload_len() + FRAME_OVERHEAD
    }
}

// Field counts live in a u8 on the wire shape; oversized records are caught
// by the frame size check when encoding.
fn saturating_count(len: usize) -> u8 {
    u8::try_from(len).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_sizes() {
        let shape = Shape::new(4, 5, 1, 0, 6);
        assert_eq!(shape.field_count(), 12);
        assert_eq!(shape.field_bytes(), 5 + 2 + 24);
        assert_eq!(shape.payload_len(), 35);
        assert_eq!(shape.frame_len(), 49);

        assert_eq!(Shape::new(5, 1, 0, 0, 0).payload_len(), 5);
        assert_eq!(Shape::new(5, 1, 0, 0, 0).frame_len(), 19);
    }

    #[test]
    fn test_append_updates_shape() {
        let mut record = Record::new(22).with_sender(8266);
        record.append_bit(true);
        record.append_bit(false);
        record.append_int(-7);
        record.append_long(100_000);
        record.append_real(1.5);

        assert_eq!(record.shape, Shape::new(22, 2, 1, 1, 1));
        assert_eq!(record.bits, vec![true, false]);
        assert_eq!(record.ints, vec![-7]);
        assert_eq!(record.longs, vec![100_000]);
        assert_eq!(record.reals, vec![1.5]);
        assert_eq!(record.field_count(), 5);
        assert_eq!(record.payload_len(), record.shape.payload_len());
        assert_eq!(record.sender, 8266);
        assert!(!record.valid);
    }

    #[test]
    fn test_nan_real_is_coerced() {
        let mut record = Record::new(1);
        record.append_real(f32::NAN);
        record.append_real(f32::INFINITY);

        assert_eq!(record.reals[0].to_bits(), 0.0f32.to_bits());
        assert_eq!(record.reals[1], f32::INFINITY);
        assert_eq!(record.shape.real_count, 2);
    }

    #[test]
    fn test_count_saturates() {
        let mut record = Record::new(1);
        for _ in 0..300 {
            record.append_bit(true);
        }
        assert_eq!(record.shape.bit_count, u8::MAX);
        assert_eq!(record.bits.len(), 300);
    }
}
