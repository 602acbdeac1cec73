// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record codec - positional payload encode/decode
//!
//! Fields are laid out from [`PAYLOAD_OFFSET`] in group order: bits (1 byte),
//! ints (2 bytes), longs (4 bytes), reals (4 bytes). Each group starts where
//! the previous one ended and is indexed from 0.

use crate::error::{AbusError, Result};
use crate::frame::{PAYLOAD_OFFSET, TRAILER_LEN};
use crate::header::Header;
use crate::record::{Record, Shape};
use crate::wire;
use crate::MAX_FRAME_LEN;

/// Decode the payload of a validated socket frame using `shape`.
///
/// Returns a record with `valid == false` and no field data when the header
/// does not announce a socket frame for `shape` or when `header.length`
/// disagrees with the shape's payload length. A shape with socket id 0 accepts
/// any socket frame.
pub fn decode_record(frame: &[u8], header: &Header, shape: &Shape) -> Record {
    let mut record = Record {
        shape: Shape {
            socket_id: header.type_id,
            ..Shape::default()
        },
        sender: header.from,
        ..Record::default()
    };

    let id_matches = shape.socket_id == 0 || shape.socket_id == header.type_id;
    if !header.is_socket() || !id_matches {
        return record;
    }
    if usize::from(header.length) != shape.payload_len() {
        return record;
    }

    match read_fields(frame, shape, &mut record) {
        Ok(()) => {
            record.shape = Shape {
                socket_id: header.type_id,
                ..*shape
            };
            record.valid = true;
        }
        Err(_) => {
            // Length field lied about the datagram; never hand out partial data
            record.bits.clear();
            record.ints.clear();
            record.longs.clear();
            record.reals.clear();
        }
    }
    record
}

fn read_fields(frame: &[u8], shape: &Shape, record: &mut Record) -> Result<()> {
    let mut pos = PAYLOAD_OFFSET;

    record.bits.reserve(usize::from(shape.bit_count));
    for _ in 0..shape.bit_count {
        record.bits.push(wire::read_bool(frame, pos)?);
        pos += 1;
    }
    record.ints.reserve(usize::from(shape.int_count));
    for _ in 0..shape.int_count {
        record.ints.push(wire::read_i16(frame, pos)?);
        pos += 2;
    }
    record.longs.reserve(usize::from(shape.long_count));
    for _ in 0..shape.long_count {
        record.longs.push(wire::read_i32(frame, pos)?);
        pos += 4;
    }
    record.reals.reserve(usize::from(shape.real_count));
    for _ in 0..shape.real_count {
        record.reals.push(wire::read_f32(frame, pos)?);
        pos += 4;
    }
    Ok(())
}

/// Write the record's fields into `buf` starting at the payload offset.
///
/// # Returns
///
/// Offset just past the last field (where the timestamp slot begins)
pub fn encode_record(buf: &mut [u8], record: &Record) -> Result<usize> {
    let end = PAYLOAD_OFFSET + record.payload_len() - TRAILER_LEN;
    if buf.len() < end {
        return Err(AbusError::BufferTooSmall {
            needed: end,
            available: buf.len(),
        });
    }

    let mut pos = PAYLOAD_OFFSET;
    for &bit in &record.bits {
        wire::write_bool(buf, pos, bit)?;
        pos += 1;
    }
    for &value in &record.ints {
        wire::write_i16(buf, pos, value)?;
        pos += 2;
    }
    for &value in &record.longs {
        wire::write_i32(buf, pos, value)?;
        pos += 4;
    }
    for &value in &record.reals {
        wire::write_f32(buf, pos, value)?;
        pos += 4;
    }
    Ok(pos)
}

/// Build a complete socket frame for `record`: header, payload, timestamp
/// and checksum.
///
/// The sender is taken from `record.sender` as is; substituting a default
/// NAD is the caller's business.
///
/// # Returns
///
/// Total frame length
pub fn encode_frame(buf: &mut [u8], record: &Record, to: u32, timestamp_id: u16) -> Result<usize> {
    let frame_len = record.frame_len();
    if frame_len > MAX_FRAME_LEN {
        return Err(AbusError::FrameTooLarge {
            len: frame_len,
            max: MAX_FRAME_LEN,
        });
    }
    let length = u16::try_from(record.payload_len()).map_err(|_| AbusError::FrameTooLarge {
        len: frame_len,
        max: MAX_FRAME_LEN,
    })?;

    let mut header = Header::socket(record.socket_id(), record.sender, to, length);
    header.timestamp_id = timestamp_id;

    let written = header.encode(buf)?;
    encode_record(buf, record)?;

    let crc_pos = written - 2;
    let crc = wire::calc_crc(&buf[..crc_pos]);
    wire::write_u16(buf, crc_pos, crc)?;

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::check_frame;

    fn sample_record() -> Record {
        let mut record = Record::new(5).with_sender(8266);
        record.append_bit(true);
        record
    }

    #[test]
    fn test_encode_sample_frame() {
        let mut buf = [0u8; MAX_FRAME_LEN];
        let len = encode_frame(&mut buf, &sample_record(), 0, 0).unwrap();

        assert_eq!(len, 19);
        assert_eq!(
            buf[..len],
            [
                0xAA, 0x55, 0x05, 0x00, 0x4A, 0x20, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
                0x05, 0x01, 0x00, 0x00, 0x2F, 0xC7
            ]
        );
        assert_eq!(check_frame(&buf[..len]), Ok(()));
    }

    #[test]
    fn test_group_offsets() {
        let mut record = Record::new(9).with_sender(1);
        record.append_bit(false);
        record.append_bit(true);
        record.append_int(0x0102);
        record.append_long(-1);
        record.append_real(1.0);

        let mut buf = [0u8; 64];
        let end = encode_record(&mut buf, &record).unwrap();
        assert_eq!(end, 14 + 2 + 2 + 4 + 4);
        assert_eq!(buf[14..16], [0x00, 0x01]);
        assert_eq!(buf[16..18], [0x02, 0x01]);
        assert_eq!(buf[18..22], [0xFF; 4]);
        assert_eq!(buf[22..26], 1.0f32.to_le_bytes());
    }

    #[test]
    fn test_decode_matching_shape() {
        let mut record = Record::new(3).with_sender(42);
        record.append_int(-300);
        record.append_long(70_000);
        record.append_real(-2.25);

        let mut buf = [0u8; MAX_FRAME_LEN];
        let len = encode_frame(&mut buf, &record, 0, 9).unwrap();
        let frame = &buf[..len];
        let header = Header::decode(frame);

        let decoded = decode_record(frame, &header, &Shape::new(3, 0, 1, 1, 1));
        assert!(decoded.valid);
        assert_eq!(decoded.sender, 42);
        assert_eq!(decoded.ints, vec![-300]);
        assert_eq!(decoded.longs, vec![70_000]);
        assert_eq!(decoded.reals, vec![-2.25]);
        assert_eq!(decoded.shape, record.shape);
    }

    #[test]
    fn test_decode_length_mismatch_is_invalid() {
        let mut buf = [0u8; MAX_FRAME_LEN];
        let len = encode_frame(&mut buf, &sample_record(), 0, 0).unwrap();
        let frame = &buf[..len];
        let header = Header::decode(frame);

        let decoded = decode_record(frame, &header, &Shape::new(5, 0, 1, 0, 0));
        assert!(!decoded.valid);
        assert!(decoded.bits.is_empty() && decoded.ints.is_empty());
        assert_eq!(decoded.shape, Shape::new(5, 0, 0, 0, 0));
        assert_eq!(decoded.sender, 8266);
    }

    #[test]
    fn test_decode_rejects_other_socket_and_non_socket() {
        let mut buf = [0u8; MAX_FRAME_LEN];
        let len = encode_frame(&mut buf, &sample_record(), 0, 0).unwrap();
        let frame = &buf[..len];
        let mut header = Header::decode(frame);

        assert!(!decode_record(frame, &header, &Shape::new(6, 1, 0, 0, 0)).valid);

        header.direction = 2;
        assert!(!decode_record(frame, &header, &Shape::new(5, 1, 0, 0, 0)).valid);
    }

    #[test]
    fn test_wildcard_shape_takes_header_id() {
        let mut buf = [0u8; MAX_FRAME_LEN];
        let len = encode_frame(&mut buf, &sample_record(), 0, 0).unwrap();
        let frame = &buf[..len];
        let header = Header::decode(frame);

        let decoded = decode_record(frame, &header, &Shape::new(0, 1, 0, 0, 0));
        assert!(decoded.valid);
        assert_eq!(decoded.shape.socket_id, 5);
        assert_eq!(decoded.bits, vec![true]);
    }

    #[test]
    fn test_decode_truncated_buffer_is_invalid() {
        let mut buf = [0u8; MAX_FRAME_LEN];
        let len = encode_frame(&mut buf, &sample_record(), 0, 0).unwrap();
        let header = Header::decode(&buf[..len]);

        // Header claims one bit but the slice stops before the payload
        let decoded = decode_record(&buf[..14], &header, &Shape::new(5, 1, 0, 0, 0));
        assert!(!decoded.valid);
        assert!(decoded.bits.is_empty());
    }

    #[test]
    fn test_encode_frame_too_large() {
        let mut record = Record::new(1).with_sender(1);
        for _ in 0..60 {
            record.append_real(1.0);
        }
        let mut buf = [0u8; 512];
        assert!(matches!(
            encode_frame(&mut buf, &record, 0, 0),
            Err(AbusError::FrameTooLarge { len: 258, max: 255 })
        ));
    }

    #[test]
    fn test_encode_frame_small_buffer() {
        let mut buf = [0u8; 18];
        assert!(matches!(
            encode_frame(&mut buf, &sample_record(), 0, 0),
            Err(AbusError::BufferTooSmall {
                needed: 19,
                available: 18
            })
        ));
    }
}
