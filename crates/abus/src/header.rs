// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Abus frame header

use crate::error::{AbusError, Result};
use crate::frame::{FRAME_OVERHEAD, MAGIC, TRAILER_LEN};
use crate::wire;

/// Direction value marking a socket record frame
pub const DIRECTION_SOCKET: u8 = 1;

/// Abus frame header
///
/// Fields are spread over the fixed 14-byte prefix and the 2-byte timestamp
/// slot that precedes the checksum (see [`crate::frame`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    /// Payload length (fields + timestamp + checksum)
    pub length: u16,
    /// Timestamp / correlation id
    pub timestamp_id: u16,
    /// Sender NAD
    pub from: u32,
    /// Destination NAD (0 = broadcast)
    pub to: u32,
    /// Direction (1 = socket record)
    pub direction: u8,
    /// Frame type; for socket frames this is the socket id
    pub type_id: u8,
}

impl Header {
    /// Header of a socket record frame
    pub const fn socket(socket_id: u8, from: u32, to: u32, length: u16) -> Self {
        Self {
            length,
            timestamp_id: 0,
            from,
            to,
            direction: DIRECTION_SOCKET,
            type_id: socket_id,
        }
    }

    /// Whether this header announces a socket record
    pub const fn is_socket(&self) -> bool {
        self.direction == DIRECTION_SOCKET && self.type_id > 0
    }

    /// Total frame size implied by `length`
    pub const fn frame_len(&self) -> usize {
        self.length as usize + FRAME_OVERHEAD
    }

    /// Decode the header of a frame.
    ///
    /// `direction`, `type_id` and `timestamp_id` are only read when `length`
    /// is large enough to contain them (> 2, > 3 and > 4 respectively), so
    /// truncated non-socket frames still yield a partial header. Bytes
    /// outside `frame` read as zero.
    pub fn decode(frame: &[u8]) -> Self {
        let mut header = Self {
            length: wire::get_u16(frame, 2),
            from: wire::get_u32(frame, 4),
            to: wire::get_u32(frame, 8),
            ..Self::default()
        };
        if header.length > 2 {
            header.direction = wire::read_u8(frame, 12).unwrap_or(0);
        }
        if header.length > 3 {
            header.type_id = wire::read_u8(frame, 13).unwrap_or(0);
        }
        if header.length > 4 {
            header.timestamp_id = frame
                .len()
                .checked_sub(TRAILER_LEN)
                .map_or(0, |pos| wire::get_u16(frame, pos));
        }
        header
    }

    /// Encode the header into `buf`.
    ///
    /// Writes magic, length, addresses, direction, type and the timestamp
    /// slot. Nothing is written unless `buf` holds the complete frame
    /// announced by `length`.
    ///
    /// # Returns
    ///
    /// Total frame length
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let frame_len = self.frame_len();
        if usize::from(self.length) < TRAILER_LEN || buf.len() < frame_len {
            return Err(AbusError::BufferTooSmall {
                needed: frame_len.max(FRAME_OVERHEAD + TRAILER_LEN),
                available: buf.len(),
            });
        }

        buf[..2].copy_from_slice(&MAGIC);
        wire::write_u16(buf, 2, self.length)?;
        wire::write_u32(buf, 4, self.from)?;
        wire::write_u32(buf, 8, self.to)?;
        wire::write_u8(buf, 12, self.direction)?;
        wire::write_u8(buf, 13, self.type_id)?;
        wire::write_u16(buf, frame_len - TRAILER_LEN, self.timestamp_id)?;

        Ok(frame_len)
    }
}
