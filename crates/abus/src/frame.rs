// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Frame validator
//!
//! ```text
//! offset        size        field
//! 0             2           magic 0xAA 0x55
//! 2             2           length (payload length)
//! 4             4           from (sender NAD)
//! 8             4           to (0 = broadcast)
//! 12            1           direction (1 = socket record)
//! 13            1           type (socket id)
//! 14            length-4    positional payload
//! 14+length-4   2           timestamp / correlation id
//! 14+length-2   2           checksum over [0, 14+length-2)
//! ```

use crate::error::FrameError;
use crate::wire::{calc_crc, get_u16};

/// Frame start marker
pub const MAGIC: [u8; 2] = [0xAA, 0x55];

/// Bytes of a frame not counted by the length field (fixed prefix + checksum)
pub const FRAME_OVERHEAD: usize = 14;

/// Offset of the first payload byte
pub const PAYLOAD_OFFSET: usize = 14;

/// Bytes at the end of the declared length reserved for timestamp + checksum
pub const TRAILER_LEN: usize = 4;

/// Check a received buffer for structural correctness.
///
/// Checks run in order: minimum size, magic, declared length, checksum.
/// The first failing check is reported.
pub fn check_frame(frame: &[u8]) -> Result<(), FrameError> {
    let len = frame.len();
    if len <= FRAME_OVERHEAD {
        return Err(FrameError::TooShort { len });
    }

    if frame[..2] != MAGIC {
        return Err(FrameError::BadMagic {
            found: [frame[0], frame[1]],
        });
    }

    let declared = get_u16(frame, 2);
    if len != usize::from(declared) + FRAME_OVERHEAD {
        return Err(FrameError::LengthMismatch {
            declared,
            actual: len,
        });
    }

    let computed = calc_crc(&frame[..len - 2]);
    let stored = get_u16(frame, len - 2);
    if computed != stored {
        return Err(FrameError::ChecksumMismatch { computed, stored });
    }

    Ok(())
}

/// Boolean form of [`check_frame`]
pub fn is_valid_frame(frame: &[u8]) -> bool {
    check_frame(frame).is_ok()
}
