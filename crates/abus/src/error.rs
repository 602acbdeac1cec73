// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for Abus

use thiserror::Error;

use crate::config::ConfigError;

/// Result type for Abus operations
pub type Result<T> = core::result::Result<T, AbusError>;

/// Reason a received buffer was rejected by the frame validator.
///
/// The public validation contract is a single boolean (see
/// [`crate::frame::is_valid_frame`]); this type keeps the individual causes
/// apart for diagnostics and counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Buffer does not even hold the fixed prefix and trailer.
    #[error("frame too short ({len} bytes)")]
    TooShort {
        /// Received length
        len: usize,
    },

    /// First two bytes are not `0xAA 0x55`.
    #[error("invalid magic {found:02X?}")]
    BadMagic {
        /// The two bytes found at offset 0
        found: [u8; 2],
    },

    /// Received length disagrees with the length field.
    #[error("invalid frame length: declared {declared} (+14), received {actual}")]
    LengthMismatch {
        /// Payload length read at offset 2
        declared: u16,
        /// Received buffer length
        actual: usize,
    },

    /// Trailer checksum does not match the computed one.
    #[error("invalid checksum: computed {computed:#06x}, stored {stored:#06x}")]
    ChecksumMismatch {
        /// Checksum over the received bytes
        computed: u16,
        /// Checksum carried in the frame trailer
        stored: u16,
    },
}

/// Error type for Abus
#[derive(Debug, Error)]
pub enum AbusError {
    /// A typed read or write would leave the buffer.
    #[error("access of {width} bytes at offset {pos} outside buffer of {len} bytes")]
    OutOfBounds {
        /// Requested offset
        pos: usize,
        /// Width of the accessed value
        width: usize,
        /// Buffer length
        len: usize,
    },

    /// Output buffer cannot hold the frame being built.
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes required
        needed: usize,
        /// Bytes available
        available: usize,
    },

    /// Inbound frame failed validation.
    #[error("malformed frame: {0}")]
    Frame(#[from] FrameError),

    /// Outbound record has socket id 0.
    #[error("record has no socket id")]
    MissingSocketId,

    /// Outbound record has no sender and no default NAD is configured.
    #[error("record has no sender and no own NAD is configured")]
    MissingSender,

    /// Outbound record carries no fields at all.
    #[error("record carries no data")]
    EmptyRecord,

    /// Encoded frame would exceed the protocol's datagram size.
    #[error("frame of {len} bytes exceeds maximum of {max}")]
    FrameTooLarge {
        /// Encoded frame length
        len: usize,
        /// Maximum frame length
        max: usize,
    },

    /// All subscription slots are in use.
    #[error("subscription table full")]
    RegistryFull,

    /// Transport I/O failure.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
