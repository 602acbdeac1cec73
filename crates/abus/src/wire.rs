// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire codec - typed little-endian access at explicit byte offsets
//!
//! Two layers over the same bounds discipline:
//!
//! - `read_*` / `write_*` return [`Result`] and report [`AbusError::OutOfBounds`]
//!   when the value does not fit in the slice. Used internally by the codecs.
//! - `get_*` / `set_*` never fail: out-of-range reads yield `0` / `false`,
//!   out-of-range writes are ignored. This is the behaviour deployed peers
//!   rely on for best-effort parsing.
//!
//! Neither layer ever indexes outside the slice, so malformed input cannot panic.
//! The caller's notion of "datagram length" is the slice length; pass
//! `&buf[..len]` when only a prefix of a larger buffer is valid.
//!
//! Floats are stored as their raw IEEE-754 bits (little-endian), so a value
//! read back is bit-identical to the value written.

use crate::error::{AbusError, Result};

/// Multipliers of the frame checksum, indexed by `byte position % 16`.
pub const PRIME_TABLE: [u16; 16] = [
    0x049D, 0x0C07, 0x1591, 0x1ACF, 0x1D4B, 0x202D, 0x2507, 0x2B4B, 0x34A5, 0x38C5, 0x3D3F,
    0x4445, 0x4D0F, 0x538F, 0x5FB3, 0x6BBF,
];

/// Calculate the Abus checksum of `data`.
///
/// `sum((byte ^ 0x5A) * PRIME_TABLE[i % 16]) mod 2^16`. Not cryptographic,
/// only a transmission error detector, but it has to match the deployed
/// peers bit for bit.
pub fn calc_crc(data: &[u8]) -> u16 {
    data.iter().enumerate().fold(0u16, |crc, (index, &byte)| {
        let term = u32::from(byte ^ 0x5A) * u32::from(PRIME_TABLE[index & 0x0F]);
        crc.wrapping_add((term & 0xFFFF) as u16)
    })
}

fn out_of_bounds(buf_len: usize, pos: usize, width: usize) -> AbusError {
    AbusError::OutOfBounds {
        pos,
        width,
        len: buf_len,
    }
}

fn span<const N: usize>(buf: &[u8], pos: usize) -> Result<[u8; N]> {
    pos.checked_add(N)
        .and_then(|end| buf.get(pos..end))
        .and_then(|bytes| <[u8; N]>::try_from(bytes).ok())
        .ok_or_else(|| out_of_bounds(buf.len(), pos, N))
}

fn span_mut<const N: usize>(buf: &mut [u8], pos: usize) -> Result<&mut [u8; N]> {
    let len = buf.len();
    pos.checked_add(N)
        .and_then(|end| buf.get_mut(pos..end))
        .and_then(|bytes| <&mut [u8; N]>::try_from(bytes).ok())
        .ok_or_else(|| out_of_bounds(len, pos, N))
}

// ---------------------------------------------------------------------------
// Checked reads
// ---------------------------------------------------------------------------

/// Read one raw byte
pub fn read_u8(buf: &[u8], pos: usize) -> Result<u8> {
    span::<1>(buf, pos).map(|[b]| b)
}

/// Read a boolean (any non-zero byte is `true`)
pub fn read_bool(buf: &[u8], pos: usize) -> Result<bool> {
    read_u8(buf, pos).map(|b| b > 0)
}

/// Read a little-endian i16
pub fn read_i16(buf: &[u8], pos: usize) -> Result<i16> {
    span(buf, pos).map(i16::from_le_bytes)
}

/// Read a little-endian u16
pub fn read_u16(buf: &[u8], pos: usize) -> Result<u16> {
    span(buf, pos).map(u16::from_le_bytes)
}

/// Read a little-endian i32
pub fn read_i32(buf: &[u8], pos: usize) -> Result<i32> {
    span(buf, pos).map(i32::from_le_bytes)
}

/// Read a little-endian u32
pub fn read_u32(buf: &[u8], pos: usize) -> Result<u32> {
    span(buf, pos).map(u32::from_le_bytes)
}

/// Read an IEEE-754 single from its raw little-endian bits
pub fn read_f32(buf: &[u8], pos: usize) -> Result<f32> {
    span(buf, pos).map(f32::from_le_bytes)
}

// ---------------------------------------------------------------------------
// Checked writes
// ---------------------------------------------------------------------------

/// Write one raw byte
pub fn write_u8(buf: &mut [u8], pos: usize, value: u8) -> Result<()> {
    *span_mut::<1>(buf, pos)? = [value];
    Ok(())
}

/// Write a boolean as `0x00` / `0x01`
pub fn write_bool(buf: &mut [u8], pos: usize, value: bool) -> Result<()> {
    write_u8(buf, pos, u8::from(value))
}

/// Write a little-endian i16
pub fn write_i16(buf: &mut [u8], pos: usize, value: i16) -> Result<()> {
    *span_mut(buf, pos)? = value.to_le_bytes();
    Ok(())
}

/// Write a little-endian u16
pub fn write_u16(buf: &mut [u8], pos: usize, value: u16) -> Result<()> {
    *span_mut(buf, pos)? = value.to_le_bytes();
    Ok(())
}

/// Write a little-endian i32
pub fn write_i32(buf: &mut [u8], pos: usize, value: i32) -> Result<()> {
    *span_mut(buf, pos)? = value.to_le_bytes();
    Ok(())
}

/// Write a little-endian u32
pub fn write_u32(buf: &mut [u8], pos: usize, value: u32) -> Result<()> {
    *span_mut(buf, pos)? = value.to_le_bytes();
    Ok(())
}

/// Write the raw bits of an IEEE-754 single
pub fn write_f32(buf: &mut [u8], pos: usize, value: f32) -> Result<()> {
    *span_mut(buf, pos)? = value.to_le_bytes();
    Ok(())
}

// ---------------------------------------------------------------------------
// Lenient accessors
// ---------------------------------------------------------------------------

/// Boolean at `pos`, `false` when out of range
pub fn get_bool(buf: &[u8], pos: usize) -> bool {
    read_bool(buf, pos).unwrap_or(false)
}

/// i16 at `pos`, `0` when out of range
pub fn get_i16(buf: &[u8], pos: usize) -> i16 {
    read_i16(buf, pos).unwrap_or(0)
}

/// u16 at `pos`, `0` when out of range
pub fn get_u16(buf: &[u8], pos: usize) -> u16 {
    read_u16(buf, pos).unwrap_or(0)
}

/// i32 at `pos`, `0` when out of range
pub fn get_i32(buf: &[u8], pos: usize) -> i32 {
    read_i32(buf, pos).unwrap_or(0)
}

/// u32 at `pos`, `0` when out of range
pub fn get_u32(buf: &[u8], pos: usize) -> u32 {
    read_u32(buf, pos).unwrap_or(0)
}

/// f32 at `pos`, `0.0` when out of range
pub fn get_f32(buf: &[u8], pos: usize) -> f32 {
    read_f32(buf, pos).unwrap_or(0.0)
}

/// Store a boolean, ignored when out of range
pub fn set_bool(buf: &mut [u8], pos: usize, value: bool) {
    let _ = write_bool(buf, pos, value);
}

/// Store an i16, ignored when out of range
pub fn set_i16(buf: &mut [u8], pos: usize, value: i16) {
    let _ = write_i16(buf, pos, value);
}

/// Store a u16, ignored when out of range
pub fn set_u16(buf: &mut [u8], pos: usize, value: u16) {
    let _ = write_u16(buf, pos, value);
}

/// Store an i32, ignored when out of range
pub fn set_i32(buf: &mut [u8], pos: usize, value: i32) {
    let _ = write_i32(buf, pos, value);
}

/// Store a u32, ignored when out of range
pub fn set_u32(buf: &mut [u8], pos: usize, value: u32) {
    let _ = write_u32(buf, pos, value);
}

/// Store an f32, ignored when out of range
pub fn set_f32(buf: &mut [u8], pos: usize, value: f32) {
    let _ = write_f32(buf, pos, value);
}
