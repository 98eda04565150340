//! Low-level field readers shared by all decoders.
//!
//! Every Nitro structure is little-endian with fields at fixed offsets, so
//! instead of a stream these read directly from a byte slice at an explicit
//! offset. Each function reads exactly the bytes it promises or returns
//! [`Error::UnexpectedEof`] carrying that offset; nothing is ever
//! reinterpreted in host byte order.

use crate::{Error, Result};

/// Borrow `len` bytes starting at `offset`.
#[inline]
pub(crate) fn bytes(buf: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| buf.get(offset..end))
        .ok_or(Error::UnexpectedEof { offset, need: len })
}

/// Read exactly `N` bytes into a fixed-size array.
#[inline]
pub(crate) fn bytesa<const N: usize>(buf: &[u8], offset: usize) -> Result<[u8; N]> {
    let mut b = [0u8; N];
    b.copy_from_slice(bytes(buf, offset, N)?);
    Ok(b)
}

/// Read one byte.
#[inline]
pub(crate) fn u8(buf: &[u8], offset: usize) -> Result<u8> {
    buf.get(offset)
        .copied()
        .ok_or(Error::UnexpectedEof { offset, need: 1 })
}

/// Read a little-endian `u16`.
#[inline]
pub(crate) fn le_u16(buf: &[u8], offset: usize) -> Result<u16> {
    bytesa(buf, offset).map(u16::from_le_bytes)
}

/// Read a little-endian `i16`.
#[inline]
pub(crate) fn le_i16(buf: &[u8], offset: usize) -> Result<i16> {
    bytesa(buf, offset).map(i16::from_le_bytes)
}

/// Read a little-endian `u32`.
#[inline]
pub(crate) fn le_u32(buf: &[u8], offset: usize) -> Result<u32> {
    bytesa(buf, offset).map(u32::from_le_bytes)
}

/// Read a little-endian `i32`.
#[inline]
pub(crate) fn le_i32(buf: &[u8], offset: usize) -> Result<i32> {
    bytesa(buf, offset).map(i32::from_le_bytes)
}

/// Resolve a relative pointer against `base`, checking that `len` bytes are
/// addressable from the result.
///
/// Returns [`Error::InvalidRange`] (at `field`, the offset the pointer was
/// read from) when the target falls outside `buf`.
#[inline]
pub(crate) fn rel(buf: &[u8], base: usize, ptr: u32, len: usize, field: usize) -> Result<usize> {
    let at = base
        .checked_add(ptr as usize)
        .ok_or(Error::InvalidRange { offset: field })?;
    match at.checked_add(len) {
        Some(end) if end <= buf.len() => Ok(at),
        _ => Err(Error::InvalidRange { offset: field }),
    }
}

/// Whether all bytes are printable ASCII (`0x20..=0x7E`).
#[inline]
pub(crate) fn is_printable(b: &[u8]) -> bool {
    b.iter().all(|c| (0x20..=0x7E).contains(c))
}

/// Split a name blob on NUL bytes and keep the runs that look like names.
///
/// A run is kept when it is non-empty, printable ASCII, and not only
/// whitespace. Used for best-effort name recovery; never fails.
pub(crate) fn printable_runs(buf: &[u8]) -> Vec<String> {
    buf.split(|&b| b == 0)
        .filter(|run| !run.is_empty() && is_printable(run))
        .filter(|run| !run.iter().all(u8::is_ascii_whitespace))
        .map(|run| String::from_utf8_lossy(run).into_owned())
        .collect()
}
