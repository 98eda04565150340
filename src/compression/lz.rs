//! LZ10 / LZ11 - the BIOS-style LZ77 variants used by DS software.
//!
//! ## Header
//! ```text
//! [0x00] Type (0x10 = LZ10, 0x11 = LZ11)            (u8)
//! [0x01] DecompressedSize                           (u24 LE)
//! [0x04] DecompressedSize, only when the u24 is 0   (u32 LE)
//! ```
//! The 32-bit form exists for outputs of 16 MiB and up.
//!
//! ## Body
//! A flag byte precedes every group of eight tokens; its bits, MSB first,
//! mark each token as a literal byte (0) or a back-reference (1). The final
//! flag byte may have unused low bits once the output is full.
//!
//! ### LZ10 back-reference (2 bytes)
//! ```text
//! LLLL DDDD DDDDDDDD        length = L + 3, disp = D
//! ```
//!
//! ### LZ11 back-reference (2, 4 or 5 bytes, by the first nibble)
//! ```text
//! 0:   0000 LLLL LLLLLLLL LLLL DDDD DDDDDDDD       length = L + 0x11
//! 1:   0001 LLLL LLLLLLLL LLLLLLLL LLLL DDDD DDDDDDDD
//!                                                  length = L + 0x111
//! 2-F: LLLL DDDD DDDDDDDD                          length = L + 1
//! ```
//!
//! In both formats the copy source is `dst - disp - 1`. Source and
//! destination may overlap (that is how runs are encoded), so the copy goes
//! byte by byte.

use crate::utils::{le_u32, u8};
use crate::{Error, Result};

/// Which token encoding a stream uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LzKind {
    /// Type byte `0x10`.
    Lz10,
    /// Type byte `0x11`.
    Lz11,
}

impl LzKind {
    /// Map a stream type byte to its kind.
    pub fn from_type(b: u8) -> Option<Self> {
        match b {
            0x10 => Some(Self::Lz10),
            0x11 => Some(Self::Lz11),
            _ => None,
        }
    }
}

/// Parsed LZ stream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LzHeader {
    /// Token encoding.
    pub kind: LzKind,
    /// Size of the decompressed output in bytes.
    pub decompressed_size: usize,
    /// Absolute offset of the first flag byte.
    pub payload_offset: usize,
}

impl LzHeader {
    /// Parse the header at `offset`.
    ///
    /// Returns `Ok(None)` when the type byte is neither `0x10` nor `0x11`
    /// (the data is simply not LZ), and an error when it is but the header
    /// is truncated or declares an empty or negative output.
    pub fn parse(buf: &[u8], offset: usize) -> Result<Option<Self>> {
        let Some(kind) = buf.get(offset).copied().and_then(LzKind::from_type) else {
            return Ok(None);
        };

        let size24 = le_u32(buf, offset).map_err(|_| truncated_header(offset))? >> 8;
        let (size, payload_offset) = if size24 != 0 {
            (size24, offset + 4)
        } else {
            let size = le_u32(buf, offset + 4).map_err(|_| truncated_header(offset + 4))?;
            (size, offset + 8)
        };

        if size == 0 || size > i32::MAX as u32 {
            return Err(Error::Lz {
                reason: "declared decompressed size is zero or negative",
                src: offset,
                dst: 0,
            });
        }

        Ok(Some(Self {
            kind,
            decompressed_size: size as usize,
            payload_offset,
        }))
    }
}

/// Upper bound on the up-front output allocation; larger outputs grow.
const MAX_PREALLOC: usize = 1 << 24;

/// Decompress the LZ10/LZ11 stream starting at `offset`.
///
/// Returns `Ok(None)` if the byte at `offset` is not an LZ type tag; callers
/// treat that as "use the raw bytes". Any malformation of an actual LZ
/// stream is an [`Error::Lz`] carrying the input and output cursors.
pub fn decompress(buf: &[u8], offset: usize) -> Result<Option<Vec<u8>>> {
    match LzHeader::parse(buf, offset)? {
        Some(header) => decompress_body(buf, &header).map(Some),
        None => Ok(None),
    }
}

/// Decode the token stream described by a previously parsed `header`.
pub fn decompress_body(buf: &[u8], header: &LzHeader) -> Result<Vec<u8>> {
    let size = header.decompressed_size;
    let mut out = Vec::with_capacity(size.min(MAX_PREALLOC));
    let mut src = header.payload_offset;

    while out.len() < size {
        let flags = next(buf, &mut src, "input ended before a flag byte", out.len())?;
        for bit in 0..8 {
            if out.len() >= size {
                break;
            }
            if flags & (0x80 >> bit) == 0 {
                let b = next(buf, &mut src, "input ended before a literal", out.len())?;
                out.push(b);
                continue;
            }

            let (length, disp) = match header.kind {
                LzKind::Lz10 => lz10_token(buf, &mut src, out.len())?,
                LzKind::Lz11 => lz11_token(buf, &mut src, out.len())?,
            };
            copy_back(&mut out, size, length, disp, src)?;
        }
    }

    Ok(out)
}

fn lz10_token(buf: &[u8], src: &mut usize, dst: usize) -> Result<(usize, usize)> {
    const EOF: &str = "LZ10: input ended inside a back-reference";
    let b1 = next(buf, src, EOF, dst)? as usize;
    let b2 = next(buf, src, EOF, dst)? as usize;
    Ok(((b1 >> 4) + 3, ((b1 & 0x0F) << 8) | b2))
}

fn lz11_token(buf: &[u8], src: &mut usize, dst: usize) -> Result<(usize, usize)> {
    const EOF: &str = "LZ11: input ended inside a back-reference";
    let b1 = next(buf, src, EOF, dst)? as usize;
    let token = match b1 >> 4 {
        0 => {
            let b2 = next(buf, src, EOF, dst)? as usize;
            let b3 = next(buf, src, EOF, dst)? as usize;
            let b4 = next(buf, src, EOF, dst)? as usize;
            let length = (((b1 & 0x0F) << 12) | (b2 << 4) | (b3 >> 4)) + 0x11;
            (length, ((b3 & 0x0F) << 8) | b4)
        }
        1 => {
            let b2 = next(buf, src, EOF, dst)? as usize;
            let b3 = next(buf, src, EOF, dst)? as usize;
            let b4 = next(buf, src, EOF, dst)? as usize;
            let b5 = next(buf, src, EOF, dst)? as usize;
            let length = (((b1 & 0x0F) << 20) | (b2 << 12) | (b3 << 4) | (b4 >> 4)) + 0x111;
            (length, ((b4 & 0x0F) << 8) | b5)
        }
        hi => {
            let b2 = next(buf, src, EOF, dst)? as usize;
            (hi + 1, ((b1 & 0x0F) << 8) | b2)
        }
    };
    Ok(token)
}

/// Append up to `length` bytes copied from `disp + 1` bytes back, stopping
/// once `out` reaches `size`.
fn copy_back(out: &mut Vec<u8>, size: usize, length: usize, disp: usize, src: usize) -> Result<()> {
    let dst = out.len();
    let Some(from) = dst.checked_sub(disp + 1) else {
        return Err(Error::Lz {
            reason: "back-reference underflow",
            src,
            dst,
        });
    };
    let n = length.min(size - dst);
    for k in 0..n {
        let b = out[from + k];
        out.push(b);
    }
    Ok(())
}

#[inline]
fn next(buf: &[u8], src: &mut usize, reason: &'static str, dst: usize) -> Result<u8> {
    let b = u8(buf, *src).map_err(|_| Error::Lz {
        reason,
        src: *src,
        dst,
    })?;
    *src += 1;
    Ok(b)
}

fn truncated_header(src: usize) -> Error {
    Error::Lz {
        reason: "input ended inside the header",
        src,
        dst: 0,
    }
}
