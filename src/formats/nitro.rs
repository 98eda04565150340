//! Nitro framing - the header and chunk layout shared by every record type.
//!
//! ## Header (0x10 bytes)
//! ```text
//! [0x00] Magic                      (4 bytes, e.g. "RLCN" / "NCLR")
//! [0x04] BOM (0xFEFF)               (u16 LE)
//! [0x06] Version (0x0100, 0x0101)   (u16 LE)
//! [0x08] FileSize                   (u32 LE) - whole record, header included
//! [0x0C] HeaderSize (0x10)          (u16 LE)
//! [0x0E] ChunkCount                 (u16 LE)
//! ```
//!
//! ## Chunk
//! ```text
//! [0x00] Tag                        (4 bytes, e.g. "TTLP")
//! [0x04] Size                       (u32 LE) - includes this 8-byte prefix
//! [0x08] Payload                    (Size - 8 bytes)
//! ```
//!
//! Chunks follow the header back to back. Every offset stored inside a chunk
//! payload is relative to the start of that payload (chunk start + 8).
//!
//! Most files store tags byte-reversed (`"RLCN"` for NCLR, `"TTLP"` for
//! PLTT); some titles write them forwards. Both spellings describe the same
//! little-endian layout, so each record type accepts a pair of aliases.

use std::fmt;

use crate::utils::{bytesa, is_printable, le_u16, le_u32};
use crate::{Error, Result};

/// A four-character code identifying a record or chunk.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    /// Wrap a literal tag.
    pub const fn new(tag: &[u8; 4]) -> Self {
        Self(*tag)
    }

    /// Peek the first four bytes of `buf`, if there are that many.
    pub fn peek(buf: &[u8]) -> Option<Self> {
        bytesa(buf, 0).ok().map(Self)
    }

    /// Whether every byte is printable ASCII.
    pub fn is_printable(&self) -> bool {
        is_printable(&self.0)
    }

    /// The tag as text; non-ASCII bytes are replaced.
    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if (0x20..=0x7E).contains(&b) {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02X}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc(\"{self}\")")
    }
}

impl From<[u8; 4]> for FourCc {
    fn from(b: [u8; 4]) -> Self {
        Self(b)
    }
}

/// The two accepted spellings of a record or chunk tag.
pub type Aliases = [FourCc; 2];

/// Parsed common Nitro header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NitroHeader {
    /// Record tag.
    pub magic: FourCc,
    /// Byte-order mark as stored.
    pub bom: u16,
    /// Format version.
    pub version: u16,
    /// Declared size of the whole record, header included.
    pub file_size: u32,
    /// Declared header size; chunks begin here.
    pub header_size: u16,
    /// Number of chunks following the header.
    pub chunk_count: u16,
}

impl NitroHeader {
    /// Size of the fixed header in bytes.
    pub const SIZE: usize = 0x10;

    /// Parse and validate the header at the start of `buf`.
    ///
    /// The declared file size must cover at least the header and fit inside
    /// `buf`; the declared header size must lie between the fixed header and
    /// the declared file size.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        let header = Self {
            magic: FourCc(bytesa(buf, 0x00)?),
            bom: le_u16(buf, 0x04)?,
            version: le_u16(buf, 0x06)?,
            file_size: le_u32(buf, 0x08)?,
            header_size: le_u16(buf, 0x0C)?,
            chunk_count: le_u16(buf, 0x0E)?,
        };

        let file_size = header.file_size as usize;
        if file_size < Self::SIZE || file_size > buf.len() {
            return Err(Error::format("declared file size out of range", 0x08));
        }
        let header_size = header.header_size as usize;
        if header_size < Self::SIZE || header_size > file_size {
            return Err(Error::format("declared header size out of range", 0x0C));
        }

        Ok(header)
    }

    /// Parse the header and require its magic to be one of `aliases`.
    pub fn parse_expecting(buf: &[u8], aliases: &Aliases) -> Result<Self> {
        let found = FourCc(bytesa(buf, 0)?);
        if !aliases.contains(&found) {
            return Err(Error::BadMagic { found, offset: 0 });
        }
        Self::parse(buf)
    }

    /// Iterate over the chunks of the record this header was parsed from.
    ///
    /// `buf` must be the same buffer passed to [`NitroHeader::parse`].
    pub fn chunks<'a>(&self, buf: &'a [u8]) -> Chunks<'a> {
        let end = (self.file_size as usize).min(buf.len());
        Chunks {
            buf: &buf[..end],
            pos: self.header_size as usize,
            remaining: self.chunk_count,
        }
    }

    /// Find the first chunk whose tag is one of `aliases`.
    ///
    /// Other chunks are skipped by their declared size. Returns `Ok(None)`
    /// when no chunk matches.
    pub fn find_chunk<'a>(&self, buf: &'a [u8], aliases: &Aliases) -> Result<Option<Chunk<'a>>> {
        for chunk in self.chunks(buf) {
            let chunk = chunk?;
            if aliases.contains(&chunk.tag) {
                return Ok(Some(chunk));
            }
            tracing::trace!(tag = %chunk.tag, offset = chunk.offset, "skipping chunk");
        }
        Ok(None)
    }
}

/// One chunk of a Nitro record.
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    /// Chunk tag.
    pub tag: FourCc,
    /// Offset of the chunk (its tag) within the record.
    pub offset: usize,
    /// Payload bytes, excluding the 8-byte tag/size prefix.
    pub data: &'a [u8],
}

impl Chunk<'_> {
    /// Offset of the payload within the record. Add this to payload-relative
    /// offsets to report positions in record coordinates.
    pub fn data_offset(&self) -> usize {
        self.offset + 8
    }
}

/// Iterator over the chunks of a record, in file order.
///
/// Each step jumps to the next chunk boundary computed from the declared
/// size, regardless of how much of the payload the caller looked at. After
/// the first error the iterator is exhausted.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    buf: &'a [u8],
    pos: usize,
    remaining: u16,
}

impl<'a> Chunks<'a> {
    fn next_chunk(&mut self) -> Result<Chunk<'a>> {
        let offset = self.pos;
        let tag = FourCc(bytesa(self.buf, offset)?);
        let size = le_u32(self.buf, offset + 4)? as usize;
        if size < 8 {
            return Err(Error::format("chunk size smaller than its header", offset + 4));
        }
        let end = offset
            .checked_add(size)
            .filter(|&end| end <= self.buf.len())
            .ok_or(Error::InvalidRange { offset: offset + 4 })?;
        self.pos = end;
        Ok(Chunk {
            tag,
            offset,
            data: &self.buf[offset + 8..end],
        })
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Result<Chunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let chunk = self.next_chunk();
        if chunk.is_err() {
            self.remaining = 0;
        }
        Some(chunk)
    }
}

/// Cheap plausibility check for an embedded record header at the start of
/// `window`.
///
/// Succeeds when a full 16-byte header is present, the tag is printable
/// ASCII, and the declared file size is non-zero and fits in `window`.
/// Returns the tag and declared size. This is deliberately looser than
/// [`NitroHeader::parse`]; it is used to find candidates, not to decode them.
pub fn probe(window: &[u8]) -> Option<(FourCc, usize)> {
    if window.len() < NitroHeader::SIZE {
        return None;
    }
    let tag = FourCc::peek(window)?;
    if !tag.is_printable() {
        return None;
    }
    let size = le_u32(window, 0x08).ok()? as usize;
    (size != 0 && size <= window.len()).then_some((tag, size))
}
