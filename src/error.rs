//! Library-wide error and result types.
//!
//! Every variant records the byte offset it concerns, relative to the buffer
//! that was being decoded when the error was raised. Use [`Error::offset`] to
//! get at it uniformly.

use thiserror::Error;

use crate::formats::nitro::FourCc;

/// Result alias used throughout nitrokit.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors the library can produce.
///
/// All of them describe malformed input; the decoders never fail for any
/// other reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A magic/signature field did not match any accepted alias.
    #[error("bad magic {found} at offset {offset:#x}")]
    BadMagic {
        /// The tag actually present.
        found: FourCc,
        /// Where it was read from.
        offset: usize,
    },
    /// The buffer ended before all expected bytes could be read.
    #[error("unexpected end of data at offset {offset:#x} (needed {need} bytes)")]
    UnexpectedEof {
        /// Offset of the attempted read.
        offset: usize,
        /// Number of bytes the read required.
        need: usize,
    },
    /// An offset or size field would read outside the valid region.
    #[error("invalid offset or size at {offset:#x}")]
    InvalidRange {
        /// Offset of the field (or the region) that was out of range.
        offset: usize,
    },
    /// A record did not contain its primary data chunk.
    #[error("{record} record has no {chunk} chunk")]
    MissingChunk {
        /// Record kind, e.g. `"NCLR"`.
        record: &'static str,
        /// Expected chunk tag, e.g. `"PLTT"`.
        chunk: &'static str,
    },
    /// A structural constraint was violated (reason describes which one).
    #[error("{reason} (offset {offset:#x})")]
    Format {
        /// What was wrong.
        reason: &'static str,
        /// Where it was detected.
        offset: usize,
    },
    /// An LZ stream was malformed.
    #[error("{reason} (src={src:#x}, dst={dst})")]
    Lz {
        /// What was wrong.
        reason: &'static str,
        /// Input cursor when the error was detected.
        src: usize,
        /// Output cursor when the error was detected.
        dst: usize,
    },
}

impl Error {
    /// Shorthand for [`Error::Format`].
    pub(crate) fn format(reason: &'static str, offset: usize) -> Self {
        Error::Format { reason, offset }
    }

    /// Move an offset measured inside a sub-slice (typically a chunk
    /// payload) into the coordinates of the enclosing buffer.
    pub(crate) fn rebase(self, base: usize) -> Self {
        match self {
            Error::BadMagic { found, offset } => Error::BadMagic {
                found,
                offset: offset + base,
            },
            Error::UnexpectedEof { offset, need } => Error::UnexpectedEof {
                offset: offset + base,
                need,
            },
            Error::InvalidRange { offset } => Error::InvalidRange {
                offset: offset + base,
            },
            Error::Format { reason, offset } => Error::Format {
                reason,
                offset: offset + base,
            },
            Error::Lz { reason, src, dst } => Error::Lz {
                reason,
                src: src + base,
                dst,
            },
            Error::MissingChunk { .. } => self,
        }
    }

    /// Byte offset the error refers to.
    ///
    /// For LZ errors this is the input cursor. [`Error::MissingChunk`] has no
    /// meaningful offset and reports 0.
    pub fn offset(&self) -> usize {
        match self {
            Error::BadMagic { offset, .. }
            | Error::UnexpectedEof { offset, .. }
            | Error::InvalidRange { offset }
            | Error::Format { offset, .. } => *offset,
            Error::Lz { src, .. } => *src,
            Error::MissingChunk { .. } => 0,
        }
    }
}
