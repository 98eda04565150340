//! NMCR (Nitro Multi-Cell Resource) - places animated cells together to
//! form one composite animation.
//!
//! ## Layout
//! ```text
//! [0x00] Nitro header, magic "RCMN" / "NMCR"
//! [0x10] MCBK chunk ("KBCM" / "MCBK")
//! ```
//!
//! ## MCBK payload
//! ```text
//! [0x00] AnimationCount                                (u16 LE)
//! [0x02] Padding                                       (u16 LE)
//! [0x04] HeaderTableOffset, relative to payload        (u32 LE)
//! [0x08] CellPoolOffset, relative to payload           (u32 LE)
//! ```
//!
//! ## Animation header (8 bytes)
//! ```text
//! [0x00] CellCount                                     (u16 LE)
//! [0x02] Unknown                                       (u16 LE)
//! [0x04] FirstCellOffset, relative to cell pool        (u32 LE)
//! ```
//!
//! ## Mapped cell (8 bytes)
//! ```text
//! [0x00] AnimationCellIndex                            (u16 LE)
//! [0x02] X                                             (i16 LE)
//! [0x04] Y                                             (i16 LE)
//! [0x06] Priority in the high byte                     (i16 LE)
//! ```

use crate::formats::nitro::{Aliases, FourCc, NitroHeader};
use crate::utils::{le_i16, le_u16, le_u32, rel};
use crate::{Error, Result};

/// Accepted record tags.
pub const MAGIC: Aliases = [FourCc::new(b"RCMN"), FourCc::new(b"NMCR")];
/// Accepted mapped cell bank chunk tags.
pub const MCBK: Aliases = [FourCc::new(b"KBCM"), FourCc::new(b"MCBK")];

/// An animation bank cell placed at an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedCell {
    /// Index into the animation bank's cells.
    pub animation_cell: u16,
    pub x: i16,
    pub y: i16,
    /// Draw priority (high byte of the last field).
    pub priority: u8,
}

/// One composite animation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedAnimation {
    /// Raw second word of the animation header.
    pub unknown: u16,
    pub cells: Vec<MappedCell>,
}

/// Decoded mapped cell bank record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedCellBank {
    pub animations: Vec<MappedAnimation>,
}

impl MappedCellBank {
    /// Decode a mapped cell bank record from `buf`.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        let header = NitroHeader::parse_expecting(buf, &MAGIC)?;
        let chunk = header
            .find_chunk(buf, &MCBK)?
            .ok_or(Error::MissingChunk {
                record: "NMCR",
                chunk: "MCBK",
            })?;
        Self::parse_mcbk(chunk.data).map_err(|e| e.rebase(chunk.data_offset()))
    }

    fn parse_mcbk(p: &[u8]) -> Result<Self> {
        let count = le_u16(p, 0x00)? as usize;
        let headers = rel(p, 0, le_u32(p, 0x04)?, count * 8, 0x04)?;
        let pool = rel(p, 0, le_u32(p, 0x08)?, 0, 0x08)?;

        let mut animations = Vec::with_capacity(count);
        for i in 0..count {
            let h = headers + i * 8;
            let cell_count = le_u16(p, h)? as usize;
            let unknown = le_u16(p, h + 2)?;
            let first = rel(p, pool, le_u32(p, h + 4)?, cell_count * 8, h + 4)?;

            let cells = (0..cell_count)
                .map(|c| parse_mapped_cell(p, first + c * 8))
                .collect::<Result<Vec<_>>>()?;
            animations.push(MappedAnimation { unknown, cells });
        }

        Ok(Self { animations })
    }
}

fn parse_mapped_cell(p: &[u8], v: usize) -> Result<MappedCell> {
    Ok(MappedCell {
        animation_cell: le_u16(p, v)?,
        x: le_i16(p, v + 2)?,
        y: le_i16(p, v + 4)?,
        priority: (le_i16(p, v + 6)? >> 8) as u8,
    })
}
