//! NCGR (Nitro Character Graphic Resource) - tile sheets.
//!
//! ## Layout
//! ```text
//! [0x00] Nitro header, magic "RGCN" / "NCGR"
//! [0x10] CHAR chunk ("RAHC" / "CHAR")
//! [...]  optional CPOS chunk ("SOPC" / "CPOS")
//! ```
//!
//! ## CHAR payload
//! ```text
//! [0x00] Height in tiles (0xFFFF = unspecified)        (u16 LE)
//! [0x02] Width in tiles  (0xFFFF = unspecified)        (u16 LE)
//! [0x04] ColorFormat (3 = 4 bpp, otherwise 8 bpp)      (u32 LE)
//! [0x08] MappingMode                                   (u32 LE)
//! [0x0C] Layout flags (bit 0: linear)                  (u32 LE)
//! [0x10] PixelDataSize                                 (u32 LE)
//! [0x14] PixelDataOffset, relative to payload          (u32 LE)
//! ```
//!
//! ## CPOS payload
//! ```text
//! [0x00] X, Y, Width, Height                           (u16 LE each)
//! ```
//!
//! ## Pixel addressing
//! Tiles are 8x8. With **block** layout each tile is stored contiguously
//! (32 bytes at 4 bpp, 64 at 8 bpp). With **linear** layout the data is a
//! plain bitmap `width * 8` pixels wide, so a tile row is found by stepping
//! over whole sheet rows. At 4 bpp each byte holds two pixels, low nibble
//! first.

use crate::formats::nitro::{Aliases, FourCc, NitroHeader};
use crate::utils::{bytes, le_u16, le_u32, rel};
use crate::{Error, Result};

/// Accepted record tags.
pub const MAGIC: Aliases = [FourCc::new(b"RGCN"), FourCc::new(b"NCGR")];
/// Accepted pixel chunk tags.
pub const CHAR: Aliases = [FourCc::new(b"RAHC"), FourCc::new(b"CHAR")];
/// Accepted character-position chunk tags.
pub const CPOS: Aliases = [FourCc::new(b"SOPC"), FourCc::new(b"CPOS")];

/// Tile width/height value meaning "not specified".
pub const UNSPECIFIED: u16 = 0xFFFF;

/// Pixel bit depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    /// Two pixels per byte, 16-color palettes.
    Bpp4,
    /// One pixel per byte, 256-color palettes.
    Bpp8,
}

impl BitDepth {
    /// Bits per pixel.
    pub fn bits(self) -> usize {
        match self {
            Self::Bpp4 => 4,
            Self::Bpp8 => 8,
        }
    }

    /// Bytes in one 8-pixel tile row.
    pub fn row_bytes(self) -> usize {
        self.bits()
    }

    /// Bytes in one 8x8 tile.
    pub fn tile_bytes(self) -> usize {
        self.bits() * 8
    }
}

/// VRAM character mapping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingMode {
    /// 2D mapping: tiles form a 32-tile-wide grid.
    TwoD,
    /// 1D mapping with a 32 KiB boundary.
    OneD32K,
    /// 1D mapping with a 64 KiB boundary.
    OneD64K,
    /// 1D mapping with a 128 KiB boundary.
    OneD128K,
    /// 1D mapping with a 256 KiB boundary.
    OneD256K,
    /// Any other value, kept verbatim.
    Other(u32),
}

impl MappingMode {
    /// Decode the raw mapping word.
    pub fn from_raw(v: u32) -> Self {
        match v {
            0x00_0000 => Self::TwoD,
            0x00_0010 => Self::OneD32K,
            0x10_0010 => Self::OneD64K,
            0x20_0010 => Self::OneD128K,
            0x30_0010 => Self::OneD256K,
            other => Self::Other(other),
        }
    }

    /// Whether tiles are laid out one-dimensionally.
    pub fn is_one_d(self) -> bool {
        matches!(
            self,
            Self::OneD32K | Self::OneD64K | Self::OneD128K | Self::OneD256K
        )
    }
}

/// How tile pixels are addressed in the pixel payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileLayout {
    /// Scanline bitmap; rows span the whole sheet width.
    Linear,
    /// Each tile stored contiguously.
    Block,
}

/// Placement recorded by the optional CPOS chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharPosition {
    /// X position.
    pub x: u16,
    /// Y position.
    pub y: u16,
    /// Width.
    pub width: u16,
    /// Height.
    pub height: u16,
}

/// Decoded tile sheet record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSheet {
    /// Width in 8x8 tiles.
    pub width_tiles: u16,
    /// Height in 8x8 tiles.
    pub height_tiles: u16,
    /// Declared bit depth.
    pub depth: BitDepth,
    /// VRAM mapping mode.
    pub mapping: MappingMode,
    /// Pixel addressing.
    pub layout: TileLayout,
    /// Raw pixel payload.
    pub data: Vec<u8>,
    /// Contents of the CPOS chunk, if any.
    pub position: Option<CharPosition>,
}

impl TileSheet {
    /// Decode a tile sheet record from `buf`.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        let header = NitroHeader::parse_expecting(buf, &MAGIC)?;

        let mut sheet = None;
        let mut position = None;
        for chunk in header.chunks(buf) {
            let chunk = chunk?;
            let base = chunk.data_offset();
            if CHAR.contains(&chunk.tag) && sheet.is_none() {
                sheet = Some(Self::parse_char(chunk.data).map_err(|e| e.rebase(base))?);
            } else if CPOS.contains(&chunk.tag) {
                position = Some(parse_cpos(chunk.data).map_err(|e| e.rebase(base))?);
            }
        }

        let mut sheet = sheet.ok_or(Error::MissingChunk {
            record: "NCGR",
            chunk: "CHAR",
        })?;
        sheet.position = position;
        Ok(sheet)
    }

    fn parse_char(p: &[u8]) -> Result<Self> {
        let height_tiles = le_u16(p, 0x00)?;
        let width_tiles = le_u16(p, 0x02)?;
        let depth = match le_u32(p, 0x04)? {
            3 => BitDepth::Bpp4,
            _ => BitDepth::Bpp8,
        };
        let mapping = MappingMode::from_raw(le_u32(p, 0x08)?);
        let layout = if le_u32(p, 0x0C)? & 1 != 0 {
            TileLayout::Linear
        } else {
            TileLayout::Block
        };
        let size = le_u32(p, 0x10)? as usize;
        let ptr = le_u32(p, 0x14)?;
        let start = rel(p, 0, ptr, size, 0x14)?;
        let data = bytes(p, start, size)?.to_vec();

        if width_tiles != UNSPECIFIED && height_tiles != UNSPECIFIED {
            let needed = width_tiles as usize * height_tiles as usize * depth.tile_bytes();
            if data.len() < needed {
                return Err(Error::format("pixel data smaller than the tile grid", 0x10));
            }
        }

        Ok(Self {
            width_tiles,
            height_tiles,
            depth,
            mapping,
            layout,
            data,
            position: None,
        })
    }

    /// Number of whole tiles the pixel payload holds at `depth`.
    pub fn tile_count(&self, depth: BitDepth) -> usize {
        self.data.len() / depth.tile_bytes()
    }

    /// Palette indices of tile `index` at the sheet's own bit depth.
    pub fn tile(&self, index: usize) -> Result<[u8; 64]> {
        self.decode_tile(index, self.depth)
    }

    /// Palette indices of tile `index`, row-major, read at `depth`.
    ///
    /// `depth` may differ from [`TileSheet::depth`]; OAM records can force
    /// 8 bpp on a 4 bpp sheet. Fails with [`Error::InvalidRange`] (offset
    /// into the pixel payload) when the tile lies outside the data.
    pub fn decode_tile(&self, index: usize, depth: BitDepth) -> Result<[u8; 64]> {
        let row_bytes = depth.row_bytes();
        let (base, stride) = match self.layout {
            TileLayout::Block => (index * depth.tile_bytes(), row_bytes),
            TileLayout::Linear => {
                let width = (self.width_tiles as usize).max(1);
                let stride = width * row_bytes;
                ((index % width) * row_bytes + (index / width) * stride * 8, stride)
            }
        };

        let mut out = [0u8; 64];
        for row in 0..8 {
            let at = base + row * stride;
            let src = self
                .data
                .get(at..at + row_bytes)
                .ok_or(Error::InvalidRange { offset: at })?;
            let dst = &mut out[row * 8..row * 8 + 8];
            match depth {
                BitDepth::Bpp8 => dst.copy_from_slice(src),
                BitDepth::Bpp4 => {
                    for (pair, &b) in dst.chunks_exact_mut(2).zip(src) {
                        pair[0] = b & 0x0F;
                        pair[1] = b >> 4;
                    }
                }
            }
        }
        Ok(out)
    }
}

fn parse_cpos(p: &[u8]) -> Result<CharPosition> {
    Ok(CharPosition {
        x: le_u16(p, 0x00)?,
        y: le_u16(p, 0x02)?,
        width: le_u16(p, 0x04)?,
        height: le_u16(p, 0x06)?,
    })
}
