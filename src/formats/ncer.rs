//! NCER (Nitro CEll Resource) - sprite cell banks.
//!
//! A cell is one sprite frame assembled from OAM records, each placing a
//! rectangle of 8x8 tiles relative to the cell origin.
//!
//! ## Layout
//! ```text
//! [0x00] Nitro header, magic "RECN" / "NCER"
//! [0x10] CEBK chunk ("KBEC" / "CEBK")
//! [...]  optional LABL / UEXT chunks (skipped)
//! ```
//!
//! ## CEBK payload
//! ```text
//! [0x00] CellCount                                     (u16 LE)
//! [0x02] BankAttributes (bit 0: explicit bounds)       (u16 LE)
//! [0x04] CellDataOffset, relative to payload           (u32 LE)
//! [0x08] MappingMode (0-3 = 1D 32K-256K, 4 = 2D)       (u32 LE)
//! [0x0C] VramTransferOffset (0 = none)                 (u32 LE)
//! [0x10] StringBankOffset (0 = none)                   (u32 LE)
//! [0x14] UserExtendedOffset (0 = none)                 (u32 LE)
//! ```
//!
//! ## Cell record (8 bytes, 16 with bounds)
//! ```text
//! [0x00] OamCount                                      (u16 LE)
//! [0x02] CellAttributes                                (u16 LE)
//! [0x04] OamOffset, relative to the OAM area           (u32 LE)
//! [0x08] MaxX, MaxY, MinX, MinY  (bounds only)         (i16 LE each)
//! ```
//! The OAM area starts right after the last cell record.
//!
//! ## OAM record (3 attribute words, optionally padded to 8 bytes)
//! ```text
//! attr0: SS D M OO P R YYYYYYYY   shape, 8bpp, mosaic, mode, double/hidden, rot/scale, Y
//! attr1: SS PPPPP XXXXXXXXX       size, affine index or flips (bits 12/13), X
//! attr2: IIII PP TTTTTTTTTT       palette bank, priority, tile index
//! ```
//! Some files pad every record with a zero fourth word. The stride is read
//! off the cell table when the list pointers show it (their gaps, or a
//! pointer that is not 8-aligned). Otherwise it is chosen per OAM list: 8
//! when every padding slot is zero and the padded list fits the chunk, 6
//! otherwise.

use crate::formats::nitro::{Aliases, FourCc, NitroHeader};
use crate::utils::{le_i16, le_u16, le_u32, rel};
use crate::{Error, Result};

/// Accepted record tags.
pub const MAGIC: Aliases = [FourCc::new(b"RECN"), FourCc::new(b"NCER")];
/// Accepted cell bank chunk tags.
pub const CEBK: Aliases = [FourCc::new(b"KBEC"), FourCc::new(b"CEBK")];

const HEADER_SIZE: usize = 0x18;

/// Object shape, attr0 bits 14-15.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OamShape {
    Square,
    Horizontal,
    Vertical,
    /// Shape 3; the hardware does not define it.
    Prohibited,
}

impl OamShape {
    fn from_bits(v: u16) -> Self {
        match v & 3 {
            0 => Self::Square,
            1 => Self::Horizontal,
            2 => Self::Vertical,
            _ => Self::Prohibited,
        }
    }
}

/// Object blend mode, attr0 bits 10-11.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OamMode {
    Normal,
    SemiTransparent,
    Window,
    Prohibited,
}

impl OamMode {
    fn from_bits(v: u16) -> Self {
        match v & 3 {
            0 => Self::Normal,
            1 => Self::SemiTransparent,
            2 => Self::Window,
            _ => Self::Prohibited,
        }
    }
}

/// Pixel size of an object with the given shape and size code.
///
/// | shape      | 0     | 1     | 2     | 3     |
/// |------------|-------|-------|-------|-------|
/// | Square     | 8x8   | 16x16 | 32x32 | 64x64 |
/// | Horizontal | 16x8  | 32x8  | 32x16 | 64x32 |
/// | Vertical   | 8x16  | 8x32  | 16x32 | 32x64 |
///
/// The prohibited shape falls back to 8x8.
pub fn oam_dimensions(shape: OamShape, size: u8) -> (u8, u8) {
    const SQUARE: [(u8, u8); 4] = [(8, 8), (16, 16), (32, 32), (64, 64)];
    const HORIZONTAL: [(u8, u8); 4] = [(16, 8), (32, 8), (32, 16), (64, 32)];
    const VERTICAL: [(u8, u8); 4] = [(8, 16), (8, 32), (16, 32), (32, 64)];

    let size = (size & 3) as usize;
    match shape {
        OamShape::Square => SQUARE[size],
        OamShape::Horizontal => HORIZONTAL[size],
        OamShape::Vertical => VERTICAL[size],
        OamShape::Prohibited => (8, 8),
    }
}

/// One decoded OAM record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Oam {
    /// Raw attribute words.
    pub attrs: [u16; 3],
    /// X offset from the cell origin (9-bit signed).
    pub x: i16,
    /// Y offset from the cell origin (8-bit signed).
    pub y: i16,
    /// Width in pixels.
    pub width: u8,
    /// Height in pixels.
    pub height: u8,
    pub shape: OamShape,
    /// Size code, 0-3.
    pub size: u8,
    pub mode: OamMode,
    pub mosaic: bool,
    /// Rotation/scaling enabled.
    pub rotate_scale: bool,
    /// attr0 bit 9: double-size with rotation/scaling, hidden without.
    pub double_size_or_hidden: bool,
    /// Affine parameter slot, only with rotation/scaling.
    pub affine_index: Option<u8>,
    pub h_flip: bool,
    pub v_flip: bool,
    /// Tiles are read at 8 bpp regardless of the sheet's depth.
    pub use_8bpp: bool,
    /// First tile index (10 bits).
    pub tile_index: u16,
    /// Background priority, 0 is frontmost.
    pub priority: u8,
    /// 16-color palette bank for 4 bpp tiles.
    pub palette_bank: u8,
}

impl Oam {
    /// Decode the three attribute words.
    pub fn decode(attr0: u16, attr1: u16, attr2: u16) -> Self {
        let y = (attr0 & 0xFF) as u8 as i8 as i16;
        let x = ((attr1 & 0x1FF) << 7) as i16 >> 7;
        let rotate_scale = attr0 & (1 << 8) != 0;
        let shape = OamShape::from_bits(attr0 >> 14);
        let size = (attr1 >> 14) as u8;
        let (width, height) = oam_dimensions(shape, size);

        Self {
            attrs: [attr0, attr1, attr2],
            x,
            y,
            width,
            height,
            shape,
            size,
            mode: OamMode::from_bits(attr0 >> 10),
            mosaic: attr0 & (1 << 12) != 0,
            rotate_scale,
            double_size_or_hidden: attr0 & (1 << 9) != 0,
            affine_index: rotate_scale.then_some(((attr1 >> 9) & 0x1F) as u8),
            h_flip: !rotate_scale && attr1 & (1 << 12) != 0,
            v_flip: !rotate_scale && attr1 & (1 << 13) != 0,
            use_8bpp: attr0 & (1 << 13) != 0,
            tile_index: attr2 & 0x3FF,
            priority: ((attr2 >> 10) & 3) as u8,
            palette_bank: (attr2 >> 12) as u8,
        }
    }

    /// The box this object covers, relative to the cell origin.
    pub fn bounds(&self) -> Bounds {
        Bounds {
            x: self.x as i32,
            y: self.y as i32,
            width: self.width as i32,
            height: self.height as i32,
        }
    }
}

/// Axis-aligned box; `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    /// Box from two corners in either order. Degenerate extents become 1.
    pub fn from_corners(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        let (min_x, max_x) = (x0.min(x1), x0.max(x1));
        let (min_y, max_y) = (y0.min(y1), y0.max(y1));
        Self {
            x: min_x,
            y: min_y,
            width: (max_x - min_x).max(1),
            height: (max_y - min_y).max(1),
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Bounds {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }
}

/// One sprite cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Position in the bank.
    pub index: usize,
    /// Raw cell attribute word.
    pub attributes: u16,
    /// Explicit bounds if the bank stores them, otherwise the union of the
    /// OAM boxes (or 1x1 at the origin for an empty cell).
    pub bounds: Bounds,
    /// OAM records in file order.
    pub oams: Vec<Oam>,
}

/// VRAM mapping mode stored in the cell bank header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellMapping {
    OneD32K,
    OneD64K,
    OneD128K,
    OneD256K,
    TwoD,
    Other(u32),
}

impl CellMapping {
    /// Decode the raw mapping word.
    pub fn from_raw(v: u32) -> Self {
        match v {
            0 => Self::OneD32K,
            1 => Self::OneD64K,
            2 => Self::OneD128K,
            3 => Self::OneD256K,
            4 => Self::TwoD,
            other => Self::Other(other),
        }
    }
}

/// Decoded cell bank record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellBank {
    /// Raw bank attribute word.
    pub attributes: u16,
    /// Whether cells carried explicit bounding boxes.
    pub has_bounds: bool,
    pub mapping: CellMapping,
    /// Offset of the VRAM transfer data, 0 if absent.
    pub vram_transfer_offset: u32,
    /// Offset of the string bank, 0 if absent.
    pub string_bank_offset: u32,
    /// Offset of the user extension data, 0 if absent.
    pub user_extended_offset: u32,
    pub cells: Vec<Cell>,
}

impl CellBank {
    /// Decode a cell bank record from `buf`.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        let header = NitroHeader::parse_expecting(buf, &MAGIC)?;
        let chunk = header
            .find_chunk(buf, &CEBK)?
            .ok_or(Error::MissingChunk {
                record: "NCER",
                chunk: "CEBK",
            })?;
        Self::parse_cebk(chunk.data).map_err(|e| e.rebase(chunk.data_offset()))
    }

    fn parse_cebk(p: &[u8]) -> Result<Self> {
        if p.len() < HEADER_SIZE {
            return Err(Error::format("cell bank header truncated", 0));
        }
        let count = le_u16(p, 0x00)? as usize;
        let attributes = le_u16(p, 0x02)?;
        let cell_ptr = le_u32(p, 0x04)?;
        let has_bounds = attributes & 1 != 0;
        let record_size = if has_bounds { 16 } else { 8 };

        let table = rel(p, 0, cell_ptr, count * record_size, 0x04)?;
        let oam_base = table + count * record_size;

        let lists = (0..count)
            .map(|index| {
                let at = table + index * record_size;
                Ok((le_u16(p, at)? as usize, le_u32(p, at + 4)? as usize))
            })
            .collect::<Result<Vec<_>>>()?;
        let stride = bank_stride(&lists);

        let mut cells = Vec::with_capacity(count);
        for index in 0..count {
            let at = table + index * record_size;
            cells.push(parse_cell(p, index, at, oam_base, has_bounds, stride)?);
        }
        tracing::trace!(cells = cells.len(), has_bounds, ?stride, "decoded cell bank");

        Ok(Self {
            attributes,
            has_bounds,
            mapping: CellMapping::from_raw(le_u32(p, 0x08)?),
            vram_transfer_offset: le_u32(p, 0x0C)?,
            string_bank_offset: le_u32(p, 0x10)?,
            user_extended_offset: le_u32(p, 0x14)?,
            cells,
        })
    }
}

fn parse_cell(
    p: &[u8],
    index: usize,
    at: usize,
    oam_base: usize,
    has_bounds: bool,
    bank_stride: Option<usize>,
) -> Result<Cell> {
    let oam_count = le_u16(p, at)? as usize;
    let attributes = le_u16(p, at + 2)?;
    let oam_ptr = le_u32(p, at + 4)?;

    let start = rel(p, oam_base, oam_ptr, oam_count * 6, at + 4)?;
    let stride = bank_stride.unwrap_or_else(|| oam_stride(p, start, oam_count));
    let mut oams = Vec::with_capacity(oam_count);
    for j in 0..oam_count {
        let q = start + j * stride;
        oams.push(Oam::decode(
            le_u16(p, q)?,
            le_u16(p, q + 2)?,
            le_u16(p, q + 4)?,
        ));
    }

    let bounds = if has_bounds {
        let max_x = le_i16(p, at + 0x08)? as i32;
        let max_y = le_i16(p, at + 0x0A)? as i32;
        let min_x = le_i16(p, at + 0x0C)? as i32;
        let min_y = le_i16(p, at + 0x0E)? as i32;
        Bounds::from_corners(min_x, min_y, max_x, max_y)
    } else {
        oams.iter()
            .map(Oam::bounds)
            .reduce(|acc, b| acc.union(&b))
            .unwrap_or(Bounds::from_corners(0, 0, 1, 1))
    };

    Ok(Cell {
        index,
        attributes,
        bounds,
        oams,
    })
}

/// OAM stride shared by the whole bank, read off the cell table.
///
/// A list pointer that is not a multiple of 8 rules out padding. The gap
/// between consecutive list pointers is `count * 6` or `count * 8`. `None`
/// when the table gives no evidence or contradicts itself.
fn bank_stride(lists: &[(usize, usize)]) -> Option<usize> {
    let mut packed = lists.iter().any(|&(count, ptr)| count > 0 && ptr % 8 != 0);
    let mut padded = false;
    for pair in lists.windows(2) {
        let ((count, ptr), (_, next)) = (pair[0], pair[1]);
        match next.checked_sub(ptr) {
            Some(gap) if count > 0 && gap == count * 6 => packed = true,
            Some(gap) if count > 0 && gap == count * 8 => padded = true,
            _ => {}
        }
    }
    match (packed, padded) {
        (true, false) => Some(6),
        (false, true) => Some(8),
        _ => None,
    }
}

/// 8 if the list fits with padding and every padding word is zero, else 6.
fn oam_stride(p: &[u8], start: usize, count: usize) -> usize {
    let padded_fits = start + count * 8 <= p.len();
    let padding_zero = || (0..count).all(|j| matches!(le_u16(p, start + j * 8 + 6), Ok(0)));
    if count > 0 && padded_fits && padding_zero() {
        8
    } else {
        6
    }
}
