//! NCLR (Nitro CoLoR Resource) - palettes.
//!
//! ## Layout
//! ```text
//! [0x00] Nitro header, magic "RLCN" / "NCLR"
//! [0x10] PLTT chunk ("TTLP" / "PLTT")
//! [...]  optional PCMP chunk (palette index map; skipped)
//! ```
//!
//! ## PLTT payload
//! ```text
//! [0x00] ColorFormat (3 = 16 colors, 4 = 256 colors)   (u32 LE)
//! [0x04] ExtendedPalette                               (u32 LE)
//! [0x08] PaletteDataSize in bytes                      (u32 LE)
//! [0x0C] PaletteDataOffset, relative to payload        (u32 LE)
//! [...]  PaletteDataSize / 2 BGR555 colors             (u16 LE each)
//! ```
//!
//! ## Page width
//! The color format word is not reliable across titles, so the page width is
//! inferred from the color count: a multiple of 256 gives 256-color pages,
//! else a multiple of 16 gives 16-color pages, else a single page holding
//! every color.

use crate::formats::nitro::{Aliases, FourCc, NitroHeader};
use crate::utils::{le_u16, le_u32, rel};
use crate::{Error, Result};

/// Accepted record tags.
pub const MAGIC: Aliases = [FourCc::new(b"RLCN"), FourCc::new(b"NCLR")];
/// Accepted palette chunk tags.
pub const PLTT: Aliases = [FourCc::new(b"TTLP"), FourCc::new(b"PLTT")];

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba8 {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha; 0 is fully transparent.
    pub a: u8,
}

impl Rgba8 {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Construct from channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from a BGR555 value.
    pub fn from_bgr555(c: u16) -> Self {
        let [r, g, b] = bgr555_to_rgb8(c);
        Self::new(r, g, b, 0xFF)
    }

    /// Channels as `[r, g, b, a]`.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Expand a 15-bit BGR555 color to 8-bit `[r, g, b]`.
///
/// Each channel maps as `(c5 * 255 + 15) / 31`, rounding so that 0 and 31
/// land exactly on 0 and 255. Bit 15 is ignored.
pub fn bgr555_to_rgb8(c: u16) -> [u8; 3] {
    let expand = |c5: u16| ((c5 as u32 * 255 + 15) / 31) as u8;
    [
        expand(c & 0x1F),
        expand((c >> 5) & 0x1F),
        expand((c >> 10) & 0x1F),
    ]
}

/// Decoded palette record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    /// Raw color format word (3 = 4 bpp, 4 = 8 bpp).
    pub color_format: u32,
    /// Whether the extended-palette flag was set.
    pub extended: bool,
    /// Width of each page (16, 256, or the whole color count).
    pub colors_per_palette: usize,
    /// Pages in file order. Every page has `colors_per_palette` colors.
    pub palettes: Vec<Vec<Rgba8>>,
}

impl Palette {
    /// Decode a palette record from `buf`.
    ///
    /// When `transparent_zero` is set, color 0 of page 0 gets alpha 0, the
    /// usual convention for sprite palettes.
    pub fn parse(buf: &[u8], transparent_zero: bool) -> Result<Self> {
        let header = NitroHeader::parse_expecting(buf, &MAGIC)?;
        let chunk = header
            .find_chunk(buf, &PLTT)?
            .ok_or(Error::MissingChunk {
                record: "NCLR",
                chunk: "PLTT",
            })?;
        let p = chunk.data;
        let base = chunk.data_offset();
        let at = |e: Error| e.rebase(base);

        let color_format = le_u32(p, 0x00).map_err(at)?;
        let extended = le_u32(p, 0x04).map_err(at)? != 0;
        let data_size = le_u32(p, 0x08).map_err(at)? as usize;
        let data_ptr = le_u32(p, 0x0C).map_err(at)?;

        let color_count = data_size / 2;
        let start = rel(p, 0, data_ptr, color_count * 2, 0x0C).map_err(at)?;

        let colors_per_palette = page_width(color_count);
        let mut palettes = Vec::new();
        if colors_per_palette > 0 {
            for page in 0..color_count / colors_per_palette {
                let mut colors = Vec::with_capacity(colors_per_palette);
                for i in 0..colors_per_palette {
                    let off = start + 2 * (page * colors_per_palette + i);
                    colors.push(Rgba8::from_bgr555(le_u16(p, off).map_err(at)?));
                }
                palettes.push(colors);
            }
        }
        if transparent_zero
            && let Some(first) = palettes.first_mut().and_then(|page| page.first_mut())
        {
            first.a = 0;
        }

        Ok(Self {
            color_format,
            extended,
            colors_per_palette,
            palettes,
        })
    }

    /// Total number of colors across all pages.
    pub fn color_count(&self) -> usize {
        self.colors_per_palette * self.palettes.len()
    }

    /// Borrow page `index`.
    pub fn page(&self, index: usize) -> Option<&[Rgba8]> {
        self.palettes.get(index).map(Vec::as_slice)
    }
}

/// Infer the page width for `count` colors.
pub fn page_width(count: usize) -> usize {
    match count {
        0 => 0,
        c if c % 256 == 0 => 256,
        c if c % 16 == 0 => 16,
        c => c,
    }
}
