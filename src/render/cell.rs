use crate::formats::ncer::{Cell, Oam};
use crate::formats::ncgr::{BitDepth, MappingMode, TileSheet};
use crate::formats::nclr::Rgba8;

use super::RenderError;

/// Row-major RGBA image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Rgba8>,
}

impl Bitmap {
    /// A fully transparent bitmap.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba8::TRANSPARENT; width * height],
        }
    }

    /// Pixel at `(x, y)`, or `None` outside the bitmap.
    pub fn get(&self, x: usize, y: usize) -> Option<Rgba8> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    /// Pixels as packed `RGBA` bytes.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_array()).collect()
    }

    fn put(&mut self, x: i32, y: i32, color: Rgba8) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.pixels[y as usize * self.width + x as usize] = color;
        }
    }
}

/// Largest canvas [`compose_cell_bitmap`] allocates, in pixels.
///
/// Object coordinates span 512x256, so real cells stay far below this.
pub const MAX_CANVAS_PIXELS: usize = 1 << 20;

/// Draw `cell` into a bitmap the size of its bounds.
///
/// Bounds covering more than [`MAX_CANVAS_PIXELS`] are rejected.
///
/// `palette` is one page of a [`Palette`](crate::formats::nclr::Palette).
/// 4 bpp objects use bank `palette_bank` of a 256-color page, or the first
/// 16 colors of a smaller one; 8 bpp objects need a full 256-color page.
/// Objects are drawn from last to first so earlier ones end up on top.
/// Color index 0 of a 4 bpp bank and colors with zero alpha are skipped.
pub fn compose_cell_bitmap(
    cell: &Cell,
    sheet: &TileSheet,
    palette: &[Rgba8],
) -> Result<Bitmap, RenderError> {
    let bounds = cell.bounds;
    let width = bounds.width.max(1) as usize;
    let height = bounds.height.max(1) as usize;
    if width.saturating_mul(height) > MAX_CANVAS_PIXELS {
        return Err(RenderError::CanvasTooLarge { width, height });
    }
    let mut bitmap = Bitmap::new(width, height);

    for oam in cell.oams.iter().rev() {
        let depth = if oam.use_8bpp { BitDepth::Bpp8 } else { sheet.depth };
        let colors = bank_colors(palette, depth, oam.palette_bank)?;

        let tiles_x = oam.width as usize / 8;
        let tiles_y = oam.height as usize / 8;
        let stride = match sheet.mapping {
            MappingMode::TwoD => sheet.width_tiles as usize,
            _ => tiles_x,
        };
        let first = first_tile(oam, sheet.mapping, depth);

        for ty in 0..tiles_y {
            for tx in 0..tiles_x {
                let src_x = if oam.h_flip { tiles_x - 1 - tx } else { tx };
                let src_y = if oam.v_flip { tiles_y - 1 - ty } else { ty };
                let index = first + src_y * stride + src_x;
                let tile = sheet
                    .decode_tile(index, depth)
                    .map_err(|_| RenderError::TileOutOfRange { index })?;

                let x0 = oam.x as i32 - bounds.x + tx as i32 * 8;
                let y0 = oam.y as i32 - bounds.y + ty as i32 * 8;
                for (i, &c) in tile.iter().enumerate() {
                    if depth == BitDepth::Bpp4 && c == 0 {
                        continue;
                    }
                    let color = colors[c as usize];
                    if color.a == 0 {
                        continue;
                    }
                    bitmap.put(x0 + (i % 8) as i32, y0 + (i / 8) as i32, color);
                }
            }
        }
    }

    Ok(bitmap)
}

fn bank_colors(palette: &[Rgba8], depth: BitDepth, bank: u8) -> Result<&[Rgba8], RenderError> {
    let too_small = |need| RenderError::PaletteTooSmall {
        bpp: depth.bits(),
        need,
        have: palette.len(),
    };
    match depth {
        BitDepth::Bpp8 if palette.len() < 256 => Err(too_small(256)),
        BitDepth::Bpp8 => Ok(palette),
        BitDepth::Bpp4 if palette.len() >= 256 => {
            let start = bank as usize * 16;
            Ok(&palette[start..start + 16])
        }
        BitDepth::Bpp4 if palette.len() < 16 => Err(too_small(16)),
        BitDepth::Bpp4 => Ok(&palette[..16]),
    }
}

/// Sheet tile number of the object's first tile.
///
/// The tile field counts 32-byte units in 2D mode and `32 << n` byte units
/// in the 1D boundary modes, so it is rescaled to whole tiles of `depth`.
fn first_tile(oam: &Oam, mapping: MappingMode, depth: BitDepth) -> usize {
    let unit = match mapping {
        MappingMode::OneD64K => 64,
        MappingMode::OneD128K => 128,
        MappingMode::OneD256K => 256,
        _ => 32,
    };
    oam.tile_index as usize * unit / depth.tile_bytes()
}
