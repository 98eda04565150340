//! Consumer-side helpers that combine decoded records.
//!
//! Nothing here touches raw bytes. The functions take records produced by
//! [`formats`](crate::formats) and return plain data: an RGBA bitmap for a
//! cell, keyframe tracks for a mapped animation.

mod animation;
mod cell;

use thiserror::Error;

pub use animation::{Keyframe, Track, flatten_animation};
pub use cell::{Bitmap, MAX_CANVAS_PIXELS, compose_cell_bitmap};

/// Records that decoded fine but do not fit together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The palette page cannot serve the tile bit depth.
    #[error("{bpp} bpp tiles need {need} colors, palette has {have}")]
    PaletteTooSmall {
        bpp: usize,
        need: usize,
        have: usize,
    },
    /// The cell bounds would need a canvas above
    /// [`MAX_CANVAS_PIXELS`](crate::render::MAX_CANVAS_PIXELS).
    #[error("cell canvas {width}x{height} is too large")]
    CanvasTooLarge { width: usize, height: usize },
    /// An OAM refers to a tile past the end of the sheet.
    #[error("tile {index} is outside the tile sheet")]
    TileOutOfRange { index: usize },
    /// A record refers to an index another record does not have.
    #[error("{what} {index} out of range ({len} available)")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
}
