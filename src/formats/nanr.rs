//! NANR (Nitro ANimation Resource) - cell animation banks.
//!
//! ## Layout
//! ```text
//! [0x00] Nitro header, magic "RNAN" / "NANR"
//! [0x10] ABNK chunk ("KNBA" / "ABNK")
//! ```
//!
//! ## ABNK payload
//! ```text
//! [0x00] CellCount                                     (u16 LE)
//! [0x02] FrameCount (all cells)                        (u16 LE)
//! [0x04] CellTableOffset, relative to payload          (u32 LE)
//! [0x08] FrameTableOffset, relative to payload         (u32 LE)
//! [0x0C] TransformPoolOffset, relative to payload      (u32 LE)
//! ```
//!
//! ## Animation cell (0x10 bytes)
//! ```text
//! [0x00] FrameCount                                    (u32 LE)
//! [0x04] FrameType (0, 1, 2)                           (u16 LE)
//! [0x06] CellType                                      (u16 LE)
//! [0x08] Unknown                                       (u32 LE)
//! [0x0C] FirstFrameOffset, relative to frame table     (u32 LE)
//! ```
//!
//! ## Frame (8 bytes)
//! ```text
//! [0x00] TransformOffset, relative to transform pool   (u32 LE)
//! [0x04] Duration in 60 Hz ticks                       (u16 LE)
//! [0x06] Padding                                       (u16 LE)
//! ```
//!
//! ## Transform, by the owning cell's frame type
//! ```text
//! 0 ( 4 bytes): cell u16, pad u16
//! 1 (16 bytes): cell u16, rotation i16, scale_x i32, scale_y i32, x i16, y i16
//! 2 ( 8 bytes): cell u16, pad u16, x i16, y i16
//! ```
//! Rotation is in 1/65536 turns; scale is 20.12 fixed point.

use crate::formats::nitro::{Aliases, FourCc, NitroHeader};
use crate::utils::{le_i16, le_i32, le_u16, le_u32, rel};
use crate::{Error, Result};

/// Accepted record tags.
pub const MAGIC: Aliases = [FourCc::new(b"RNAN"), FourCc::new(b"NANR")];
/// Accepted animation bank chunk tags.
pub const ABNK: Aliases = [FourCc::new(b"KNBA"), FourCc::new(b"ABNK")];

/// Ticks per second of frame durations.
pub const TICKS_PER_SECOND: f32 = 60.0;

/// Transform payload layout shared by every frame of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    /// Cell index only.
    Index,
    /// Cell index, rotation, scale and position.
    IndexSrt,
    /// Cell index and position.
    IndexTranslate,
}

impl FrameType {
    /// Map the raw frame-type word.
    pub fn from_raw(v: u16) -> Option<Self> {
        match v {
            0 => Some(Self::Index),
            1 => Some(Self::IndexSrt),
            2 => Some(Self::IndexTranslate),
            _ => None,
        }
    }

    /// Size of one transform payload in bytes.
    pub fn transform_size(self) -> usize {
        match self {
            Self::Index => 4,
            Self::IndexSrt => 16,
            Self::IndexTranslate => 8,
        }
    }
}

/// Per-frame transform; the variant follows the owning cell's frame type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Index {
        cell: u16,
    },
    IndexSrt {
        cell: u16,
        /// 1/65536 of a turn.
        rotation: i16,
        /// 20.12 fixed point.
        scale_x: i32,
        /// 20.12 fixed point.
        scale_y: i32,
        x: i16,
        y: i16,
    },
    IndexTranslate {
        cell: u16,
        x: i16,
        y: i16,
    },
}

impl Transform {
    /// Cell bank index shown by this frame.
    pub fn cell(&self) -> u16 {
        match *self {
            Self::Index { cell }
            | Self::IndexSrt { cell, .. }
            | Self::IndexTranslate { cell, .. } => cell,
        }
    }

    /// Position offset; `(0, 0)` for index-only frames.
    pub fn position(&self) -> (i16, i16) {
        match *self {
            Self::Index { .. } => (0, 0),
            Self::IndexSrt { x, y, .. } | Self::IndexTranslate { x, y, .. } => (x, y),
        }
    }

    /// Rotation in degrees, only for rotate/scale frames.
    pub fn rotation_degrees(&self) -> Option<f32> {
        match *self {
            Self::IndexSrt { rotation, .. } => Some(rotation_to_degrees(rotation)),
            _ => None,
        }
    }

    /// Scale factors, only for rotate/scale frames.
    pub fn scale(&self) -> Option<(f32, f32)> {
        match *self {
            Self::IndexSrt { scale_x, scale_y, .. } => Some((fx32(scale_x), fx32(scale_y))),
            _ => None,
        }
    }
}

/// Convert a 1/65536-turn angle to degrees.
pub fn rotation_to_degrees(rotation: i16) -> f32 {
    rotation as f32 * 360.0 / 65536.0
}

/// Convert a 20.12 fixed point value.
pub fn fx32(v: i32) -> f32 {
    v as f32 / 4096.0
}

/// One animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Duration in 60 Hz ticks.
    pub duration: u16,
    pub transform: Transform,
}

impl Frame {
    /// Duration in seconds.
    pub fn seconds(&self) -> f32 {
        self.duration as f32 / TICKS_PER_SECOND
    }
}

/// One animated cell: a frame sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationCell {
    pub frame_type: FrameType,
    /// Raw cell-type word.
    pub cell_type: u16,
    pub frames: Vec<Frame>,
}

/// Decoded animation bank record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationBank {
    /// Frame count declared in the bank header.
    pub declared_frames: u16,
    pub cells: Vec<AnimationCell>,
}

impl AnimationBank {
    /// Decode an animation bank record from `buf`.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        let header = NitroHeader::parse_expecting(buf, &MAGIC)?;
        let chunk = header
            .find_chunk(buf, &ABNK)?
            .ok_or(Error::MissingChunk {
                record: "NANR",
                chunk: "ABNK",
            })?;
        Self::parse_abnk(chunk.data).map_err(|e| e.rebase(chunk.data_offset()))
    }

    fn parse_abnk(p: &[u8]) -> Result<Self> {
        let count = le_u16(p, 0x00)? as usize;
        let declared_frames = le_u16(p, 0x02)?;
        let cell_table = rel(p, 0, le_u32(p, 0x04)?, count * 0x10, 0x04)?;
        let frame_table = rel(p, 0, le_u32(p, 0x08)?, 0, 0x08)?;
        let pool = rel(p, 0, le_u32(p, 0x0C)?, 0, 0x0C)?;

        let mut cells = Vec::with_capacity(count);
        for i in 0..count {
            cells.push(parse_cell(p, cell_table + i * 0x10, frame_table, pool)?);
        }
        tracing::trace!(cells = cells.len(), "decoded animation bank");

        Ok(Self {
            declared_frames,
            cells,
        })
    }
}

fn parse_cell(p: &[u8], at: usize, frame_table: usize, pool: usize) -> Result<AnimationCell> {
    let frame_count = le_u32(p, at)? as usize;
    let raw_type = le_u16(p, at + 0x04)?;
    let frame_type = FrameType::from_raw(raw_type)
        .ok_or(Error::format("unknown animation frame type", at + 0x04))?;
    let cell_type = le_u16(p, at + 0x06)?;
    let frame_ptr = le_u32(p, at + 0x0C)?;
    let first = rel(p, frame_table, frame_ptr, frame_count.saturating_mul(8), at + 0x0C)?;

    let mut frames = Vec::with_capacity(frame_count);
    for f in 0..frame_count {
        let w = first + f * 8;
        let t = rel(p, pool, le_u32(p, w)?, frame_type.transform_size(), w)?;
        frames.push(Frame {
            duration: le_u16(p, w + 0x04)?,
            transform: parse_transform(p, t, frame_type)?,
        });
    }

    Ok(AnimationCell {
        frame_type,
        cell_type,
        frames,
    })
}

fn parse_transform(p: &[u8], t: usize, frame_type: FrameType) -> Result<Transform> {
    let cell = le_u16(p, t)?;
    Ok(match frame_type {
        FrameType::Index => Transform::Index { cell },
        FrameType::IndexSrt => Transform::IndexSrt {
            cell,
            rotation: le_i16(p, t + 0x02)?,
            scale_x: le_i32(p, t + 0x04)?,
            scale_y: le_i32(p, t + 0x08)?,
            x: le_i16(p, t + 0x0C)?,
            y: le_i16(p, t + 0x0E)?,
        },
        FrameType::IndexTranslate => Transform::IndexTranslate {
            cell,
            x: le_i16(p, t + 0x04)?,
            y: le_i16(p, t + 0x06)?,
        },
    })
}
