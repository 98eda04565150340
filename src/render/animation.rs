use crate::formats::nanr::AnimationBank;
use crate::formats::ncer::CellBank;
use crate::formats::nmcr::MappedAnimation;

use super::RenderError;

/// One point of a [`Track`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    /// Seconds since the start of the animation.
    pub time: f32,
    /// Frame offset plus the mapped cell's placement.
    pub position: (i32, i32),
    /// Degrees; only rotate/scale frames carry one.
    pub rotation: Option<f32>,
    /// Cell bank index, set on the first frame and whenever it changes.
    pub sprite_index: Option<u16>,
}

/// Keyframes for one mapped cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Animation bank cell this track was built from.
    pub animation_cell: u16,
    /// Cell shown by the first frame; `None` when there are no frames.
    pub cell: Option<u16>,
    pub keyframes: Vec<Keyframe>,
    /// Negated priority, so that ascending order draws back to front.
    pub sort_priority: i32,
    /// Total length in seconds.
    pub duration: f32,
}

impl Track {
    /// Name of the node this track animates: the first frame's cell index.
    pub fn cell_path(&self) -> Option<String> {
        self.cell.map(|c| c.to_string())
    }
}

/// Expand a mapped animation into one keyframe track per mapped cell.
///
/// Frame times accumulate `duration / 60` seconds. Every referenced
/// animation cell and cell bank entry must exist.
pub fn flatten_animation(
    mapped: &MappedAnimation,
    animations: &AnimationBank,
    cells: &CellBank,
) -> Result<Vec<Track>, RenderError> {
    mapped
        .cells
        .iter()
        .map(|placed| {
            let index = placed.animation_cell as usize;
            let anim = animations
                .cells
                .get(index)
                .ok_or(RenderError::IndexOutOfRange {
                    what: "animation cell",
                    index,
                    len: animations.cells.len(),
                })?;

            let mut time = 0.0;
            let mut shown: Option<u16> = None;
            let mut keyframes = Vec::with_capacity(anim.frames.len());
            for frame in &anim.frames {
                let cell = frame.transform.cell();
                if cell as usize >= cells.cells.len() {
                    return Err(RenderError::IndexOutOfRange {
                        what: "cell",
                        index: cell as usize,
                        len: cells.cells.len(),
                    });
                }
                let (x, y) = frame.transform.position();
                keyframes.push(Keyframe {
                    time,
                    position: (x as i32 + placed.x as i32, y as i32 + placed.y as i32),
                    rotation: frame.transform.rotation_degrees(),
                    sprite_index: (shown != Some(cell)).then_some(cell),
                });
                shown = Some(cell);
                time += frame.seconds();
            }

            Ok(Track {
                animation_cell: placed.animation_cell,
                cell: anim.frames.first().map(|f| f.transform.cell()),
                keyframes,
                sort_priority: -(placed.priority as i32),
                duration: time,
            })
        })
        .collect()
}
