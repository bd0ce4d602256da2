use rand::Rng;
use serde::Serialize;

pub const CURSOR_SIZE_MIN: f32 = 1.0;
pub const CURSOR_SIZE_MAX: f32 = 100.0;

/// Entries in the inset-corner table; index 6 is the double move.
pub const PRESET_TABLE_LEN: i32 = 7;

const INSET_NEAR: f32 = 0.1;
const INSET_FAR: f32 = 0.9;

/// Cursor rectangle in canvas space (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CursorRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CursorRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Component order shaders expect: `(x, y, width, height)`.
    pub fn to_uniform(self) -> [f32; 4] {
        [self.x, self.y, self.width, self.height]
    }
}

impl Default for CursorRect {
    fn default() -> Self {
        Self::new(0.0, 0.0, 10.0, 20.0)
    }
}

impl From<galleryconfig::CursorDefaults> for CursorRect {
    fn from(value: galleryconfig::CursorDefaults) -> Self {
        Self::new(
            value.x,
            value.y,
            clamp(value.width, CURSOR_SIZE_MIN, CURSOR_SIZE_MAX),
            clamp(value.height, CURSOR_SIZE_MIN, CURSOR_SIZE_MAX),
        )
    }
}

pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PresetMove {
    Single((f32, f32)),
    /// Two moves in a row; the first ends up as the previous rect.
    Double((f32, f32), (f32, f32)),
}

/// Looks up a preset index in the inset-corner table for a master of the
/// given size. Indices outside `0..7` have no entry.
pub fn preset_move(index: i32, width: f32, height: f32) -> Option<PresetMove> {
    let bottom = height * INSET_NEAR;
    let top = height * INSET_FAR;
    let left = width * INSET_NEAR;
    let right = width * INSET_FAR;

    let step = match index {
        0 => PresetMove::Single((left, top)),
        1 => PresetMove::Single((right, bottom)),
        2 => PresetMove::Single((right, top)),
        3 => PresetMove::Single((left, top)),
        4 => PresetMove::Single((left, bottom)),
        5 => PresetMove::Single((right, bottom)),
        6 => PresetMove::Double((right, top), (left, bottom)),
        _ => return None,
    };
    Some(step)
}

pub fn random_position<R: Rng + ?Sized>(rng: &mut R, width: f32, height: f32) -> (f32, f32) {
    (rng.gen::<f32>() * width, rng.gen::<f32>() * height)
}
