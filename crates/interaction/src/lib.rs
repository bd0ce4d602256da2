mod controller;
mod geometry;
mod grid;
mod mode;

pub use controller::{ControllerState, InteractionController, InteractionSettings};
pub use geometry::{
    clamp, preset_move, random_position, CursorRect, PresetMove, CURSOR_SIZE_MAX,
    CURSOR_SIZE_MIN, PRESET_TABLE_LEN,
};
pub use grid::{compute_grid, CssGrid, GridContainer, GridSizer, GridSpec, GridStats};
pub use mode::InteractionMode;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ControllerError {
    #[error("invalid mode '{0}'; expected click, auto, or rnd")]
    InvalidMode(String),
    #[error("surface '{0}' is already registered")]
    DuplicateSurface(String),
    #[error("surface '{label}' has degenerate size {width}x{height}")]
    DegenerateSurface {
        label: String,
        width: u32,
        height: u32,
    },
    #[error("surface is borrowed elsewhere and cannot be registered")]
    SurfaceBusy,
}
