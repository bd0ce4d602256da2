//! Narrow capability surface for anything that can run a cursor shader.
//!
//! The interaction layer never touches a GPU context directly; it talks to
//! `UniformSurface` implementations through shared `SurfaceRef` handles.
//! `HeadlessSurface` is the in-process backend used by the playground host and
//! by tests that need to observe uniform traffic.
mod headless;
mod runtime;

pub use headless::{HeadlessSurface, UniformWrite};
pub use runtime::{
    time_source_for_policy, BoxedTimeSource, ClockPolicy, FixedTimeSource, SystemTimeSource,
    TimeSample, TimeSource,
};

use std::cell::RefCell;
use std::rc::Rc;

/// Four-component cursor rectangle of the latest move.
pub const UNIFORM_CURRENT_CURSOR: &str = "iCurrentCursor";
/// Four-component cursor rectangle of the move before the latest one.
pub const UNIFORM_PREVIOUS_CURSOR: &str = "iPreviousCursor";
/// Surface-local elapsed time captured when the cursor last moved.
pub const UNIFORM_TIME_CURSOR_CHANGE: &str = "iTimeCursorChange";
/// Elapsed-time uniform each surface maintains for its own program.
pub const UNIFORM_TIME: &str = "u_time";

/// Uniforms accept between one and four float components.
pub const MAX_UNIFORM_COMPONENTS: usize = 4;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SurfaceError {
    #[error("shader program must not be empty")]
    EmptyProgram,
    #[error("surface '{0}' has no program loaded")]
    NotLoaded(String),
    #[error("uniform '{name}' expects 1..=4 components, got {count}")]
    InvalidArity { name: String, count: usize },
    #[error("uniform '{0}' received a non-finite value")]
    NonFinite(String),
}

/// Capability every rendering backend exposes to the interaction layer.
pub trait UniformSurface {
    /// Human-readable identifier used in logs.
    fn label(&self) -> &str;
    /// Pixel size of the drawing buffer.
    fn size(&self) -> (u32, u32);
    /// Writes a named uniform with one to four float components.
    fn set_uniform(&mut self, name: &str, values: &[f32]) -> Result<(), SurfaceError>;
    /// Current value of this surface's own elapsed-time uniform.
    fn elapsed_time(&self) -> f32;
}

/// Shared, single-threaded handle to a surface.
pub type SurfaceRef = Rc<RefCell<dyn UniformSurface>>;

/// Wraps a concrete surface so the host can keep a typed handle while the
/// interaction layer holds the erased `SurfaceRef`.
pub fn shared<S: UniformSurface + 'static>(surface: S) -> Rc<RefCell<S>> {
    Rc::new(RefCell::new(surface))
}

pub(crate) fn validate_uniform(name: &str, values: &[f32]) -> Result<(), SurfaceError> {
    if values.is_empty() || values.len() > MAX_UNIFORM_COMPONENTS {
        return Err(SurfaceError::InvalidArity {
            name: name.to_string(),
            count: values.len(),
        });
    }
    if values.iter().any(|value| !value.is_finite()) {
        return Err(SurfaceError::NonFinite(name.to_string()));
    }
    Ok(())
}
