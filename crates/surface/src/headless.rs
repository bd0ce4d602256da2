use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, trace};

use crate::runtime::{BoxedTimeSource, TimeSample};
use crate::{validate_uniform, SurfaceError, UniformSurface, UNIFORM_TIME};

/// One recorded `set_uniform` call.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformWrite {
    pub name: String,
    pub values: Vec<f32>,
}

/// Surface that keeps uniforms in memory instead of uploading them to a GPU.
///
/// Only the latest value of each uniform is kept. Surfaces built with
/// `with_write_log` also append every write to a log so tests can replay
/// exactly what a real backend would have received. Frames advance the
/// surface's own clock and publish it through the `u_time` uniform.
pub struct HeadlessSurface {
    label: String,
    width: u32,
    height: u32,
    program: Option<String>,
    uniforms: BTreeMap<String, Vec<f32>>,
    writes: Option<Vec<UniformWrite>>,
    frames: u64,
    clock: BoxedTimeSource,
}

impl fmt::Debug for HeadlessSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessSurface")
            .field("label", &self.label)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("loaded", &self.program.is_some())
            .field("uniforms", &self.uniforms.len())
            .field("frames", &self.frames)
            .finish()
    }
}

impl HeadlessSurface {
    pub fn new(label: impl Into<String>, width: u32, height: u32, clock: BoxedTimeSource) -> Self {
        Self {
            label: label.into(),
            width,
            height,
            program: None,
            uniforms: BTreeMap::new(),
            writes: None,
            frames: 0,
            clock,
        }
    }

    /// Keeps a log of every uniform write from now on.
    pub fn with_write_log(mut self) -> Self {
        self.writes = Some(Vec::new());
        self
    }

    /// Installs a program; previously written uniforms are discarded just as a
    /// relinked GPU program would lose them.
    pub fn load(&mut self, program: &str) -> Result<(), SurfaceError> {
        if program.trim().is_empty() {
            return Err(SurfaceError::EmptyProgram);
        }
        self.program = Some(program.to_string());
        self.uniforms.clear();
        self.frames = 0;
        self.clock.reset();
        debug!(surface = %self.label, bytes = program.len(), "loaded shader program");
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.program.is_some()
    }

    /// Changes the drawing-buffer size. Zero dimensions are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            debug!(surface = %self.label, width, height, "ignoring degenerate resize");
            return;
        }
        self.width = width;
        self.height = height;
    }

    /// Frames rendered since the current program was loaded.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Samples the clock and publishes it as `u_time`.
    pub fn render_frame(&mut self) -> Result<TimeSample, SurfaceError> {
        if self.program.is_none() {
            return Err(SurfaceError::NotLoaded(self.label.clone()));
        }
        let sample = self.clock.sample();
        self.uniforms
            .insert(UNIFORM_TIME.to_string(), vec![sample.seconds]);
        self.frames = sample.frame_index + 1;
        Ok(sample)
    }

    pub fn uniform(&self, name: &str) -> Option<&[f32]> {
        self.uniforms.get(name).map(Vec::as_slice)
    }

    /// Logged writes, oldest first. Empty unless built `with_write_log`.
    pub fn writes(&self) -> &[UniformWrite] {
        self.writes.as_deref().unwrap_or_default()
    }

    /// Writes for a single uniform, oldest first.
    pub fn writes_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a [f32]> + 'a {
        self.writes()
            .iter()
            .filter(move |write| write.name == name)
            .map(|write| write.values.as_slice())
    }

    pub fn take_writes(&mut self) -> Vec<UniformWrite> {
        self.writes.as_mut().map(std::mem::take).unwrap_or_default()
    }
}

impl UniformSurface for HeadlessSurface {
    fn label(&self) -> &str {
        &self.label
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_uniform(&mut self, name: &str, values: &[f32]) -> Result<(), SurfaceError> {
        if self.program.is_none() {
            return Err(SurfaceError::NotLoaded(self.label.clone()));
        }
        validate_uniform(name, values)?;
        trace!(surface = %self.label, uniform = name, ?values, "set uniform");
        self.uniforms.insert(name.to_string(), values.to_vec());
        if let Some(writes) = self.writes.as_mut() {
            writes.push(UniformWrite {
                name: name.to_string(),
                values: values.to_vec(),
            });
        }
        Ok(())
    }

    fn elapsed_time(&self) -> f32 {
        self.uniforms
            .get(UNIFORM_TIME)
            .and_then(|values| values.first().copied())
            .unwrap_or(0.0)
    }
}
