//! Single authority for where the shared cursor is and how it moves.
//!
//! Every position change funnels through `move_to`, which shifts the current
//! rect into `previous` before broadcasting both to each registered surface.
//! Timed modes are driven by `tick(now)`: the host loop calls it and the armed
//! `PeriodicTask` decides whether an auto/random step is due.
use std::rc::Rc;
use std::time::{Duration, Instant};

use galleryconfig::InteractionConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;
use scheduler::PeriodicTask;
use serde::Serialize;
use surface::{
    SurfaceError, SurfaceRef, UniformSurface, UNIFORM_CURRENT_CURSOR, UNIFORM_PREVIOUS_CURSOR,
    UNIFORM_TIME_CURSOR_CHANGE,
};
use tracing::{debug, error, info, warn};

use crate::geometry::{
    clamp, preset_move, random_position, CursorRect, PresetMove, CURSOR_SIZE_MAX, CURSOR_SIZE_MIN,
    PRESET_TABLE_LEN,
};
use crate::mode::InteractionMode;
use crate::ControllerError;

const KEY_STEP_X: f32 = 10.0;
const KEY_STEP_Y: f32 = 20.0;

#[derive(Debug, Clone)]
pub struct InteractionSettings {
    pub interval: Duration,
    pub preset_count: u32,
    pub default_cursor: CursorRect,
    /// Use a euclidean remainder so stepping back from index 0 lands on the
    /// last preset. Off by default: negative indices match no preset and the
    /// cursor stays where it was.
    pub normalize_preset_index: bool,
    pub seed: u64,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            preset_count: PRESET_TABLE_LEN as u32,
            default_cursor: CursorRect::default(),
            normalize_preset_index: false,
            seed: 0,
        }
    }
}

impl InteractionSettings {
    pub fn from_config(config: &InteractionConfig, seed: u64) -> Self {
        Self {
            interval: config.interval,
            preset_count: config.preset_count,
            default_cursor: config.cursor.into(),
            normalize_preset_index: config.normalize_preset_index,
            seed,
        }
    }
}

/// Point-in-time view of the controller for logging and debugging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerState {
    pub mode: InteractionMode,
    pub current: CursorRect,
    pub previous: CursorRect,
    pub preset_index: i32,
    pub surface_count: usize,
    pub timer_armed: bool,
}

pub struct InteractionController {
    settings: InteractionSettings,
    mode: InteractionMode,
    current: CursorRect,
    previous: CursorRect,
    preset_index: i32,
    timer: Option<PeriodicTask>,
    dimensions: Option<(f32, f32)>,
    surfaces: Vec<SurfaceRef>,
    rng: StdRng,
}

impl InteractionController {
    pub fn new(settings: InteractionSettings) -> Self {
        let cursor = settings.default_cursor;
        let rng = StdRng::seed_from_u64(settings.seed);
        Self {
            settings,
            mode: InteractionMode::Manual,
            current: cursor,
            previous: cursor,
            preset_index: 0,
            timer: None,
            dimensions: None,
            surfaces: Vec::new(),
            rng,
        }
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn current(&self) -> CursorRect {
        self.current
    }

    pub fn previous(&self) -> CursorRect {
        self.previous
    }

    pub fn preset_index(&self) -> i32 {
        self.preset_index
    }

    pub fn dimensions(&self) -> Option<(f32, f32)> {
        self.dimensions
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    pub fn timer_armed(&self) -> bool {
        self.timer.is_some()
    }

    /// Bounding box for preset and random coordinates.
    pub fn set_dimensions(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            warn!(width, height, "ignoring degenerate cursor bounds");
            return;
        }
        self.dimensions = Some((width as f32, height as f32));
        debug!(width, height, "cursor bounds updated");
    }

    /// Changes the cursor size; position is untouched and nothing is broadcast.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.current.width = clamp(width, CURSOR_SIZE_MIN, CURSOR_SIZE_MAX);
        self.current.height = clamp(height, CURSOR_SIZE_MIN, CURSOR_SIZE_MAX);
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.previous = self.current;
        self.current.x = x;
        self.current.y = y;
        self.broadcast();
    }

    pub fn set_mode(&mut self, mode: InteractionMode, now: Instant) {
        self.mode = mode;
        self.timer = None;
        if mode.is_timed() {
            match PeriodicTask::arm(self.settings.interval, now) {
                Ok(task) => self.timer = Some(task),
                Err(err) => warn!(%mode, error = %err, "unable to arm cursor timer"),
            }
        }
        info!(%mode, interval_ms = self.settings.interval.as_millis() as u64, "interaction mode changed");
    }

    /// Parses and applies a mode name. Unknown names leave the mode and timer
    /// untouched and return `false`.
    pub fn set_mode_by_name(&mut self, name: &str, now: Instant) -> bool {
        match name.parse::<InteractionMode>() {
            Ok(mode) => {
                self.set_mode(mode, now);
                true
            }
            Err(err) => {
                warn!(error = %err, "rejected mode change");
                false
            }
        }
    }

    /// Fires the armed timer if it is due. Returns whether a step ran.
    pub fn tick(&mut self, now: Instant) -> bool {
        let due = self.timer.as_mut().is_some_and(|task| task.poll(now));
        if !due {
            return false;
        }
        match self.mode {
            InteractionMode::Auto => self.advance_preset(1),
            InteractionMode::Random => self.random_move(),
            InteractionMode::Manual => {}
        }
        true
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.timer.as_ref().map(PeriodicTask::next_due)
    }

    pub fn advance_preset(&mut self, delta: i32) {
        let Some((width, height)) = self.dimensions else {
            debug!("no cursor bounds yet; preset step skipped");
            return;
        };

        let count = self.settings.preset_count.max(1) as i32;
        self.preset_index = if self.settings.normalize_preset_index {
            (self.preset_index + delta).rem_euclid(count)
        } else {
            (self.preset_index + delta) % count
        };

        match preset_move(self.preset_index, width, height) {
            Some(PresetMove::Single((x, y))) => self.move_to(x, y),
            Some(PresetMove::Double((x1, y1), (x2, y2))) => {
                self.move_to(x1, y1);
                self.move_to(x2, y2);
            }
            None => debug!(
                index = self.preset_index,
                "preset index has no position; cursor unchanged"
            ),
        }
    }

    pub fn random_move(&mut self) {
        let Some((width, height)) = self.dimensions else {
            debug!("no cursor bounds yet; random step skipped");
            return;
        };
        let (x, y) = random_position(&mut self.rng, width, height);
        self.move_to(x, y);
    }

    /// Pointer position is in DOM space (origin top-left); canvas space has
    /// its origin bottom-left.
    pub fn on_pointer_click(&mut self, x: f32, y: f32, canvas_height: f32) {
        if self.mode != InteractionMode::Manual {
            return;
        }
        self.move_to(x, canvas_height - y);
    }

    pub fn on_global_click(&mut self) {
        if self.mode == InteractionMode::Auto {
            self.advance_preset(1);
        }
    }

    /// Returns `true` so the host suppresses the native context menu.
    pub fn on_context_menu(&mut self) -> bool {
        if self.mode == InteractionMode::Auto {
            self.advance_preset(-1);
        }
        true
    }

    pub fn on_key(&mut self, key: &str) {
        if key.is_empty() {
            return;
        }
        let (dx, dy) = match key {
            "ArrowDown" | "Enter" => (0.0, -KEY_STEP_Y),
            "ArrowLeft" | "Backspace" => (-KEY_STEP_X, 0.0),
            "ArrowUp" => (0.0, KEY_STEP_Y),
            _ => (KEY_STEP_X, 0.0),
        };
        self.move_to(self.current.x + dx, self.current.y + dy);
    }

    /// Adds a surface to the broadcast list. The first surface accepted while
    /// no bounds are known becomes the master and supplies them.
    pub fn register_surface(&mut self, surface: SurfaceRef) -> Result<(), ControllerError> {
        let (label, (width, height)) = {
            let guard = surface
                .try_borrow()
                .map_err(|_| ControllerError::SurfaceBusy)?;
            (guard.label().to_string(), guard.size())
        };

        if self.surfaces.iter().any(|known| Rc::ptr_eq(known, &surface)) {
            return Err(ControllerError::DuplicateSurface(label));
        }
        if width == 0 || height == 0 {
            return Err(ControllerError::DegenerateSurface {
                label,
                width,
                height,
            });
        }

        if self.dimensions.is_none() {
            self.set_dimensions(width, height);
            info!(surface = %label, width, height, "master surface selected");
        }
        self.surfaces.push(surface);
        debug!(surface = %label, total = self.surfaces.len(), "surface registered");
        Ok(())
    }

    pub fn clear_surfaces(&mut self) {
        self.surfaces.clear();
    }

    /// Pushes the cursor pair to every surface. A surface that fails is logged
    /// and skipped.
    pub fn broadcast(&self) {
        let current = self.current.to_uniform();
        let previous = self.previous.to_uniform();
        for surface in &self.surfaces {
            let Ok(mut guard) = surface.try_borrow_mut() else {
                error!("surface busy; cursor update skipped");
                continue;
            };
            if let Err(err) = push_cursor(&mut *guard, &current, &previous) {
                error!(surface = %guard.label(), error = %err, "failed to set cursor uniforms");
            }
        }
    }

    pub fn state(&self) -> ControllerState {
        ControllerState {
            mode: self.mode,
            current: self.current,
            previous: self.previous,
            preset_index: self.preset_index,
            surface_count: self.surfaces.len(),
            timer_armed: self.timer.is_some(),
        }
    }

    /// Disarms the timer and releases every surface handle.
    pub fn destroy(&mut self) {
        self.timer = None;
        self.surfaces.clear();
        self.dimensions = None;
        info!("interaction controller destroyed");
    }
}

fn push_cursor(
    surface: &mut dyn UniformSurface,
    current: &[f32; 4],
    previous: &[f32; 4],
) -> Result<(), SurfaceError> {
    surface.set_uniform(UNIFORM_CURRENT_CURSOR, current)?;
    surface.set_uniform(UNIFORM_PREVIOUS_CURSOR, previous)?;
    let stamp = surface.elapsed_time();
    surface.set_uniform(UNIFORM_TIME_CURSOR_CHANGE, &[stamp])
}
