use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use catalog::{CacheStats, Catalog, CatalogError, LoadedShader, ShaderEntry};
use interaction::{
    ControllerState, CssGrid, GridSizer, GridStats, InteractionController, InteractionMode,
    InteractionSettings,
};
use serde::Serialize;
use surface::{
    shared, time_source_for_policy, ClockPolicy, HeadlessSurface, UniformSurface,
    UNIFORM_CURRENT_CURSOR, UNIFORM_TIME_CURSOR_CHANGE,
};
use tracing::{debug, error, info, warn};

use crate::script::ScriptEvent;

pub struct HostOptions {
    pub surface_size: (u32, u32),
    pub clock: ClockPolicy,
    pub resize_debounce: Duration,
}

struct Card {
    shader: LoadedShader,
    surface: Rc<RefCell<HeadlessSurface>>,
}

/// One page worth of shader cards sharing a cursor controller and a grid.
///
/// The host owns the catalog so cards can be added, removed, or rebuilt from
/// disk while it runs; every change to the card list re-applies the grid and
/// re-syncs the controller's surface list.
pub struct Playground {
    catalog: Catalog,
    entries: Vec<ShaderEntry>,
    settings: InteractionSettings,
    clock: ClockPolicy,
    card_size: (u32, u32),
    pending_size: Option<(u32, u32)>,
    controller: InteractionController,
    grid: GridSizer<CssGrid>,
    cards: Vec<Card>,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub controller: ControllerState,
    pub grid: GridStats,
    pub template: GridTemplate,
    pub assets: CacheStats,
    pub shaders: Vec<ShaderReport>,
}

#[derive(Debug, Serialize)]
pub struct GridTemplate {
    pub columns: String,
    pub rows: String,
}

#[derive(Debug, Serialize)]
pub struct ShaderReport {
    pub name: String,
    pub base_name: String,
    pub description: String,
    pub size: (u32, u32),
    pub frames: u64,
    pub current_cursor: Option<Vec<f32>>,
    pub time_cursor_change: Option<f32>,
}

impl Playground {
    /// Loads every entry and creates its card. Only a catalog-wide failure,
    /// such as a missing wrapper template, is an error.
    pub fn build(
        catalog: Catalog,
        entries: Vec<ShaderEntry>,
        settings: InteractionSettings,
        options: HostOptions,
    ) -> Result<Self, CatalogError> {
        let mut playground = Self {
            catalog,
            entries,
            controller: InteractionController::new(settings.clone()),
            settings,
            clock: options.clock,
            card_size: options.surface_size,
            pending_size: None,
            grid: GridSizer::new(CssGrid::default(), options.resize_debounce),
            cards: Vec::new(),
        };
        playground.populate()?;
        Ok(playground)
    }

    pub fn start(&mut self, mode: InteractionMode, now: Instant) {
        self.controller.set_mode(mode, now);
    }

    /// When the cursor timer fires next, if one is armed.
    pub fn next_due(&self) -> Option<Instant> {
        self.controller.next_due()
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    /// Finds a shown shader by title or base name.
    pub fn shader(&self, query: &str) -> Option<&LoadedShader> {
        self.cards
            .iter()
            .map(|card| &card.shader)
            .find(|shader| shader.entry.matches(query))
    }

    /// Loads `base_name` and appends its card. Returns `false` when the shader
    /// is already shown or its files could not be turned into a card.
    pub fn add_shader(&mut self, base_name: &str) -> Result<bool, CatalogError> {
        let entry = ShaderEntry::from_base_name(base_name);
        if self.shader(&entry.base_name).is_some() {
            warn!(shader = %entry.name, "shader is already shown");
            return Ok(false);
        }

        let Some(shader) = self.catalog.load(std::slice::from_ref(&entry))?.pop() else {
            return Ok(false);
        };
        if !self.attach(shader) {
            return Ok(false);
        }
        if !self.entries.contains(&entry) {
            self.entries.push(entry.clone());
        }
        self.grid.apply(self.cards.len());
        info!(shader = %entry.name, cards = self.cards.len(), "added shader");
        Ok(true)
    }

    /// Drops the first card whose title or base name matches `query`.
    pub fn remove_shader(&mut self, query: &str) -> bool {
        let Some(index) = self
            .cards
            .iter()
            .position(|card| card.shader.entry.matches(query))
        else {
            warn!(query, "no shader card matches");
            return false;
        };

        let card = self.cards.remove(index);
        self.entries
            .retain(|entry| entry.base_name != card.shader.entry.base_name);
        self.resync_surfaces();
        self.grid.apply(self.cards.len());
        info!(shader = %card.shader.entry.name, cards = self.cards.len(), "removed shader");
        true
    }

    /// Tears everything down, forgets cached assets, and rebuilds the cards
    /// from disk. The interaction mode survives; the cursor starts over.
    pub fn reload(&mut self, now: Instant) -> Result<(), CatalogError> {
        let mode = self.controller.mode();
        info!("reloading shader playground");
        self.destroy();
        self.catalog.clear_cache();
        self.controller = InteractionController::new(self.settings.clone());
        self.populate()?;
        self.controller.set_mode(mode, now);
        Ok(())
    }

    /// Routes a replayed input the way page listeners would. A canvas click
    /// also reaches the document-level click handler.
    pub fn dispatch(&mut self, event: &ScriptEvent, now: Instant) {
        debug!(?event, "dispatching input");
        match event {
            ScriptEvent::Click { x, y } => {
                let canvas_height = self.master_height();
                self.controller.on_pointer_click(*x, *y, canvas_height);
                self.controller.on_global_click();
            }
            ScriptEvent::Key(key) => self.controller.on_key(key),
            ScriptEvent::GlobalClick => self.controller.on_global_click(),
            ScriptEvent::ContextMenu => {
                self.controller.on_context_menu();
            }
            ScriptEvent::Mode(name) => {
                self.controller.set_mode_by_name(name, now);
            }
            ScriptEvent::CursorSize { width, height } => self.controller.resize(*width, *height),
            ScriptEvent::Viewport { size } => {
                if let Some(size) = size {
                    self.pending_size = Some(*size);
                }
                self.grid.on_resize(now);
            }
            ScriptEvent::Add(name) => {
                if let Err(err) = self.add_shader(name) {
                    warn!(shader = %name, error = %err, "failed to add shader");
                }
            }
            ScriptEvent::Remove(query) => {
                self.remove_shader(query);
            }
            ScriptEvent::Reload => {
                if let Err(err) = self.reload(now) {
                    error!(error = %err, "failed to reload shader playground");
                }
            }
            ScriptEvent::Wait(_) => {}
        }
    }

    /// Advances every surface clock, then lets timers fire. A settled
    /// viewport resize re-applies the grid and resizes every card.
    pub fn frame(&mut self, now: Instant) {
        for card in &self.cards {
            if let Err(err) = card.surface.borrow_mut().render_frame() {
                warn!(shader = %card.shader.entry.name, error = %err, "frame failed");
            }
        }
        self.controller.tick(now);
        self.grid.tick(now);
        if !self.grid.resize_pending() {
            if let Some(size) = self.pending_size.take() {
                self.resize_cards(size);
            }
        }
    }

    pub fn report(&self) -> RunReport {
        let container = self.grid.container();
        let shaders = self
            .cards
            .iter()
            .map(|card| {
                let surface = card.surface.borrow();
                ShaderReport {
                    name: card.shader.entry.name.clone(),
                    base_name: card.shader.entry.base_name.clone(),
                    description: card.shader.description.clone(),
                    size: surface.size(),
                    frames: surface.frame_count(),
                    current_cursor: surface.uniform(UNIFORM_CURRENT_CURSOR).map(<[f32]>::to_vec),
                    time_cursor_change: surface
                        .uniform(UNIFORM_TIME_CURSOR_CHANGE)
                        .and_then(|values| values.first().copied()),
                }
            })
            .collect();

        RunReport {
            controller: self.controller.state(),
            grid: self.grid.stats(),
            template: GridTemplate {
                columns: container.columns.clone(),
                rows: container.rows.clone(),
            },
            assets: self.catalog.stats(),
            shaders,
        }
    }

    pub fn destroy(&mut self) {
        self.controller.destroy();
        self.grid.destroy();
        self.cards.clear();
        self.pending_size = None;
    }

    fn populate(&mut self) -> Result<(), CatalogError> {
        let shaders = self.catalog.load(&self.entries)?;
        for shader in shaders {
            self.attach(shader);
        }
        let (width, height) = self.card_size;
        info!(cards = self.cards.len(), width, height, "created shader cards");
        self.grid.apply(self.cards.len());
        Ok(())
    }

    fn attach(&mut self, shader: LoadedShader) -> bool {
        let (width, height) = self.card_size;
        let mut surface = HeadlessSurface::new(
            shader.entry.name.clone(),
            width,
            height,
            time_source_for_policy(self.clock),
        );
        if let Err(err) = surface.load(&shader.wrapped) {
            warn!(shader = %shader.entry.name, error = %err, "failed to initialise shader card");
            return false;
        }
        let surface = shared(surface);
        if let Err(err) = self.controller.register_surface(surface.clone()) {
            warn!(shader = %shader.entry.name, error = %err, "failed to register shader surface");
            return false;
        }
        self.cards.push(Card { shader, surface });
        true
    }

    fn resync_surfaces(&mut self) {
        self.controller.clear_surfaces();
        for card in &self.cards {
            if let Err(err) = self.controller.register_surface(card.surface.clone()) {
                warn!(shader = %card.shader.entry.name, error = %err, "failed to re-register shader surface");
            }
        }
    }

    /// Cards fill their grid cell, so they all share one size; the cursor
    /// bounds follow the master canvas.
    fn resize_cards(&mut self, (width, height): (u32, u32)) {
        self.card_size = (width, height);
        for card in &self.cards {
            card.surface.borrow_mut().resize(width, height);
        }
        if !self.cards.is_empty() {
            self.controller.set_dimensions(width, height);
        }
        info!(width, height, cards = self.cards.len(), "resized shader cards");
    }

    fn master_height(&self) -> f32 {
        self.cards
            .first()
            .map(|card| card.surface.borrow().size().1 as f32)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use catalog::AssetCache;
    use tempfile::TempDir;

    const PROGRAM: &str = "void main() {}";

    fn write_shader(dir: &TempDir, base: &str, program: &str) {
        fs::write(dir.path().join(format!("{base}.glsl")), program).unwrap();
        fs::write(
            dir.path().join(format!("{base}.md")),
            format!("# {base}\n\nAbout {base}."),
        )
        .unwrap();
    }

    fn options() -> HostOptions {
        HostOptions {
            surface_size: (400, 300),
            clock: ClockPolicy::Still { time: 2.0 },
            resize_debounce: Duration::from_millis(250),
        }
    }

    fn playground_with(
        dir: &TempDir,
        names: &[&str],
        settings: InteractionSettings,
    ) -> Playground {
        let catalog = Catalog::new(AssetCache::new(dir.path()), None);
        let entries = names
            .iter()
            .map(|name| ShaderEntry::from_base_name(name))
            .collect();
        Playground::build(catalog, entries, settings, options()).unwrap()
    }

    fn single_card(dir: &TempDir) -> Playground {
        write_shader(dir, "cursor_one", PROGRAM);
        playground_with(dir, &["cursor_one"], InteractionSettings::default())
    }

    #[test]
    fn cards_with_unloadable_programs_are_dropped() {
        let dir = TempDir::new().unwrap();
        write_shader(&dir, "cursor_one", PROGRAM);
        write_shader(&dir, "cursor_two", "   ");
        write_shader(&dir, "cursor_three", PROGRAM);
        let playground = playground_with(
            &dir,
            &["cursor_one", "cursor_two", "cursor_three", "cursor_missing"],
            InteractionSettings::default(),
        );

        assert_eq!(playground.card_count(), 2);
        let report = playground.report();
        assert_eq!(report.template.columns, "repeat(2, 1fr)");
        assert_eq!(report.template.rows, "repeat(1, 1fr)");
        assert_eq!(report.controller.surface_count, 2);
        assert_eq!(report.shaders[1].description, "About cursor_three.");
    }

    #[test]
    fn missing_wrapper_fails_the_build() {
        let dir = TempDir::new().unwrap();
        write_shader(&dir, "cursor_one", PROGRAM);
        let catalog = Catalog::new(AssetCache::new(dir.path()), Some("wrapper.glsl".into()));
        let entries = vec![ShaderEntry::from_base_name("cursor_one")];
        assert!(Playground::build(catalog, entries, InteractionSettings::default(), options())
            .is_err());
    }

    #[test]
    fn canvas_click_uses_master_height() {
        let dir = TempDir::new().unwrap();
        let mut playground = single_card(&dir);
        let now = Instant::now();
        playground.start(InteractionMode::Manual, now);
        playground.frame(now);
        playground.dispatch(&ScriptEvent::Click { x: 10.0, y: 20.0 }, now);

        let surface = playground.cards[0].surface.borrow();
        assert_eq!(
            surface.uniform(UNIFORM_CURRENT_CURSOR),
            Some(&[10.0, 280.0, 10.0, 20.0][..])
        );
        assert_eq!(surface.uniform(UNIFORM_TIME_CURSOR_CHANGE), Some(&[2.0][..]));
    }

    #[test]
    fn canvas_click_in_auto_advances_cycle() {
        let dir = TempDir::new().unwrap();
        let mut playground = single_card(&dir);
        let now = Instant::now();
        playground.start(InteractionMode::Auto, now);
        playground.dispatch(&ScriptEvent::Click { x: 10.0, y: 20.0 }, now);
        let state = playground.report().controller;
        assert_eq!(state.preset_index, 1);
        assert_eq!((state.current.x, state.current.y), (360.0, 30.0));
    }

    #[test]
    fn adding_a_shader_relayouts_the_grid() {
        let dir = TempDir::new().unwrap();
        for base in ["cursor_a", "cursor_b", "cursor_c", "cursor_d", "cursor_e"] {
            write_shader(&dir, base, PROGRAM);
        }
        let mut playground = playground_with(
            &dir,
            &["cursor_a", "cursor_b", "cursor_c", "cursor_d"],
            InteractionSettings::default(),
        );
        assert_eq!(playground.report().template.columns, "repeat(2, 1fr)");

        assert!(playground.add_shader("cursor_e").unwrap());
        let report = playground.report();
        assert_eq!(report.template.columns, "repeat(3, 1fr)");
        assert_eq!(report.template.rows, "repeat(2, 1fr)");
        assert_eq!(report.grid.item_count, 5);
        assert_eq!(report.controller.surface_count, 5);
        assert_eq!(playground.shader("E").map(|s| s.entry.base_name.as_str()), Some("cursor_e"));

        assert!(!playground.add_shader("cursor_e").unwrap());
        assert!(!playground.add_shader("cursor_missing").unwrap());
        assert_eq!(playground.card_count(), 5);
    }

    #[test]
    fn added_card_receives_cursor_moves() {
        let dir = TempDir::new().unwrap();
        let mut playground = single_card(&dir);
        write_shader(&dir, "cursor_two", PROGRAM);
        assert!(playground.add_shader("cursor_two").unwrap());

        playground.dispatch(&ScriptEvent::Key("ArrowUp".into()), Instant::now());
        for card in &playground.cards {
            assert_eq!(
                card.surface.borrow().uniform(UNIFORM_CURRENT_CURSOR),
                Some(&[0.0, 20.0, 10.0, 20.0][..])
            );
        }
    }

    #[test]
    fn removing_by_title_or_base_name_drops_card_and_surface() {
        let dir = TempDir::new().unwrap();
        for base in ["cursor_one", "cursor_two", "cursor_three"] {
            write_shader(&dir, base, PROGRAM);
        }
        let mut playground = playground_with(
            &dir,
            &["cursor_one", "cursor_two", "cursor_three"],
            InteractionSettings::default(),
        );
        let detached = playground.cards[0].surface.clone();

        assert!(playground.remove_shader("One"));
        assert!(playground.remove_shader("cursor_three"));
        assert!(!playground.remove_shader("cursor_nope"));

        let report = playground.report();
        assert_eq!(report.controller.surface_count, 1);
        assert_eq!(report.grid.item_count, 1);
        assert_eq!(report.template.columns, "repeat(1, 1fr)");
        assert_eq!(report.shaders[0].base_name, "cursor_two");

        playground.dispatch(&ScriptEvent::Key("a".into()), Instant::now());
        assert!(detached.borrow().uniform(UNIFORM_CURRENT_CURSOR).is_none());
        assert_eq!(
            playground.cards[0].surface.borrow().uniform(UNIFORM_CURRENT_CURSOR),
            Some(&[10.0, 0.0, 10.0, 20.0][..])
        );
    }

    #[test]
    fn removing_the_last_card_clears_the_grid() {
        let dir = TempDir::new().unwrap();
        let mut playground = single_card(&dir);
        assert!(playground.remove_shader("cursor_one"));
        let report = playground.report();
        assert_eq!(report.template.columns, "");
        assert!(!report.grid.initialized);
    }

    #[test]
    fn reload_rereads_files_and_keeps_mode() {
        let dir = TempDir::new().unwrap();
        write_shader(&dir, "cursor_one", PROGRAM);
        write_shader(&dir, "cursor_two", PROGRAM);
        let mut playground = playground_with(
            &dir,
            &["cursor_one", "cursor_two"],
            InteractionSettings::default(),
        );
        let now = Instant::now();
        playground.start(InteractionMode::Auto, now);
        playground.dispatch(&ScriptEvent::GlobalClick, now);
        assert!(playground.remove_shader("cursor_two"));

        fs::write(dir.path().join("cursor_one.md"), "# One\n\nFresh words.").unwrap();
        playground.dispatch(&ScriptEvent::Reload, now);

        let report = playground.report();
        assert_eq!(report.shaders.len(), 1);
        assert_eq!(report.shaders[0].description, "Fresh words.");
        assert_eq!(report.controller.mode, InteractionMode::Auto);
        assert!(report.controller.timer_armed);
        assert_eq!(playground.next_due(), Some(now + Duration::from_millis(1000)));
        assert_eq!(report.controller.preset_index, 0);
        assert_eq!(report.controller.surface_count, 1);
        assert_eq!(report.assets.misses, 2);
        assert_eq!(report.template.columns, "repeat(1, 1fr)");
    }

    #[test]
    fn long_runs_keep_no_uniform_history() {
        let dir = TempDir::new().unwrap();
        write_shader(&dir, "cursor_one", PROGRAM);
        let settings = InteractionSettings {
            interval: Duration::from_millis(1),
            ..InteractionSettings::default()
        };
        let mut playground = playground_with(&dir, &["cursor_one"], settings);

        let start = Instant::now();
        playground.start(InteractionMode::Random, start);
        for step in 1..=10_000u64 {
            playground.frame(start + Duration::from_millis(step));
        }

        let surface = playground.cards[0].surface.borrow();
        assert!(surface.writes().is_empty());
        assert_eq!(surface.frame_count(), 10_000);
        assert!(surface.uniform(UNIFORM_CURRENT_CURSOR).is_some());
    }

    #[test]
    fn viewport_resize_applies_once_settled() {
        let dir = TempDir::new().unwrap();
        let mut playground = single_card(&dir);
        let start = Instant::now();
        playground.start(InteractionMode::Manual, start);

        playground.dispatch(&ScriptEvent::Viewport { size: Some((800, 600)) }, start);
        playground.frame(start + Duration::from_millis(100));
        assert_eq!(playground.report().shaders[0].size, (400, 300));

        playground.frame(start + Duration::from_millis(250));
        assert_eq!(playground.report().shaders[0].size, (800, 600));

        playground.dispatch(&ScriptEvent::Click { x: 10.0, y: 20.0 }, start);
        let state = playground.report().controller;
        assert_eq!((state.current.x, state.current.y), (10.0, 580.0));
    }

    #[test]
    fn destroy_releases_cards() {
        let dir = TempDir::new().unwrap();
        let mut playground = single_card(&dir);
        playground.start(InteractionMode::Random, Instant::now());
        playground.destroy();
        assert_eq!(playground.card_count(), 0);
        assert!(!playground.report().controller.timer_armed);
    }
}
