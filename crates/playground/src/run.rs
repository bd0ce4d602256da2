use std::collections::VecDeque;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use catalog::{AssetCache, Catalog, ShaderEntry};
use galleryconfig::GalleryConfig;
use interaction::{compute_grid, InteractionMode, InteractionSettings};
use serde::Serialize;
use surface::ClockPolicy;
use tracing_subscriber::EnvFilter;

use crate::bootstrap::{parse_surface_size, resolve_config, seed_from_time, DEFAULT_SURFACE_SIZE};
use crate::cli::{Cli, Command, RunArgs};
use crate::host::{HostOptions, Playground};
use crate::paths::AppPaths;
use crate::script::{parse_script, ScriptEvent};

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

pub fn run(cli: Cli) -> Result<()> {
    initialise_tracing();

    let paths = AppPaths::discover()?;
    tracing::debug!(
        config = %paths.config_dir().display(),
        data = %paths.data_dir().display(),
        "resolved playground paths"
    );

    match cli.command {
        Some(Command::Grid { count }) => print_json(&compute_grid(count)),
        Some(Command::Where) => print_where(&paths),
        None => run_playground(&cli.run, &paths),
    }
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

#[derive(Serialize)]
struct Locations {
    config_file: String,
    shader_dir: String,
}

fn print_where(paths: &AppPaths) -> Result<()> {
    print_json(&Locations {
        config_file: paths.config_file().display().to_string(),
        shader_dir: paths.shader_dir().display().to_string(),
    })
}

fn run_playground(args: &RunArgs, paths: &AppPaths) -> Result<()> {
    let (config, config_path) = resolve_config(args.config.as_deref(), paths)?;
    if let Some(path) = config_path.as_ref() {
        tracing::debug!(path = %path.display(), "using gallery config");
    }

    let shader_dir = args
        .shaders
        .clone()
        .unwrap_or_else(|| paths.shader_dir());
    let catalog = Catalog::new(
        AssetCache::new(shader_dir.clone()),
        config.shaders.wrapper.clone(),
    );
    let entries: Vec<ShaderEntry> = config
        .shaders
        .names
        .iter()
        .map(|name| ShaderEntry::from_base_name(name))
        .collect();
    let seed = args.seed.unwrap_or_else(seed_from_time);
    tracing::debug!(seed, "seeded random cursor placement");
    let settings = InteractionSettings::from_config(&config.interaction, seed);
    let options = host_options(args, &config)?;
    let mode = args
        .mode
        .unwrap_or_else(|| InteractionMode::from(config.interaction.mode));

    let events = match args.events.as_deref() {
        Some(path) => load_script(path)?,
        None => Vec::new(),
    };

    let mut playground = Playground::build(catalog, entries, settings, options)
        .with_context(|| format!("failed to load shaders from {}", shader_dir.display()))?;
    let started = Instant::now();
    playground.start(mode, started);
    tracing::info!(
        %mode,
        cards = playground.card_count(),
        duration = %humantime::format_duration(args.duration),
        events = events.len(),
        "playground running"
    );

    drive(&mut playground, events, started, args.duration);

    let report = playground.report();
    playground.destroy();
    print_json(&report)
}

fn host_options(args: &RunArgs, config: &GalleryConfig) -> Result<HostOptions> {
    let surface_size = match args.size.as_deref() {
        Some(value) => parse_surface_size(value)?,
        None => DEFAULT_SURFACE_SIZE,
    };
    let clock = match args.freeze_time {
        Some(time) => ClockPolicy::Still { time },
        None => ClockPolicy::Animate,
    };
    Ok(HostOptions {
        surface_size,
        clock,
        resize_debounce: config.layout.resize_debounce,
    })
}

fn load_script(path: &Path) -> Result<Vec<ScriptEvent>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read event script {}", path.display()))?;
    parse_script(&contents)
        .with_context(|| format!("failed to parse event script {}", path.display()))
}

/// Cooperative frame loop. Each pass renders first so surface clocks are
/// current, then dispatches pending input before the deadline is checked; a
/// zero duration still replays everything up to the first wait.
fn drive(playground: &mut Playground, events: Vec<ScriptEvent>, started: Instant, run_for: Duration) {
    let deadline = started + run_for;
    let mut pending: VecDeque<ScriptEvent> = events.into();
    let mut resume_at = started;

    loop {
        let now = Instant::now();
        playground.frame(now);

        while now >= resume_at {
            let Some(event) = pending.pop_front() else {
                break;
            };
            match event {
                ScriptEvent::Wait(delay) => resume_at = now + delay,
                other => playground.dispatch(&other, now),
            }
        }

        if now >= deadline {
            break;
        }

        let mut nap = FRAME_INTERVAL.min(deadline.saturating_duration_since(now));
        if let Some(due) = playground.next_due() {
            nap = nap.min(due.saturating_duration_since(now));
        }
        thread::sleep(nap);
    }

    if !pending.is_empty() {
        tracing::info!(skipped = pending.len(), "run ended before every scripted event fired");
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value).context("failed to write report")?;
    writeln!(handle).context("failed to write report")?;
    Ok(())
}
