use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use interaction::InteractionMode;

#[derive(Parser, Debug)]
#[command(
    name = "playground",
    author,
    version,
    about = "Cursor shader playground host"
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Gallery configuration TOML; defaults to `playground.toml` in the config directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding the `.glsl` and `.md` files for every shader.
    #[arg(long, value_name = "DIR")]
    pub shaders: Option<PathBuf>,

    /// Interaction mode to start in: `click`, `auto`, or `rnd`.
    #[arg(long, value_name = "MODE", value_parser = parse_mode)]
    pub mode: Option<InteractionMode>,

    /// Pixel size of every shader surface (e.g. `300x200`).
    #[arg(long, value_name = "WIDTHxHEIGHT")]
    pub size: Option<String>,

    /// How long to keep the event loop running (e.g. `5s`, `750ms`).
    #[arg(long, value_name = "DURATION", value_parser = parse_duration, default_value = "0s")]
    pub duration: Duration,

    /// Script of input events to replay (one event per line).
    #[arg(long, value_name = "PATH")]
    pub events: Option<PathBuf>,

    /// Seed for random cursor placement; defaults to the current time.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Pin every surface clock to a fixed time in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub freeze_time: Option<f32>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the grid layout chosen for a number of shaders.
    Grid {
        #[arg(value_name = "COUNT")]
        count: usize,
    },
    /// Print resolved config and shader directories.
    Where,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_mode(value: &str) -> Result<InteractionMode, String> {
    value.parse::<InteractionMode>().map_err(|err| err.to_string())
}

pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("duration must not be empty".to_string());
    }
    if let Ok(seconds) = trimmed.parse::<u64>() {
        return Ok(Duration::from_secs(seconds));
    }
    humantime::parse_duration(trimmed).map_err(|err| format!("invalid duration '{trimmed}': {err}"))
}
