use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use galleryconfig::GalleryConfig;
use tracing::{debug, info};

use crate::paths::AppPaths;

/// Canvas size used when neither the CLI nor the layout supplies one.
pub const DEFAULT_SURFACE_SIZE: (u32, u32) = (300, 200);

pub fn parse_surface_size(spec: &str) -> Result<(u32, u32)> {
    let trimmed = spec.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| anyhow::anyhow!("expected WxH format, e.g. 300x200"))?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid width in size specification"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid height in size specification"))?;

    if width == 0 || height == 0 {
        bail!("surface dimensions must be greater than zero");
    }

    Ok((width, height))
}

/// Loads the explicit config, else the one in the config directory, else
/// built-in defaults.
pub fn resolve_config(
    explicit: Option<&Path>,
    paths: &AppPaths,
) -> Result<(GalleryConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        let config = load_config(path)?;
        return Ok((config, Some(path.to_path_buf())));
    }

    let fallback = paths.config_file();
    if fallback.is_file() {
        let config = load_config(&fallback)?;
        return Ok((config, Some(fallback)));
    }

    debug!(path = %fallback.display(), "no config file found; using defaults");
    Ok((GalleryConfig::default(), None))
}

pub fn load_config(path: &Path) -> Result<GalleryConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    let config = GalleryConfig::from_toml_str(&contents)
        .with_context(|| format!("failed to load config at {}", path.display()))?;
    info!(path = %path.display(), shaders = config.shaders.names.len(), "loaded gallery config");
    Ok(config)
}

pub fn seed_from_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or(0)
}
