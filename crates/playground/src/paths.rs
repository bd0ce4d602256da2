use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "PLAYGROUND_CONFIG_DIR";
pub const ENV_DATA_DIR: &str = "PLAYGROUND_DATA_DIR";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "CursorShaders";
const APPLICATION: &str = "Playground";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        let config_override = env_override(ENV_CONFIG_DIR);
        let data_override = env_override(ENV_DATA_DIR);
        if let (Some(config_dir), Some(data_dir)) = (config_override.clone(), data_override.clone())
        {
            return Ok(Self {
                config_dir,
                data_dir,
            });
        }

        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;
        Ok(Self {
            config_dir: config_override.unwrap_or_else(|| project_dirs.config_dir().to_path_buf()),
            data_dir: data_override.unwrap_or_else(|| project_dirs.data_dir().to_path_buf()),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("playground.toml")
    }

    pub fn shader_dir(&self) -> PathBuf {
        self.data_dir.join("shaders")
    }
}

#[cfg(test)]
impl AppPaths {
    pub fn from_raw(config_dir: PathBuf, data_dir: PathBuf) -> Self {
        Self {
            config_dir,
            data_dir,
        }
    }
}

fn env_override(var: &str) -> Option<PathBuf> {
    env::var_os(var)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_locations_hang_off_base_dirs() {
        let paths = AppPaths::from_raw(PathBuf::from("/cfg"), PathBuf::from("/data"));
        assert_eq!(paths.config_file(), PathBuf::from("/cfg/playground.toml"));
        assert_eq!(paths.shader_dir(), PathBuf::from("/data/shaders"));
    }
}
