use std::fmt;
use std::str::FromStr;

use galleryconfig::InitialMode;
use serde::Serialize;

use crate::ControllerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum InteractionMode {
    /// Pointer clicks on a canvas place the cursor; no timer.
    #[default]
    #[serde(rename = "click")]
    Manual,
    /// Timer steps through the preset table.
    #[serde(rename = "auto")]
    Auto,
    /// Timer jumps to a uniform-random position.
    #[serde(rename = "rnd")]
    Random,
}

impl InteractionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "click",
            Self::Auto => "auto",
            Self::Random => "rnd",
        }
    }

    pub fn is_timed(self) -> bool {
        !matches!(self, Self::Manual)
    }
}

impl fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionMode {
    type Err = ControllerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "click" | "manual" => Ok(Self::Manual),
            "auto" => Ok(Self::Auto),
            "rnd" | "random" => Ok(Self::Random),
            _ => Err(ControllerError::InvalidMode(value.to_string())),
        }
    }
}

impl From<InitialMode> for InteractionMode {
    fn from(value: InitialMode) -> Self {
        match value {
            InitialMode::Click => Self::Manual,
            InitialMode::Auto => Self::Auto,
            InitialMode::Rnd => Self::Random,
        }
    }
}
