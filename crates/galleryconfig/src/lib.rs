use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Shaders shown when a config does not list its own.
pub const DEFAULT_SHADER_NAMES: &[&str] = &[
    "cursor_ligthing",
    "cursor_ligthing_fancy",
    "cursor_rainbow",
    "cursor_bounce",
    "cursor_bounce_clean",
    "cursor_digital_dissolve",
    "cursor_pastel_sparkle",
    "cursor_focus_pulse",
    "cursor_manga_slash",
];

/// Number of inset-corner positions the auto cycle knows about.
pub const MAX_PRESET_POSITIONS: u32 = 7;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InitialMode {
    #[serde(alias = "manual")]
    Click,
    Auto,
    #[serde(alias = "random")]
    Rnd,
}

impl Default for InitialMode {
    fn default() -> Self {
        Self::Auto
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GalleryConfig {
    pub version: u32,
    #[serde(default)]
    pub interaction: InteractionConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub shaders: ShaderList,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InteractionConfig {
    #[serde(default)]
    pub mode: InitialMode,
    #[serde(
        default = "default_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub interval: Duration,
    #[serde(default = "default_preset_count")]
    pub preset_count: u32,
    /// Wrap negative preset indices back into range instead of leaving the
    /// cursor parked on its previous position.
    #[serde(default)]
    pub normalize_preset_index: bool,
    #[serde(default)]
    pub cursor: CursorDefaults,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            mode: InitialMode::default(),
            interval: default_interval(),
            preset_count: default_preset_count(),
            normalize_preset_index: false,
            cursor: CursorDefaults::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct CursorDefaults {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default = "default_cursor_width")]
    pub width: f32,
    #[serde(default = "default_cursor_height")]
    pub height: f32,
}

impl Default for CursorDefaults {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: default_cursor_width(),
            height: default_cursor_height(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LayoutConfig {
    #[serde(
        default = "default_resize_debounce",
        deserialize_with = "deserialize_duration"
    )]
    pub resize_debounce: Duration,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            resize_debounce: default_resize_debounce(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShaderList {
    #[serde(default = "default_wrapper")]
    pub wrapper: Option<String>,
    #[serde(default = "default_shader_names")]
    pub names: Vec<String>,
}

impl Default for ShaderList {
    fn default() -> Self {
        Self {
            wrapper: default_wrapper(),
            names: default_shader_names(),
        }
    }
}

fn default_interval() -> Duration {
    Duration::from_millis(1000)
}

fn default_resize_debounce() -> Duration {
    Duration::from_millis(250)
}

fn default_preset_count() -> u32 {
    MAX_PRESET_POSITIONS
}

fn default_cursor_width() -> f32 {
    10.0
}

fn default_cursor_height() -> f32 {
    20.0
}

fn default_wrapper() -> Option<String> {
    Some("ghostty_wrapper.glsl".to_string())
}

fn default_shader_names() -> Vec<String> {
    DEFAULT_SHADER_NAMES.iter().map(|name| name.to_string()).collect()
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs_f64(v))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl GalleryConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: GalleryConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        let interaction = &self.interaction;
        if interaction.interval.is_zero() {
            return Err(ConfigError::Invalid(
                "interaction.interval must be greater than zero".into(),
            ));
        }

        if interaction.preset_count == 0 || interaction.preset_count > MAX_PRESET_POSITIONS {
            return Err(ConfigError::Invalid(format!(
                "interaction.preset_count must be between 1 and {MAX_PRESET_POSITIONS}, got {}",
                interaction.preset_count
            )));
        }

        let cursor = &interaction.cursor;
        for (field, value) in [("width", cursor.width), ("height", cursor.height)] {
            if !(1.0..=100.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "interaction.cursor.{field} must be within 1..=100, got {value}"
                )));
            }
        }

        if !cursor.x.is_finite() || !cursor.y.is_finite() {
            return Err(ConfigError::Invalid(
                "interaction.cursor position must be finite".into(),
            ));
        }

        if let Some(wrapper) = &self.shaders.wrapper {
            if wrapper.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "shaders.wrapper may not be empty".into(),
                ));
            }
        }

        let mut seen = HashSet::new();
        for name in &self.shaders.names {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "shaders.names contains an empty entry".into(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "shader '{name}' is listed more than once"
                )));
            }
        }

        Ok(())
    }
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            version: 1,
            interaction: InteractionConfig::default(),
            layout: LayoutConfig::default(),
            shaders: ShaderList::default(),
        }
    }
}
