// TOML configuration.
// Looked up in this order:
//   1. `--config <path>` (must exist and parse)
//   2. `$XDG_CONFIG_HOME/tode-paint/config.toml` (optional)
//   3. built-in defaults
//
// Example:
//
//   palette = ["#ffffff", "#ff4646", "#46a0ff"]
//
//   [window]
//   width = 1280
//   height = 720
//
//   [[painters]]
//   name = "tode"
//   sources = ["images/tode.png"]
//   scale = 0.5
//   offset_y = 65
//   min_speed = 0.035
//
//   [painters.stroke]
//   size = 12
//   thinning = 0.6

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::commands::KeysConfig;
use crate::error::ConfigError;
use crate::motion::PainterConfig;
use crate::overlay::OverlayConfig;
use crate::types::Colour;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: usize,
    pub height: usize,
    /// Device pixels per window pixel.
    pub pixel_ratio: f32,
    pub target_fps: usize,
    pub background: Colour,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Tode Paint".into(),
            width: 1280,
            height: 720,
            pixel_ratio: 1.0,
            target_fps: 60,
            background: Colour::BLACK,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Logical steps per real frame.
    pub speed: f32,
    /// Step rate that painter `frame_rate`s are measured against.
    pub base_rate: f32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { speed: 1.0, base_rate: 60.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpritesConfig {
    /// Load attempts per painter before giving up.
    pub max_attempts: u32,
}

impl Default for SpritesConfig {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub directory: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { directory: PathBuf::from("pictures") }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub scheduler: SchedulerConfig,
    pub painters: Vec<PainterConfig>,
    pub palette: Vec<Colour>,
    pub overlay: OverlayConfig,
    pub keys: KeysConfig,
    pub sprites: SpritesConfig,
    pub export: ExportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            scheduler: SchedulerConfig::default(),
            painters: vec![PainterConfig::default()],
            palette: vec![Colour::WHITE, Colour::RED],
            overlay: OverlayConfig::default(),
            keys: KeysConfig::default(),
            sprites: SpritesConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl Config {
    /// Resolve and load the configuration, in the lookup order listed at the top.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                debug!("no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let config = Self::parse(&text)?;
        info!(path = %path.display(), painters = config.painters.len(), "config loaded");
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Validation(msg));
        if self.painters.is_empty() {
            return invalid("at least one [[painters]] entry is required".into());
        }
        if self.palette.is_empty() {
            return invalid("palette must not be empty".into());
        }
        if !(self.scheduler.speed > 0.0) {
            return invalid(format!("scheduler.speed must be > 0, got {}", self.scheduler.speed));
        }
        if !(self.scheduler.base_rate > 0.0) {
            return invalid(format!("scheduler.base_rate must be > 0, got {}", self.scheduler.base_rate));
        }
        if !(self.window.pixel_ratio > 0.0) {
            return invalid(format!("window.pixel_ratio must be > 0, got {}", self.window.pixel_ratio));
        }
        for p in &self.painters {
            let (min, max) = p.speed_bounds();
            if !(min <= max) {
                return invalid(format!("painter {:?}: min_speed {min} > max_speed {max}", p.name));
            }
            if !(p.frame_rate > 0.0) {
                return invalid(format!("painter {:?}: frame_rate must be > 0", p.name));
            }
            if !(p.scale > 0.0) {
                return invalid(format!("painter {:?}: scale must be > 0", p.name));
            }
        }
        Ok(())
    }
}

/// `$XDG_CONFIG_HOME/tode-paint/config.toml`
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tode-paint").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_is_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn partial_painter_fills_defaults() {
        let cfg = Config::parse(
            r##"
            palette = ["#00ff00"]

            [[painters]]
            name = "stamp"
            lock_axis = true
            frame_rate = 12

            [painters.stroke]
            size = 30
            "##,
        )
        .unwrap();
        assert_eq!(cfg.palette, vec![Colour::GREEN]);
        let p = &cfg.painters[0];
        assert_eq!(p.name, "stamp");
        assert!(p.lock_axis);
        assert_eq!(p.stroke.size, 30.0);
        assert_eq!(p.stroke.thinning, 0.5);
        assert_eq!(p.speed, 0.1);
    }

    #[test]
    fn rejects_inverted_speed_bounds() {
        let err = Config::parse(
            r#"
            [[painters]]
            speed = 0.1
            min_speed = 0.5
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn rejects_bad_colour() {
        let err = Config::parse(r#"palette = ["blue"]"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_empty_painters() {
        let err = Config::parse("painters = []").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = Config::load(Some(Path::new("/no/such/config.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn reads_layouts() {
        let cfg = Config::parse(
            r##"
            [overlay]
            fade_speed = 0.1

            [[overlay.layouts]]
            name = "solo"
            boxes = [{ x = 1, y = 2, width = 3, height = 4 }]
            "##,
        )
        .unwrap();
        assert_eq!(cfg.overlay.layouts.len(), 1);
        assert_eq!(cfg.overlay.layouts[0].boxes[0].colour, Colour::GREEN);
        assert!(!cfg.overlay.visible);
    }
}
