// Error types. Every variant states *where* things went wrong.
//
// The simulation core (scheduler, motion, stroke, outline, overlay) never
// fails; these errors only come from the host: window, sprites, export, config.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Creating the window failed
    #[error("Window init error: {0}")]
    WindowInit(String),

    /// Updating the window buffer failed
    #[error("Window update error: {0}")]
    WindowUpdate(String),

    /// Decoding one sprite image failed
    #[error("Sprite load error for {path}: {source}")]
    SpriteLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A painter variant lists no sprite sources at all
    #[error("Painter {0:?} has no sprite sources")]
    NoSprites(String),

    /// Writing a screenshot or SVG export failed
    #[error("Export I/O error for {path}: {source}")]
    ExportIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encoding the screenshot PNG failed
    #[error("Export encode error for {path}: {source}")]
    ExportEncode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Validation(String),
}
