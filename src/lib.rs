// Tode Paint: a mascot that chases the pointer and paints smoothed freehand
// strokes, with green-screen overlay boxes for streaming.
// The binary is a thin minifb host loop; everything it drives lives here so
// it can be exercised without a window.

pub mod app;
pub mod commands;
pub mod config;
pub mod draw;
pub mod error;
pub mod gamma;
pub mod motion;
pub mod outline;
pub mod overlay;
pub mod picture;
pub mod ready;
pub mod scheduler;
pub mod sprites;
pub mod stroke;
pub mod types;

pub use app::{Flow, Show};
pub use config::Config;
pub use error::{ConfigError, Error};
