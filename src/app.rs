// The show: painters, strokes, overlay and picture mode wired together.
// Visual: the mascot chases the mouse, paints while the left button is held,
// green boxes fade over the canvas, and a status line sits in the top-left.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::commands::Command;
use crate::config::Config;
use crate::draw::{draw_painter, draw_text_5x7, fill_outline};
use crate::gamma::GammaLut;
use crate::motion::{Painters, PointerInput};
use crate::overlay::Overlay;
use crate::picture::PictureMode;
use crate::scheduler::{Scheduler, Simulation, SurfaceSize};
use crate::sprites::SpriteLoader;
use crate::stroke::PaintHistory;
use crate::types::{Colour, FrameBuffer};

/// What the host loop should do after a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Show {
    painters: Painters,
    history: PaintHistory,
    palette: Vec<Colour>,
    colour: usize,
    overlay: Overlay,
    picture: PictureMode,
    lut: GammaLut,
    input: PointerInput,
    time: f32,
    frame: FrameBuffer,
    background: Colour,
    export_dir: PathBuf,
    max_attempts: u32,
    loader: Option<SpriteLoader>,
}

impl Show {
    /// Everything but the sprite loader; see [`Show::load_sprites`].
    pub fn new(config: &Config) -> Self {
        let mut palette = config.palette.clone();
        if palette.is_empty() {
            palette.push(Colour::WHITE);
        }
        Self {
            painters: Painters::new(&config.painters, config.scheduler.base_rate),
            history: PaintHistory::new(),
            palette,
            colour: 0,
            overlay: Overlay::new(&config.overlay),
            picture: PictureMode::new(),
            lut: GammaLut::new(),
            input: PointerInput::default(),
            time: 0.0,
            frame: FrameBuffer::new(config.window.width, config.window.height),
            background: config.window.background,
            export_dir: config.export.directory.clone(),
            max_attempts: config.sprites.max_attempts.max(1),
            loader: None,
        }
    }

    /// Start decoding every painter's sprite sheet in the background.
    pub fn load_sprites(&mut self) {
        let loader = SpriteLoader::spawn();
        for painter in self.painters.iter() {
            loader.request(painter.id, painter.name(), &painter.config().sources);
        }
        self.loader = Some(loader);
    }

    /// Hand finished sprite loads to their painters. Failed loads are retried
    /// until `max_attempts`, after which the painter keeps its placeholder.
    pub fn poll_sprites(&mut self) {
        let Some(loader) = &self.loader else {
            return;
        };
        for loaded in loader.poll() {
            let Some(painter) = self.painters.get_mut(loaded.painter) else {
                continue;
            };
            match loaded.result {
                Ok(sheet) => painter.sprites_loaded(sheet),
                Err(err) => {
                    let attempts = painter.sprites_failed(&err);
                    if attempts < self.max_attempts {
                        loader.request(painter.id, painter.name(), &painter.config().sources);
                    } else {
                        warn!(painter = %painter.name(), attempts, "giving up on sprites");
                    }
                }
            }
        }
    }

    pub fn set_input(&mut self, input: PointerInput) {
        self.input = input;
    }

    /// Wall-clock seconds, read by the idle sway.
    pub fn set_time(&mut self, seconds: f32) {
        self.time = seconds;
    }

    pub fn painters(&self) -> &Painters {
        &self.painters
    }

    pub fn history(&self) -> &PaintHistory {
        &self.history
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn picture(&self) -> &PictureMode {
        &self.picture
    }

    pub fn colour(&self) -> Colour {
        self.palette[self.colour]
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    /// Run one command. Called between frames, so it never lands inside a step.
    pub fn apply(&mut self, command: Command, scheduler: &mut Scheduler) -> Flow {
        match command {
            Command::ClearStrokes => {
                self.history.clear();
                for painter in self.painters.iter_mut() {
                    painter.reset_painting();
                }
            }
            Command::Undo => {
                let was_painting = self.history.is_painting();
                if self.history.undo().is_some() && was_painting {
                    self.painters.active_mut().reset_painting();
                }
            }
            Command::NextPainter => {
                self.history.seal();
                let from = self.painters.active_mut();
                from.reset_painting();
                let position = from.position;
                self.painters.next();
                self.painters.active_mut().position = position;
                info!(painter = %self.painters.active().name(), "painter switched");
            }
            Command::SetColour(index) => {
                self.colour = index % self.palette.len();
            }
            Command::TogglePause => scheduler.toggle_pause(),
            Command::ToggleOverlay => self.overlay.toggle(),
            Command::CycleLayout => self.overlay.cycle(),
            Command::Screenshot => self.picture.request(),
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    /// Draw the whole frame. Runs once per real frame, after every step.
    pub fn render(&mut self, paused: bool, fps: f32) {
        let placeholder = self.colour();
        self.frame.fill(self.background);
        for stroke in self.history.iter() {
            fill_outline(&mut self.frame, stroke.outline(), stroke.colour());
        }
        draw_painter(&mut self.frame, self.painters.active(), &self.lut, placeholder);
        self.overlay.draw(&mut self.frame, &self.lut);

        // Captured before the flash and HUD so the picture stays clean.
        if let Some(result) = self.picture.take_capture(&self.frame, &self.history, self.background, &self.export_dir) {
            if let Err(err) = result {
                warn!("picture export failed: {err}");
            }
        }
        self.picture.draw_flash(&mut self.frame, &self.lut);

        let hud = self.hud(paused, fps);
        draw_text_5x7(&mut self.frame, 8, 8, &hud, Colour::WHITE.packed());
    }

    fn hud(&self, paused: bool, fps: f32) -> String {
        let mut hud = self.painters.active().name().to_string();
        if let Some(layout) = self.overlay.layout_name() {
            if self.overlay.is_visible() {
                hud.push_str(&format!(" | {layout}"));
            }
        }
        if paused {
            hud.push_str(" | PAUSED");
        }
        hud.push_str(&format!(" | FPS {fps:.1}"));
        hud
    }
}

impl Simulation for Show {
    fn step(&mut self) {
        let id = self.painters.active_id();
        let colour = self.colour();
        self.painters.step(id, &self.input, self.time, colour, &mut self.history);
        self.overlay.update();
    }

    fn supertick(&mut self) {
        self.picture.supertick();
    }

    fn resize(&mut self, surface: SurfaceSize) {
        self.frame.resize(surface.width, surface.height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::{Geometry, PainterConfig, PainterId};
    use crate::types::Point;
    use pretty_assertions::assert_eq;
    use std::time::{Duration, Instant};

    fn config() -> Config {
        let still = PainterConfig { offset_y: 0.0, idle_amplitude: 0.0, ..PainterConfig::default() };
        Config { painters: vec![still.clone(), PainterConfig { name: "stamp".into(), ..still }], ..Config::default() }
    }

    fn started() -> Scheduler {
        let mut s = Scheduler::new(1.0, 1.0);
        s.start();
        s
    }

    fn press_at(show: &mut Show, x: f32, y: f32) {
        let mut input = PointerInput::at(x, y);
        input.pressed = true;
        show.set_input(input);
    }

    #[test]
    fn painting_then_switching_seals_the_stroke() {
        let mut show = Show::new(&config());
        let mut sched = started();
        press_at(&mut show, 100.0, 0.0);
        sched.tick(&mut show);
        assert!(show.history().is_painting());

        show.apply(Command::NextPainter, &mut sched);
        assert!(!show.history().is_painting());
        assert_eq!(show.history().history().len(), 1);
        assert_eq!(show.painters().active().name(), "stamp");
        assert!(!show.painters().get(PainterId(0)).map(|p| p.is_painting).unwrap_or(true));
        // the new painter takes over where the old one stood
        assert!((show.painters().active().position.x - 10.0).abs() < 1e-4);
    }

    #[test]
    fn undo_mid_stroke_lets_a_new_press_start_again() {
        let mut show = Show::new(&config());
        let mut sched = started();
        press_at(&mut show, 10.0, 0.0);
        sched.tick(&mut show);
        show.apply(Command::Undo, &mut sched);
        assert!(show.history().is_empty());
        assert!(!show.painters().active().is_painting);

        sched.tick(&mut show);
        assert_eq!(show.history().len(), 1);
    }

    #[test]
    fn clear_resets_everything() {
        let mut show = Show::new(&config());
        let mut sched = started();
        press_at(&mut show, 10.0, 0.0);
        sched.tick(&mut show);
        show.apply(Command::ClearStrokes, &mut sched);
        assert!(show.history().is_empty());
        assert!(show.painters().iter().all(|p| !p.is_painting));
    }

    #[test]
    fn colour_index_wraps_and_applies_to_new_strokes() {
        let mut show = Show::new(&config());
        let mut sched = started();
        show.apply(Command::SetColour(3), &mut sched);
        assert_eq!(show.colour(), Colour::RED);
        press_at(&mut show, 0.0, 0.0);
        sched.tick(&mut show);
        assert_eq!(show.history().current().map(|s| s.colour()), Some(Colour::RED));
    }

    #[test]
    fn pause_stops_motion_but_not_the_flash() {
        let mut show = Show::new(&config());
        let mut sched = started();
        show.apply(Command::TogglePause, &mut sched);
        show.apply(Command::Screenshot, &mut sched);
        show.set_input(PointerInput::at(100.0, 0.0));
        sched.tick(&mut show);
        assert_eq!(show.painters().active().position, Point::ZERO);
        assert!(show.picture().flash() < 1.0);
    }

    #[test]
    fn quit_is_reported() {
        let mut show = Show::new(&config());
        let mut sched = started();
        assert_eq!(show.apply(Command::ToggleOverlay, &mut sched), Flow::Continue);
        assert!(show.overlay().is_visible());
        assert_eq!(show.apply(Command::Quit, &mut sched), Flow::Quit);
    }

    #[test]
    fn render_paints_strokes_and_hud() {
        let mut show = Show::new(&config());
        let mut sched = started();
        sched.resize(64, 48, &mut show);
        press_at(&mut show, 40.0, 30.0);
        for _ in 0..20 {
            sched.tick(&mut show);
        }
        show.render(false, 60.0);
        assert_eq!((show.frame().width, show.frame().height), (64, 48));
        assert!(show.frame().pixels.iter().any(|&p| p == Colour::WHITE.packed()));
    }

    fn sprite_show(sources: Vec<PathBuf>, max_attempts: u32) -> Show {
        let painter = PainterConfig { sources, scale: 0.5, ..PainterConfig::default() };
        let mut cfg = Config { painters: vec![painter], ..Config::default() };
        cfg.sprites.max_attempts = max_attempts;
        Show::new(&cfg)
    }

    /// Poll until `done` holds or five seconds pass.
    fn poll_until(show: &mut Show, done: impl Fn(&Show) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done(show) {
            assert!(Instant::now() < deadline, "sprite loader never settled");
            show.poll_sprites();
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn missing_sprites_are_retried_then_given_up() {
        let mut show = sprite_show(vec![PathBuf::from("/definitely/not/here.png")], 2);
        show.load_sprites();
        poll_until(&mut show, |s| s.painters().active().load_failures() >= 2);

        // no third attempt is queued
        let quiet = Instant::now() + Duration::from_millis(200);
        while Instant::now() < quiet {
            show.poll_sprites();
            std::thread::sleep(Duration::from_millis(5));
        }
        let painter = show.painters().active();
        assert_eq!(painter.load_failures(), 2);
        assert!(painter.sprites().is_none());
        assert_eq!(painter.geometry(), Geometry::default());
    }

    #[test]
    fn loaded_sprites_resolve_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tode.png");
        image::RgbaImage::from_pixel(8, 6, image::Rgba([10, 20, 30, 255])).save(&path).unwrap();

        let mut show = sprite_show(vec![path], 3);
        show.load_sprites();
        poll_until(&mut show, |s| s.painters().active().sprites().is_some());

        let painter = show.painters().active();
        assert_eq!(painter.load_failures(), 0);
        assert_eq!(painter.geometry().width, 8.0 * 0.5);
        assert_eq!(painter.geometry().height, 6.0 * 0.5);
    }
}
