// Painter motion model: every painter variant runs the same per-step update,
// parameterised by its PainterConfig. Per logical step:
//   1. idle fade moves toward 0 while painting, toward 1 otherwise
//   2. the animation frame advances on a base_rate / frame_rate cadence
//   3. follow gain accelerates, or decelerates under the alternate input
//   4. brush tip is taken from the current pose
//   5. press starts a stroke at the tip (touch must be close), release seals it
//   6. first-order pursuit toward the pointer, per axis
//   7. idle sway on the *active* painter, not necessarily the one stepped
//   8. rotation eases toward a target derived from velocity
//   9. brush velocity is the tip delta; this step's sample uses the previous one
// Visual: the mascot trails the mouse, tilts into its motion, and bobs gently
// once you stop painting.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::outline::StrokeStyle;
use crate::ready::Deferred;
use crate::sprites::SpriteSheet;
use crate::stroke::PaintHistory;
use crate::types::{Colour, Point};

/// A touch must land this close to the brush tip to start a stroke.
pub const TOUCH_PROXIMITY: f32 = 50.0;

/// Tunables for one painter variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PainterConfig {
    pub name: String,
    /// Animation frames, in order.
    pub sources: Vec<PathBuf>,
    pub scale: f32,
    /// Brush tip inside the image, in source pixels.
    pub offset_x: f32,
    pub offset_y: f32,
    /// Pivot at the image centre instead of its top-left corner.
    pub center: bool,
    /// Starting follow gain.
    pub speed: f32,
    /// Defaults to `speed`.
    pub max_speed: Option<f32>,
    /// Defaults to 30% of `max_speed`.
    pub min_speed: Option<f32>,
    pub acceleration: f32,
    /// Rotation gain applied to velocity.
    pub dr: f32,
    /// Rotation easing factor.
    pub speed_r: f32,
    pub idle_amplitude: f32,
    /// Seconds per radian of sway, x and y.
    pub idle_period_x: f32,
    pub idle_period_y: f32,
    pub idle_fade_rate: f32,
    /// Animation frames per second at the base step rate.
    pub frame_rate: f32,
    /// Stamp dabs instead of extending lines.
    pub lock_axis: bool,
    pub stroke: StrokeStyle,
}

impl Default for PainterConfig {
    fn default() -> Self {
        Self {
            name: "tode".into(),
            sources: vec![PathBuf::from("images/tode.png")],
            scale: 0.5,
            offset_x: 0.0,
            offset_y: 65.0,
            center: false,
            speed: 0.1,
            max_speed: None,
            min_speed: Some(0.035),
            acceleration: 0.001,
            dr: 0.01,
            speed_r: 1.0,
            idle_amplitude: 0.3,
            idle_period_x: 0.9,
            idle_period_y: 1.3,
            idle_fade_rate: 0.01,
            frame_rate: 6.0,
            lock_axis: false,
            stroke: StrokeStyle::default(),
        }
    }
}

impl PainterConfig {
    /// (min, max) follow gain.
    pub fn speed_bounds(&self) -> (f32, f32) {
        let max = self.max_speed.unwrap_or(self.speed);
        let min = self.min_speed.unwrap_or(max * 0.3);
        (min, max)
    }
}

/// Keep `speed` inside the bounds. An inverted range collapses to `min`;
/// NaN bounds are ignored instead of panicking like `f32::clamp` would.
fn clamp_speed(speed: f32, min: f32, max: f32) -> f32 {
    speed.max(min).min(max.max(min))
}

/// Index into the painter registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PainterId(pub usize);

/// Pointer state for one step. Missing axes mean "no new information".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointerInput {
    pub x: Option<f32>,
    pub y: Option<f32>,
    /// Primary button held.
    pub pressed: bool,
    /// Alternate button held: follow gain decelerates.
    pub alternate: bool,
    pub touches: Vec<Point>,
}

impl PointerInput {
    pub fn at(x: f32, y: f32) -> Self {
        Self { x: Some(x), y: Some(y), ..Self::default() }
    }

    /// The first touch wins over the mouse.
    pub fn target(&self) -> (Option<f32>, Option<f32>) {
        match self.touches.first() {
            Some(t) => (Some(t.x), Some(t.y)),
            None => (self.x, self.y),
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed || !self.touches.is_empty()
    }
}

/// Image bounds after scaling, known once sprites load.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Geometry {
    pub width: f32,
    pub height: f32,
    /// Pivot measured from the image's top-left corner.
    pub pivot: Point,
}

impl Geometry {
    fn fit(&mut self, (w, h): (u32, u32), scale: f32, center: bool) {
        self.width = w as f32 * scale;
        self.height = h as f32 * scale;
        self.pivot = if center { Point::new(self.width / 2.0, self.height / 2.0) } else { Point::ZERO };
    }
}

#[derive(Debug)]
pub struct Painter {
    pub id: PainterId,
    config: PainterConfig,
    /// Pivot position in world space.
    pub position: Point,
    pub velocity: Point,
    pub r: f32,
    pub target_r: f32,
    speed: f32,
    idle_fade_power: f32,
    frame: usize,
    frame_clock: u32,
    frame_cadence: u32,
    pub is_painting: bool,
    pub brush_velocity: Point,
    sprites: Deferred<SpriteSheet, Geometry>,
    geometry: Geometry,
    load_failures: u32,
}

impl Painter {
    pub fn new(id: PainterId, config: PainterConfig, base_rate: f32) -> Self {
        let (min, max) = config.speed_bounds();
        let frame_cadence = if config.frame_rate > 0.0 {
            (base_rate / config.frame_rate).round().max(1.0) as u32
        } else {
            u32::MAX
        };
        let mut painter = Self {
            id,
            speed: clamp_speed(config.speed, min, max),
            config,
            position: Point::ZERO,
            velocity: Point::ZERO,
            r: 0.0,
            target_r: 0.0,
            idle_fade_power: 0.0,
            frame: 0,
            frame_clock: 0,
            frame_cadence,
            is_painting: false,
            brush_velocity: Point::ZERO,
            sprites: Deferred::new(),
            geometry: Geometry::default(),
            load_failures: 0,
        };
        let (scale, center) = (painter.config.scale, painter.config.center);
        painter
            .sprites
            .when_ready(&mut painter.geometry, move |sheet, g| g.fit(sheet.size(), scale, center));
        painter
    }

    pub fn config(&self) -> &PainterConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn idle_fade_power(&self) -> f32 {
        self.idle_fade_power
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn frame_count(&self) -> usize {
        self.config.sources.len().max(1)
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn sprites(&self) -> Option<&SpriteSheet> {
        self.sprites.get()
    }

    /// Completion signal from the sprite loader.
    pub fn sprites_loaded(&mut self, sheet: SpriteSheet) {
        info!(painter = %self.config.name, frames = sheet.frames.len(), "sprites ready");
        self.sprites.resolve(sheet, &mut self.geometry);
    }

    /// Failed sprite load attempts so far.
    pub fn load_failures(&self) -> u32 {
        self.load_failures
    }

    /// A load attempt failed. Returns how many attempts have failed so far.
    /// The painter keeps whatever image state it had.
    pub fn sprites_failed(&mut self, err: &Error) -> u32 {
        self.load_failures += 1;
        warn!(painter = %self.config.name, attempt = self.load_failures, "sprite load failed: {err}");
        self.load_failures
    }

    /// Brush tip relative to the pivot, before rotation.
    fn brush_local(&self) -> Point {
        Point::new(self.config.offset_x, self.config.offset_y) * self.config.scale - self.geometry.pivot
    }

    /// World-space point where paint comes out.
    pub fn brush_tip(&self) -> Point {
        self.position + self.brush_local().rotate(self.r)
    }

    /// Image top-left relative to the pivot, before rotation. Draw with the
    /// same rotation as [`Painter::brush_tip`].
    pub fn image_origin(&self) -> Point {
        self.geometry.pivot * -1.0
    }

    /// Stop painting without touching strokes (they belong to the history).
    pub fn reset_painting(&mut self) {
        self.is_painting = false;
    }

    // Steps 1-3.
    fn advance_clocks(&mut self, alternate: bool) {
        let fade = if self.is_painting { -self.config.idle_fade_rate } else { self.config.idle_fade_rate };
        self.idle_fade_power = (self.idle_fade_power + fade).clamp(0.0, 1.0);

        self.frame_clock += 1;
        if self.frame_clock >= self.frame_cadence {
            self.frame_clock = 0;
            self.frame = (self.frame + 1) % self.frame_count();
        }

        let (min, max) = self.config.speed_bounds();
        let acceleration = self.config.acceleration * if alternate { -1.0 } else { 1.0 };
        self.speed = clamp_speed(self.speed + acceleration, min, max);
    }

    // Step 5.
    fn update_painting(&mut self, input: &PointerInput, tip: Point, colour: Colour, history: &mut PaintHistory) {
        if input.is_pressed() {
            if self.is_painting {
                return;
            }
            if let Some(touch) = input.touches.first() {
                if tip.distance(*touch) > TOUCH_PROXIMITY {
                    return;
                }
            }
            self.is_painting = true;
            history.begin(tip, colour, self.config.stroke, self.config.lock_axis);
        } else if self.is_painting {
            self.is_painting = false;
            history.seal();
        }
    }

    // Step 6.
    fn pursue(&mut self, input: &PointerInput) {
        let (tx, ty) = input.target();
        if let Some(tx) = tx {
            self.velocity.x = (tx - self.position.x) * self.speed;
            self.position.x += self.velocity.x;
        }
        if let Some(ty) = ty {
            self.velocity.y = (ty - self.position.y) * self.speed;
            self.position.y += self.velocity.y;
        }
    }

    // Step 7, applied to the active painter.
    fn sway(&mut self, time: f32) {
        let c = &self.config;
        let power = c.idle_amplitude * self.idle_fade_power;
        if power == 0.0 {
            return;
        }
        self.position.x += (time / c.idle_period_x).sin() * power;
        self.position.y += (time / c.idle_period_y).sin() * power;
    }

    // Steps 8-9 plus the sample for this step.
    fn settle(&mut self, tip_before: Point, history: &mut PaintHistory) {
        self.target_r = self.velocity.x * self.config.dr - self.velocity.y * self.config.dr;
        self.r += (self.target_r - self.r) * self.config.speed_r;

        let lagged = self.brush_velocity;
        self.brush_velocity = self.brush_tip() - tip_before;
        if self.is_painting {
            history.record(tip_before + lagged);
        }
    }
}

/// Every painter variant plus the one shared "active" slot.
#[derive(Debug)]
pub struct Painters {
    painters: Vec<Painter>,
    active: PainterId,
}

impl Painters {
    /// One painter per config; an empty list gets the default painter.
    pub fn new(configs: &[PainterConfig], base_rate: f32) -> Self {
        let configs = if configs.is_empty() { vec![PainterConfig::default()] } else { configs.to_vec() };
        let painters = configs
            .into_iter()
            .enumerate()
            .map(|(i, c)| Painter::new(PainterId(i), c, base_rate))
            .collect();
        Self { painters, active: PainterId(0) }
    }

    pub fn len(&self) -> usize {
        self.painters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.painters.is_empty()
    }

    pub fn active_id(&self) -> PainterId {
        self.active
    }

    pub fn active(&self) -> &Painter {
        &self.painters[self.active.0]
    }

    pub fn active_mut(&mut self) -> &mut Painter {
        &mut self.painters[self.active.0]
    }

    pub fn get(&self, id: PainterId) -> Option<&Painter> {
        self.painters.get(id.0)
    }

    pub fn get_mut(&mut self, id: PainterId) -> Option<&mut Painter> {
        self.painters.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Painter> {
        self.painters.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Painter> {
        self.painters.iter_mut()
    }

    /// Select by index, wrapping past the end.
    pub fn select(&mut self, index: usize) -> PainterId {
        self.active = PainterId(index % self.painters.len());
        debug!(painter = %self.active().name(), "painter selected");
        self.active
    }

    /// Cycle to the next painter.
    pub fn next(&mut self) -> PainterId {
        self.select(self.active.0 + 1)
    }

    /// One logical step for painter `id` toward `input`. `time` is wall-clock
    /// seconds, used only by the idle sway. Unknown ids are ignored.
    pub fn step(&mut self, id: PainterId, input: &PointerInput, time: f32, colour: Colour, history: &mut PaintHistory) {
        let Some(painter) = self.painters.get_mut(id.0) else {
            return;
        };
        painter.advance_clocks(input.alternate);
        let tip_before = painter.brush_tip();
        painter.update_painting(input, tip_before, colour, history);
        painter.pursue(input);

        let active = self.active.0;
        self.painters[active].sway(time);

        self.painters[id.0].settle(tip_before, history);
    }
}
