// Green-screen overlay layouts.
// A layout is a named set of boxes drawn over the canvas for broadcast keying.
// Visual: boxes fade in and out by a fixed amount per logical step.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::draw::blend_rect;
use crate::gamma::GammaLut;
use crate::types::{Colour, FrameBuffer};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxConfig {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    #[serde(default = "default_box_colour")]
    pub colour: Colour,
}

fn default_box_colour() -> Colour {
    Colour::GREEN
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub name: String,
    #[serde(default)]
    pub boxes: Vec<BoxConfig>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Opacity change per logical step.
    pub fade_speed: f32,
    /// Start with the boxes showing.
    pub visible: bool,
    pub layouts: Vec<LayoutConfig>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            fade_speed: 0.05,
            visible: false,
            layouts: vec![
                LayoutConfig {
                    name: "camera".into(),
                    boxes: vec![BoxConfig { x: 20, y: 20, width: 320, height: 180, colour: Colour::GREEN }],
                },
                LayoutConfig {
                    name: "split".into(),
                    boxes: vec![
                        BoxConfig { x: 0, y: 0, width: 400, height: 720, colour: Colour::GREEN },
                        BoxConfig { x: 20, y: 560, width: 240, height: 140, colour: Colour::GREEN },
                    ],
                },
            ],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct FadingBox {
    config: BoxConfig,
    opacity: f32,
    /// +1 fading in, -1 fading out.
    direction: f32,
}

pub struct Overlay {
    layouts: Vec<LayoutConfig>,
    current: usize,
    boxes: Vec<FadingBox>,
    fade_speed: f32,
    visible: bool,
}

impl Overlay {
    pub fn new(config: &OverlayConfig) -> Self {
        let mut overlay = Self {
            layouts: config.layouts.clone(),
            current: 0,
            boxes: Vec::new(),
            fade_speed: config.fade_speed,
            visible: config.visible,
        };
        overlay.load_boxes(if config.visible { 1.0 } else { 0.0 });
        overlay
    }

    fn load_boxes(&mut self, opacity: f32) {
        let direction = if self.visible { 1.0 } else { -1.0 };
        self.boxes = self
            .layouts
            .get(self.current)
            .map(|l| l.boxes.iter().cloned().map(|config| FadingBox { config, opacity, direction }).collect())
            .unwrap_or_default();
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn layout_name(&self) -> Option<&str> {
        self.layouts.get(self.current).map(|l| l.name.as_str())
    }

    /// Opacity of each box in the current layout.
    pub fn opacities(&self) -> Vec<f32> {
        self.boxes.iter().map(|b| b.opacity).collect()
    }

    /// Flip visibility; boxes fade toward the new state.
    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        let direction = if self.visible { 1.0 } else { -1.0 };
        for b in &mut self.boxes {
            b.direction = direction;
        }
        info!(visible = self.visible, "overlay toggled");
    }

    /// Next layout (wrapping). New boxes start transparent and fade in if visible.
    pub fn cycle(&mut self) {
        if self.layouts.is_empty() {
            return;
        }
        self.current = (self.current + 1) % self.layouts.len();
        self.load_boxes(0.0);
        info!(layout = self.layout_name().unwrap_or_default(), "layout switched");
    }

    /// One logical step of fading.
    pub fn update(&mut self) {
        for b in &mut self.boxes {
            b.opacity = (b.opacity + b.direction * self.fade_speed).clamp(0.0, 1.0);
        }
    }

    pub fn draw(&self, fb: &mut FrameBuffer, lut: &GammaLut) {
        for b in &self.boxes {
            let c = &b.config;
            blend_rect(fb, c.x, c.y, c.width, c.height, c.colour, b.opacity, lut);
        }
    }
}
