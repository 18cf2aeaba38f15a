// Window + software drawing utilities (the render target).
// Visual effects provided here:
// 1) A resizable window that shows the painted frame.
// 2) Stroke outlines scan-filled in their colour.
// 3) Painter sprites drawn rotated about their pivot, alpha-blended.
// 4) A crosshair placeholder and a tiny 5x7 bitmap font for the HUD.

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use crate::error::Error;
use crate::gamma::GammaLut;
use crate::motion::{Painter, PointerInput};
use crate::outline::OutlinePath;
use crate::sprites::Sprite;
use crate::types::{Colour, FrameBuffer, Point};

/// Line pieces per quadratic when flattening outlines.
const CURVE_SEGMENTS: usize = 4;

pub struct Drawer {
    window: Window, // the on-screen window you see
}

impl Drawer {
    /// Create a resizable window.
    /// Visual: a new empty window appears with your chosen title.
    pub fn new(title: &str, width: usize, height: usize, target_fps: usize) -> Result<Self, Error> {
        let options = WindowOptions { resize: true, ..WindowOptions::default() };
        let mut window = Window::new(title, width, height, options)
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        window.set_target_fps(target_fps);
        Ok(Self { window })
    }

    /// Push the pixels for this frame to the screen.
    /// Visual: the window immediately displays the new image.
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<(), Error> {
        self.window
            .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))?;
        Ok(())
    }

    /// Returns false when the user closes the window (so we can stop the loop).
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Current window size in window pixels.
    pub fn size(&self) -> (usize, usize) {
        self.window.get_size()
    }

    /// Pointer state for this frame. Outside the window both axes are None,
    /// so painters keep their position.
    pub fn pointer_input(&self) -> PointerInput {
        let (x, y) = match self.window.get_mouse_pos(MouseMode::Discard) {
            Some((x, y)) => (Some(x), Some(y)),
            None => (None, None),
        };
        PointerInput {
            x,
            y,
            pressed: self.window.get_mouse_down(MouseButton::Left),
            alternate: self.window.get_mouse_down(MouseButton::Right),
            touches: Vec::new(),
        }
    }

    /// Keys that went down this frame (no auto-repeat).
    pub fn keys_pressed(&self) -> Vec<Key> {
        self.window.get_keys_pressed(KeyRepeat::No)
    }
}

/* ---------- Software drawing: pixels, lines, crosshair ---------- */

/// Put a pixel on the framebuffer if (x,y) is inside bounds.
#[inline]
fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    let idx = y * fb.width + x;
    fb.pixels[idx] = color;
}

/// Draw a thin line between (x0,y0) and (x1,y1) using Bresenham.
fn draw_line(fb: &mut FrameBuffer, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
    let (mut x0, mut y0, x1, y1) = (x0, y0, x1, y1);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put_pixel(fb, x0, y0, color);
        if x0 == x1 && y0 == y1 { break; }
        let e2 = 2 * err;
        if e2 >= dy { err += dy; x0 += sx; }
        if e2 <= dx { err += dx; y0 += sy; }
    }
}

/// Draw a small crosshair centered at (cx,cy).
/// Visual: a "+" stands in for a painter whose sprites haven't arrived.
pub fn draw_crosshair(fb: &mut FrameBuffer, cx: i32, cy: i32, size: i32, color: u32) {
    draw_line(fb, cx - size, cy, cx - 2, cy, color);
    draw_line(fb, cx + 2, cy, cx + size, cy, color);
    draw_line(fb, cx, cy - size, cx, cy - 2, color);
    draw_line(fb, cx, cy + 2, cx, cy + size, color);
    put_pixel(fb, cx, cy, color);
}

/* ---------- Filled outlines ---------- */

/// Scan-fill a closed outline with the non-zero winding rule.
/// Visual: the stroke's ribbon appears as a solid shape, self-overlaps stay filled.
pub fn fill_outline(fb: &mut FrameBuffer, path: &OutlinePath, colour: Colour) {
    let rings = path.flatten(CURVE_SEGMENTS);
    if rings.is_empty() || fb.width == 0 || fb.height == 0 {
        return;
    }

    let (mut min_y, mut max_y) = (f32::MAX, f32::MIN);
    for p in rings.iter().flatten() {
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    let y_start = min_y.floor().max(0.0) as usize;
    let y_end = (max_y.ceil().max(0.0) as usize).min(fb.height);
    let packed = colour.packed();

    let mut crossings: Vec<(f32, i32)> = Vec::new();
    for y in y_start..y_end {
        let sy = y as f32 + 0.5; // sample at pixel centres
        crossings.clear();
        for ring in &rings {
            for (i, &a) in ring.iter().enumerate() {
                let b = ring[(i + 1) % ring.len()];
                if (a.y <= sy) == (b.y <= sy) {
                    continue;
                }
                let t = (sy - a.y) / (b.y - a.y);
                let x = a.x + (b.x - a.x) * t;
                let dir = if b.y > a.y { 1 } else { -1 };
                crossings.push((x, dir));
            }
        }
        crossings.sort_by(|l, r| l.0.total_cmp(&r.0));

        let mut winding = 0;
        for pair in crossings.windows(2) {
            winding += pair[0].1;
            if winding == 0 {
                continue;
            }
            let x0 = (pair[0].0 - 0.5).ceil().max(0.0) as usize;
            let x1 = ((pair[1].0 - 0.5).ceil().max(0.0) as usize).min(fb.width);
            let row = y * fb.width;
            for px in &mut fb.pixels[row + x0.min(x1)..row + x1] {
                *px = packed;
            }
        }
    }
}

/* ---------- Sprites ---------- */

/// Draw `sprite` rotated by `r` about `pivot` (world space). `origin` is the
/// sprite's top-left relative to the pivot, already scaled.
/// Visual: the painter turns around its pivot; transparent pixels show the strokes below.
pub fn draw_sprite(
    fb: &mut FrameBuffer,
    sprite: &Sprite,
    pivot: Point,
    origin: Point,
    scale: f32,
    r: f32,
    lut: &GammaLut,
) {
    if sprite.width == 0 || sprite.height == 0 || scale <= 0.0 {
        return;
    }
    let w = sprite.width as f32 * scale;
    let h = sprite.height as f32 * scale;
    let corners = [
        origin,
        origin + Point::new(w, 0.0),
        origin + Point::new(0.0, h),
        origin + Point::new(w, h),
    ]
    .map(|c| pivot + c.rotate(r));

    let min_x = corners.iter().map(|c| c.x).fold(f32::MAX, f32::min).floor().max(0.0) as usize;
    let min_y = corners.iter().map(|c| c.y).fold(f32::MAX, f32::min).floor().max(0.0) as usize;
    let max_x = (corners.iter().map(|c| c.x).fold(f32::MIN, f32::max).ceil().max(0.0) as usize).min(fb.width);
    let max_y = (corners.iter().map(|c| c.y).fold(f32::MIN, f32::max).ceil().max(0.0) as usize).min(fb.height);

    // Inverse mapping: for each covered screen pixel find the source texel.
    for y in min_y..max_y {
        for x in min_x..max_x {
            let world = Point::new(x as f32 + 0.5, y as f32 + 0.5);
            let local = (world - pivot).rotate(-r) - origin;
            let sx = (local.x / scale).floor() as i64;
            let sy = (local.y / scale).floor() as i64;
            let Some(texel) = sprite.sample(sx, sy) else { continue };
            let alpha = (texel >> 24) as f32 / 255.0;
            let idx = y * fb.width + x;
            fb.pixels[idx] = lut.blend(fb.pixels[idx], Colour::from_packed(texel), alpha);
        }
    }
}

/// Draw one painter: its current animation frame, or a crosshair at the
/// brush tip while sprites are still loading.
pub fn draw_painter(fb: &mut FrameBuffer, painter: &Painter, lut: &GammaLut, placeholder: Colour) {
    match painter.sprites().and_then(|sheet| sheet.frame(painter.frame())) {
        Some(sprite) => draw_sprite(
            fb,
            sprite,
            painter.position,
            painter.image_origin(),
            painter.config().scale,
            painter.r,
            lut,
        ),
        None => {
            let tip = painter.brush_tip();
            draw_crosshair(fb, tip.x.round() as i32, tip.y.round() as i32, 12, placeholder.packed());
        }
    }
}

/// Blend a solid rectangle over the frame with `alpha` coverage.
/// Visual: an overlay box fades in and out over whatever is below.
pub fn blend_rect(fb: &mut FrameBuffer, x: i32, y: i32, w: i32, h: i32, colour: Colour, alpha: f32, lut: &GammaLut) {
    if alpha <= 0.0 || w <= 0 || h <= 0 {
        return;
    }
    let x0 = x.max(0) as usize;
    let y0 = y.max(0) as usize;
    let x1 = ((x + w).max(0) as usize).min(fb.width);
    let y1 = ((y + h).max(0) as usize).min(fb.height);
    for row in y0..y1 {
        for col in x0..x1 {
            let idx = row * fb.width + col;
            fb.pixels[idx] = lut.blend(fb.pixels[idx], colour, alpha);
        }
    }
}

/* ---------- 5x7 bitmap font (uppercase ASCII subset for the HUD) ---------- */

/// Return a 5x7 glyph bitmap. Lowercase maps to uppercase.
/// Each u8 is a row; the low 5 bits are the pixels (bit 4 = leftmost).
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch.to_ascii_uppercase() {
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        'A' => g!(0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'B' => g!(0b11110,0b10001,0b10001,0b11110,0b10001,0b10001,0b11110),
        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'D' => g!(0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100),
        'E' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'G' => g!(0b01110,0b10001,0b10000,0b10111,0b10001,0b10001,0b01111),
        'H' => g!(0b10001,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'I' => g!(0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'J' => g!(0b00111,0b00010,0b00010,0b00010,0b00010,0b10010,0b01100),
        'K' => g!(0b10001,0b10010,0b10100,0b11000,0b10100,0b10010,0b10001),
        'L' => g!(0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111),
        'M' => g!(0b10001,0b11011,0b10101,0b10101,0b10001,0b10001,0b10001),
        'N' => g!(0b10001,0b10001,0b11001,0b10101,0b10011,0b10001,0b10001),
        'O' => g!(0b01110,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'P' => g!(0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000),
        'Q' => g!(0b01110,0b10001,0b10001,0b10001,0b10101,0b10010,0b01101),
        'R' => g!(0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),
        'T' => g!(0b11111,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        'U' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'V' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b01010,0b00100),
        'W' => g!(0b10001,0b10001,0b10001,0b10101,0b10101,0b10101,0b01010),
        'X' => g!(0b10001,0b10001,0b01010,0b00100,0b01010,0b10001,0b10001),
        'Y' => g!(0b10001,0b10001,0b10001,0b01010,0b00100,0b00100,0b00100),
        'Z' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b10000,0b11111),

        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        '|' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '.' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00100,0b00000),
        '-' => g!(0b00000,0b00000,0b00000,0b11111,0b00000,0b00000,0b00000),
        '_' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b11111),

        _ => None,
    }
}

/// Draw a single 5x7 character at (x,y) with a 1-pixel black shadow.
fn draw_char_5x7(fb: &mut FrameBuffer, x: i32, y: i32, ch: char, color: u32) {
    if let Some(rows) = glyph5x7(ch) {
        for (shadow, c) in [(1, 0x00000000), (0, color)] {
            for (ry, rowbits) in rows.iter().enumerate() {
                for rx in 0..5 {
                    if (rowbits & (1 << (4 - rx))) != 0 {
                        put_pixel(fb, x + rx + shadow, y + ry as i32 + shadow, c);
                    }
                }
            }
        }
    }
}

/// Draw a text string using 5x7 glyphs.
/// Visual: a compact HUD string appears; each glyph is 5x7 with 1-pixel spacing.
pub fn draw_text_5x7(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, color: u32) {
    for ch in text.chars() {
        draw_char_5x7(fb, x, y, ch, color);
        x += 6; // 5 pixels glyph width + 1 pixel spacing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::{path_from_ring, render_outline, StrokeStyle};

    fn count(fb: &FrameBuffer, colour: Colour) -> usize {
        fb.pixels.iter().filter(|&&p| p == colour.packed()).count()
    }

    #[test]
    fn fills_a_square_ring() {
        let mut fb = FrameBuffer::new(20, 20);
        // quads through midpoints of a square ring round its corners a little
        let ring = vec![
            Point::new(2.0, 2.0),
            Point::new(12.0, 2.0),
            Point::new(12.0, 12.0),
            Point::new(2.0, 12.0),
        ];
        fill_outline(&mut fb, &path_from_ring(&ring), Colour::RED);
        let filled = count(&fb, Colour::RED);
        assert!(filled > 60 && filled <= 100, "filled {filled}");
        assert_eq!(fb.pixels[7 * 20 + 7], Colour::RED.packed());
        assert_eq!(fb.pixels[0], 0);
    }

    #[test]
    fn fills_a_stroke_without_leaking() {
        let mut fb = FrameBuffer::new(100, 40);
        let pts: Vec<Point> = (0..15).map(|i| Point::new(10.0 + i as f32 * 5.0, 20.0)).collect();
        let path = render_outline(&pts, &StrokeStyle { thinning: 0.0, ..StrokeStyle::default() });
        fill_outline(&mut fb, &path, Colour::WHITE);
        assert_eq!(fb.pixels[20 * 100 + 40], Colour::WHITE.packed());
        // rows far from the line stay empty
        assert!(fb.pixels[..5 * 100].iter().all(|&p| p == 0));
        assert!(fb.pixels[35 * 100..].iter().all(|&p| p == 0));
    }

    #[test]
    fn empty_outline_draws_nothing() {
        let mut fb = FrameBuffer::new(8, 8);
        fill_outline(&mut fb, &OutlinePath::default(), Colour::WHITE);
        assert_eq!(count(&fb, Colour::WHITE), 0);
    }

    #[test]
    fn opaque_sprite_lands_at_origin() {
        let lut = GammaLut::new();
        let mut fb = FrameBuffer::new(10, 10);
        let sprite = Sprite { width: 2, height: 2, pixels: vec![0xFF00FF00; 4] };
        draw_sprite(&mut fb, &sprite, Point::new(4.0, 4.0), Point::ZERO, 1.0, 0.0, &lut);
        assert_eq!(fb.pixels[4 * 10 + 4], 0x0000FF00);
        assert_eq!(fb.pixels[5 * 10 + 5], 0x0000FF00);
        assert_eq!(fb.pixels[6 * 10 + 6], 0);
        assert_eq!(count(&fb, Colour::GREEN), 4);
    }

    #[test]
    fn transparent_texels_leave_background() {
        let lut = GammaLut::new();
        let mut fb = FrameBuffer::new(4, 4);
        fb.fill(Colour::RED);
        let sprite = Sprite { width: 4, height: 4, pixels: vec![0x00FFFFFF; 16] };
        draw_sprite(&mut fb, &sprite, Point::ZERO, Point::ZERO, 1.0, 0.0, &lut);
        assert_eq!(count(&fb, Colour::RED), 16);
    }

    #[test]
    fn rect_clips_to_frame() {
        let lut = GammaLut::new();
        let mut fb = FrameBuffer::new(5, 5);
        blend_rect(&mut fb, -3, 3, 100, 100, Colour::GREEN, 1.0, &lut);
        assert_eq!(count(&fb, Colour::GREEN), 10);
    }

    #[test]
    fn hud_text_draws_glyphs() {
        let mut fb = FrameBuffer::new(40, 10);
        draw_text_5x7(&mut fb, 0, 0, "Hi", 0x00FFFFFF);
        assert!(fb.pixels.iter().any(|&p| p == 0x00FFFFFF));
    }
}
