// Picture mode: freeze-frame flash + export of the canvas.
// Visual: pressing the screenshot key flashes the window white for a moment
// (even while paused), then a PNG of the frame and an SVG of every stroke
// land in the export directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Error;
use crate::gamma::GammaLut;
use crate::stroke::PaintHistory;
use crate::types::{Colour, FrameBuffer};

/// Flash length in loop iterations.
const FLASH_TICKS: f32 = 12.0;

#[derive(Debug, Default)]
pub struct PictureMode {
    flash: f32,
    capture_pending: bool,
    shots: u32,
}

impl PictureMode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a capture after the next full render.
    pub fn request(&mut self) {
        self.capture_pending = true;
        self.flash = 1.0;
    }

    pub fn flash(&self) -> f32 {
        self.flash
    }

    /// Runs every loop iteration, paused or not.
    pub fn supertick(&mut self) {
        self.flash = (self.flash - 1.0 / FLASH_TICKS).max(0.0);
    }

    /// White wash over the frame while the flash is fading.
    pub fn draw_flash(&self, fb: &mut FrameBuffer, lut: &GammaLut) {
        if self.flash <= 0.0 {
            return;
        }
        for p in &mut fb.pixels {
            *p = lut.blend(*p, Colour::WHITE, self.flash * 0.6);
        }
    }

    /// Take the pending capture, if any. Call with the frame *before* the
    /// flash is drawn so the picture is clean.
    pub fn take_capture(&mut self, fb: &FrameBuffer, strokes: &PaintHistory, background: Colour, dir: &Path) -> Option<Result<(PathBuf, PathBuf), Error>> {
        if !self.capture_pending {
            return None;
        }
        self.capture_pending = false;
        self.shots += 1;
        let stem = format!("picture-{:03}", self.shots);
        Some(export(fb, strokes, background, dir, &stem))
    }
}

fn export(fb: &FrameBuffer, strokes: &PaintHistory, background: Colour, dir: &Path, stem: &str) -> Result<(PathBuf, PathBuf), Error> {
    fs::create_dir_all(dir).map_err(|source| Error::ExportIo { path: dir.to_path_buf(), source })?;
    let png = dir.join(format!("{stem}.png"));
    let svg = dir.join(format!("{stem}.svg"));
    save_png(fb, &png)?;
    let doc = strokes_svg(strokes, fb.width, fb.height, background);
    fs::write(&svg, doc).map_err(|source| Error::ExportIo { path: svg.clone(), source })?;
    info!(png = %png.display(), svg = %svg.display(), "picture exported");
    Ok((png, svg))
}

/// Write the framebuffer as an RGB PNG.
pub fn save_png(fb: &FrameBuffer, path: &Path) -> Result<(), Error> {
    let mut img = image::RgbImage::new(fb.width as u32, fb.height as u32);
    for (dst, &px) in img.pixels_mut().zip(&fb.pixels) {
        let c = Colour::from_packed(px);
        *dst = image::Rgb([c.r, c.g, c.b]);
    }
    img.save(path).map_err(|source| Error::ExportEncode { path: path.to_path_buf(), source })
}

/// Every stroke outline as one SVG document, oldest at the bottom.
pub fn strokes_svg(strokes: &PaintHistory, width: usize, height: usize, background: Colour) -> String {
    let mut doc = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">\n"
    );
    doc.push_str(&format!("  <rect width=\"100%\" height=\"100%\" fill=\"{background}\"/>\n"));
    for stroke in strokes.iter() {
        if stroke.outline().is_empty() {
            continue;
        }
        doc.push_str(&format!(
            "  <path id=\"stroke-{}\" d=\"{}\" fill=\"{}\"/>\n",
            stroke.id().0,
            stroke.outline().to_svg(),
            stroke.colour()
        ));
    }
    doc.push_str("</svg>\n");
    doc
}
