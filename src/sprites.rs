// Painter sprite sheets, decoded off the frame loop.
// Visual expectation: painters show a crosshair placeholder until their images
// arrive, then switch to the animated sprite without a hitch.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::error::Error;
use crate::motion::PainterId;

/// One decoded frame. Pixels are 0xAARRGGBB, straight (not premultiplied) alpha.
#[derive(Clone, Debug)]
pub struct Sprite {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl Sprite {
    /// Decode an image file.
    pub fn load(path: &PathBuf) -> Result<Self, Error> {
        let img = image::open(path)
            .map_err(|source| Error::SpriteLoad { path: path.clone(), source })?
            .to_rgba8();
        Ok(Self::from_rgba(&img))
    }

    /// Pack an RGBA image buffer as 0xAARRGGBB pixels.
    pub fn from_rgba(img: &image::RgbaImage) -> Self {
        let (w, h) = img.dimensions();
        let mut out = Vec::with_capacity((w as usize) * (h as usize));
        for (_x, _y, pixel) in img.enumerate_pixels() {
            let [r, g, b, a] = pixel.0;
            out.push(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32);
        }
        Self { width: w, height: h, pixels: out }
    }

    /// Alpha-aware lookup; None outside the image.
    #[inline]
    pub fn sample(&self, x: i64, y: i64) -> Option<u32> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(self.pixels[y as usize * self.width as usize + x as usize])
    }
}

/// Animation frames for one painter, in playback order.
#[derive(Clone, Debug)]
pub struct SpriteSheet {
    pub frames: Vec<Sprite>,
}

impl SpriteSheet {
    /// Bounds of the first frame; every frame is drawn in this box.
    pub fn size(&self) -> (u32, u32) {
        self.frames.first().map(|f| (f.width, f.height)).unwrap_or((0, 0))
    }

    pub fn frame(&self, index: usize) -> Option<&Sprite> {
        if self.frames.is_empty() {
            None
        } else {
            self.frames.get(index % self.frames.len())
        }
    }
}

struct Request {
    painter: PainterId,
    name: String,
    sources: Vec<PathBuf>,
}

/// A finished load attempt.
pub struct Loaded {
    pub painter: PainterId,
    pub result: Result<SpriteSheet, Error>,
}

/// Worker thread that decodes sprite sheets and reports back over a channel.
pub struct SpriteLoader {
    requests: Option<Sender<Request>>,
    results: Receiver<Loaded>,
    worker: Option<JoinHandle<()>>,
}

impl SpriteLoader {
    pub fn spawn() -> Self {
        let (req_tx, req_rx) = mpsc::channel::<Request>();
        let (res_tx, res_rx) = mpsc::channel::<Loaded>();
        let worker = thread::Builder::new()
            .name("sprite-loader".into())
            .spawn(move || {
                // Ends when the loader (and its sender) is dropped.
                for req in req_rx {
                    let result = load_sheet(&req.name, &req.sources);
                    if res_tx.send(Loaded { painter: req.painter, result }).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| warn!("sprite loader thread failed to start: {e}"))
            .ok();
        Self { requests: Some(req_tx), results: res_rx, worker }
    }

    /// Queue a load. Results show up in [`SpriteLoader::poll`].
    pub fn request(&self, painter: PainterId, name: &str, sources: &[PathBuf]) {
        debug!(painter = painter.0, name, count = sources.len(), "sprite load requested");
        let req = Request { painter, name: name.to_string(), sources: sources.to_vec() };
        if let Some(tx) = &self.requests {
            if tx.send(req).is_err() {
                warn!(painter = painter.0, "sprite loader is gone, request dropped");
            }
        }
    }

    /// Everything that finished since the last poll. Never blocks.
    pub fn poll(&self) -> Vec<Loaded> {
        let mut done = Vec::new();
        loop {
            match self.results.try_recv() {
                Ok(loaded) => done.push(loaded),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        done
    }
}

impl Drop for SpriteLoader {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn load_sheet(name: &str, sources: &[PathBuf]) -> Result<SpriteSheet, Error> {
    if sources.is_empty() {
        return Err(Error::NoSprites(name.to_string()));
    }
    let frames = sources.iter().map(Sprite::load).collect::<Result<Vec<_>, _>>()?;
    Ok(SpriteSheet { frames })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_for(loader: &SpriteLoader) -> Loaded {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(l) = loader.poll().into_iter().next() {
                return l;
            }
            assert!(Instant::now() < deadline, "loader never answered");
            thread::yield_now();
        }
    }

    #[test]
    fn packs_rgba_as_argb() {
        let img = image::RgbaImage::from_pixel(2, 1, image::Rgba([0x11, 0x22, 0x33, 0x80]));
        let s = Sprite::from_rgba(&img);
        assert_eq!(s.pixels, vec![0x80112233, 0x80112233]);
        assert_eq!(s.sample(1, 0), Some(0x80112233));
        assert_eq!(s.sample(2, 0), None);
    }

    #[test]
    fn loads_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        image::RgbaImage::from_pixel(4, 3, image::Rgba([255, 0, 0, 255])).save(&path).unwrap();

        let loader = SpriteLoader::spawn();
        loader.request(PainterId(2), "red", &[path.clone(), path]);
        let loaded = wait_for(&loader);
        assert_eq!(loaded.painter, PainterId(2));
        let sheet = loaded.result.unwrap();
        assert_eq!(sheet.frames.len(), 2);
        assert_eq!(sheet.size(), (4, 3));
    }

    #[test]
    fn missing_file_reports_error() {
        let loader = SpriteLoader::spawn();
        loader.request(PainterId(0), "ghost", &[PathBuf::from("/definitely/not/here.png")]);
        let loaded = wait_for(&loader);
        assert!(matches!(loaded.result, Err(Error::SpriteLoad { .. })));
    }

    #[test]
    fn no_sources_is_an_error() {
        let loader = SpriteLoader::spawn();
        loader.request(PainterId(0), "empty", &[]);
        assert!(matches!(wait_for(&loader).result, Err(Error::NoSprites(_))));
    }
}
