// Stroke recorder and paint history.
// Samples arrive once per logical step while the pointer is held. The first
// two are kept as-is; after that a candidate within SIMPLIFY_DISTANCE of the
// second-to-last point replaces the last point, otherwise it is appended.
// Visual: slow jitter collapses into one evolving point, so a wobbly hand
// still leaves a clean line.

use tracing::debug;

use crate::outline::{render_outline, OutlinePath, StrokeStyle};
use crate::types::{Colour, Point};

/// Replace-vs-append threshold. Empirically tuned; stroke shape depends on it.
pub const SIMPLIFY_DISTANCE: f32 = 5.0;

/// Identifies a stroke's rendered output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StrokeId(pub u64);

#[derive(Clone, Debug)]
pub struct Stroke {
    id: StrokeId,
    points: Vec<Point>,
    colour: Colour,
    style: StrokeStyle,
    /// Always replace: the stroke stays a bounded dab.
    lock_axis: bool,
    outline: OutlinePath,
    sealed: bool,
}

impl Stroke {
    pub fn new(id: StrokeId, seed: Point, colour: Colour, style: StrokeStyle, lock_axis: bool) -> Self {
        let mut stroke = Self {
            id,
            points: vec![seed],
            colour,
            style,
            lock_axis,
            outline: OutlinePath::default(),
            sealed: false,
        };
        stroke.refresh();
        stroke
    }

    pub fn id(&self) -> StrokeId {
        self.id
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn colour(&self) -> Colour {
        self.colour
    }

    pub fn style(&self) -> &StrokeStyle {
        &self.style
    }

    pub fn outline(&self) -> &OutlinePath {
        &self.outline
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Add one sample under the replace-or-append rule and re-render.
    /// Sealed strokes ignore samples.
    pub fn record_sample(&mut self, point: Point) {
        if self.sealed {
            return;
        }
        let n = self.points.len();
        if n < 2 {
            self.points.push(point);
        } else if self.lock_axis || point.distance(self.points[n - 2]) <= SIMPLIFY_DISTANCE {
            self.points[n - 1] = point;
        } else {
            self.points.push(point);
        }
        self.refresh();
    }

    /// Pointer released. The outline is rendered one last time as complete;
    /// the points are never touched again.
    fn seal(&mut self) {
        self.sealed = true;
        self.style.last = true;
        self.refresh();
    }

    fn refresh(&mut self) {
        self.outline = render_outline(&self.points, &self.style);
    }
}

/// Owns every stroke: the one being painted and the sealed history.
#[derive(Debug, Default)]
pub struct PaintHistory {
    current: Option<Stroke>,
    history: Vec<Stroke>,
    next_id: u64,
}

impl PaintHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a stroke at `seed`. An unfinished stroke is sealed first.
    pub fn begin(&mut self, seed: Point, colour: Colour, style: StrokeStyle, lock_axis: bool) -> StrokeId {
        self.seal();
        let id = StrokeId(self.next_id);
        self.next_id += 1;
        debug!(id = id.0, x = seed.x, y = seed.y, %colour, "stroke begun");
        self.current = Some(Stroke::new(id, seed, colour, style, lock_axis));
        id
    }

    /// Feed a sample to the current stroke; no-op when nothing is being painted.
    pub fn record(&mut self, point: Point) {
        if let Some(stroke) = &mut self.current {
            stroke.record_sample(point);
        }
    }

    /// Move the current stroke into history.
    pub fn seal(&mut self) {
        if let Some(mut stroke) = self.current.take() {
            stroke.seal();
            debug!(id = stroke.id.0, points = stroke.points.len(), "stroke sealed");
            self.history.push(stroke);
        }
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        debug!(removed = self.len(), "strokes cleared");
        self.current = None;
        self.history.clear();
    }

    /// Remove the in-progress stroke, or else the newest sealed one.
    pub fn undo(&mut self) -> Option<StrokeId> {
        let removed = self.current.take().or_else(|| self.history.pop());
        if let Some(stroke) = &removed {
            debug!(id = stroke.id.0, "stroke undone");
        }
        removed.map(|s| s.id)
    }

    pub fn current(&self) -> Option<&Stroke> {
        self.current.as_ref()
    }

    pub fn is_painting(&self) -> bool {
        self.current.is_some()
    }

    pub fn history(&self) -> &[Stroke] {
        &self.history
    }

    /// Sealed strokes oldest first, then the current one.
    pub fn iter(&self) -> impl Iterator<Item = &Stroke> {
        self.history.iter().chain(self.current.iter())
    }

    pub fn len(&self) -> usize {
        self.history.len() + usize::from(self.current.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
