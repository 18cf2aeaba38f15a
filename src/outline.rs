// Outline renderer: polyline + style -> closed vector path, a pure function
// of the point list. Three passes:
//   1. streamline the raw samples (each point eases toward the next input)
//   2. offset left/right by a radius that thins with the implied pressure
//      (fast = far apart = thin)
//   3. join left side, end cap, reversed right side and start cap into a ring,
//      serialized as quadratic segments through vertex midpoints
// Visual: quick flicks taper to a point, slow drags stay fat and round.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::types::Point;

/// How fast implied pressure reacts to spacing changes.
const RATE_OF_PRESSURE_CHANGE: f32 = 0.275;
/// Slightly over half a turn so cap arcs never land exactly on a vertex.
const FIXED_PI: f32 = PI + 0.0001;
/// Points closer than this to the end of the line are skipped (except the last).
const END_NOISE: f32 = 3.0;
/// Pressure given to every raw sample before simulation.
const BASE_PRESSURE: f32 = 0.5;

/// Per-stroke style parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokeStyle {
    /// Base diameter of the ribbon.
    pub size: f32,
    /// How much pressure changes the width, 0 = constant width.
    pub thinning: f32,
    /// Minimum spacing between outline vertices, as a fraction of `size`.
    pub smoothing: f32,
    /// How strongly samples are pulled toward the previous point, 0..1.
    pub streamline: f32,
    /// Derive pressure from point spacing.
    pub simulate_pressure: bool,
    /// The input is complete: the last sample is used verbatim.
    pub last: bool,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            size: 10.0,
            thinning: 0.5,
            smoothing: 0.5,
            streamline: 0.5,
            simulate_pressure: true,
            last: false,
        }
    }
}

/// One command of a closed outline path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    QuadTo { ctrl: Point, to: Point },
    Close,
}

/// A closed outline, ready for the render target.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutlinePath {
    pub commands: Vec<PathCommand>,
}

impl OutlinePath {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// SVG path data (`d` attribute).
    pub fn to_svg(&self) -> String {
        self.commands
            .iter()
            .map(|cmd| match cmd {
                PathCommand::MoveTo(p) => format!("M{:.2},{:.2}", p.x, p.y),
                PathCommand::QuadTo { ctrl, to } => {
                    format!("Q{:.2},{:.2} {:.2},{:.2}", ctrl.x, ctrl.y, to.x, to.y)
                }
                PathCommand::Close => "Z".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Flatten into polygon rings for scanline filling.
    /// `segments` is the number of line pieces per quadratic.
    pub fn flatten(&self, segments: usize) -> Vec<Vec<Point>> {
        let segments = segments.max(1);
        let mut rings = Vec::new();
        let mut ring: Vec<Point> = Vec::new();
        let mut cursor = Point::ZERO;
        for cmd in &self.commands {
            match *cmd {
                PathCommand::MoveTo(p) => {
                    if ring.len() > 2 {
                        rings.push(std::mem::take(&mut ring));
                    }
                    ring.clear();
                    ring.push(p);
                    cursor = p;
                }
                PathCommand::QuadTo { ctrl, to } => {
                    for i in 1..=segments {
                        let t = i as f32 / segments as f32;
                        let a = cursor.lerp(ctrl, t);
                        let b = ctrl.lerp(to, t);
                        ring.push(a.lerp(b, t));
                    }
                    cursor = to;
                }
                PathCommand::Close => {
                    if ring.len() > 2 {
                        rings.push(std::mem::take(&mut ring));
                    }
                    ring.clear();
                }
            }
        }
        if ring.len() > 2 {
            rings.push(ring);
        }
        rings
    }
}

/// A streamlined sample with the data the outline walk needs.
#[derive(Clone, Copy, Debug, PartialEq)]
struct StrokePoint {
    point: Point,
    pressure: f32,
    /// Unit vector from this point back toward the previous one.
    vector: Point,
    distance: f32,
    running_length: f32,
}

/// Render the outline path for `points`. Empty input gives an empty path.
pub fn render_outline(points: &[Point], style: &StrokeStyle) -> OutlinePath {
    let ring = outline_points(&stroke_points(points, style), style);
    path_from_ring(&ring)
}

/// Serialize a ring: move to the first vertex, then quadratics with each
/// vertex as control and the midpoint to the next vertex as end, wrapping.
pub fn path_from_ring(ring: &[Point]) -> OutlinePath {
    let Some(&first) = ring.first() else {
        return OutlinePath::default();
    };
    let mut commands = Vec::with_capacity(ring.len() + 2);
    commands.push(PathCommand::MoveTo(first));
    for (i, &p) in ring.iter().enumerate() {
        let next = ring[(i + 1) % ring.len()];
        commands.push(PathCommand::QuadTo { ctrl: p, to: p.midpoint(next) });
    }
    commands.push(PathCommand::Close);
    OutlinePath { commands }
}

fn stroke_points(points: &[Point], style: &StrokeStyle) -> Vec<StrokePoint> {
    if points.is_empty() {
        return Vec::new();
    }

    let t = 0.15 + (1.0 - style.streamline) * 0.85;
    let mut pts: Vec<Point> = points.to_vec();

    // Two points: interpolate so the walk has something to smooth.
    if pts.len() == 2 {
        let (a, b) = (pts[0], pts[1]);
        pts.truncate(1);
        for i in 1..5 {
            pts.push(a.lerp(b, i as f32 / 4.0));
        }
    }
    // One point: add a second so the stroke has a direction.
    if pts.len() == 1 {
        pts.push(pts[0] + Point::new(1.0, 1.0));
    }

    let mut out = vec![StrokePoint {
        point: pts[0],
        pressure: BASE_PRESSURE,
        vector: Point::new(1.0, 1.0),
        distance: 0.0,
        running_length: 0.0,
    }];

    let max = pts.len() - 1;
    let mut reached_minimum_length = false;
    let mut running_length = 0.0;
    let mut prev = out[0];

    for (i, &raw) in pts.iter().enumerate().skip(1) {
        let point = if style.last && i == max { raw } else { prev.point.lerp(raw, t) };
        if point == prev.point {
            continue;
        }
        let distance = point.distance(prev.point);
        running_length += distance;
        // Ignore the jittery start until the line is at least one size long.
        if i < max && !reached_minimum_length {
            if running_length < style.size {
                continue;
            }
            reached_minimum_length = true;
        }
        prev = StrokePoint {
            point,
            pressure: BASE_PRESSURE,
            vector: (prev.point - point).normalized(),
            distance,
            running_length,
        };
        out.push(prev);
    }

    out[0].vector = out.get(1).map(|p| p.vector).unwrap_or(Point::ZERO);
    out
}

fn stroke_radius(style: &StrokeStyle, pressure: f32) -> f32 {
    style.size * (0.5 - style.thinning * (0.5 - pressure))
}

fn simulated_pressure(previous: f32, distance: f32, size: f32) -> f32 {
    let sp = (distance / size).min(1.0);
    let rp = (1.0 - sp).min(1.0);
    (previous + (rp - previous) * (sp * RATE_OF_PRESSURE_CHANGE)).min(1.0)
}

fn outline_points(points: &[StrokePoint], style: &StrokeStyle) -> Vec<Point> {
    let size = style.size;
    if points.is_empty() || size <= 0.0 {
        return Vec::new();
    }
    let len = points.len();
    let total_length = points[len - 1].running_length;
    let min_distance = (size * style.smoothing).powi(2);

    let mut left: Vec<Point> = Vec::new();
    let mut right: Vec<Point> = Vec::new();

    // Prime the pressure with the first few samples so strokes don't start fat.
    let mut prev_pressure = points.iter().take(10).fold(points[0].pressure, |acc, curr| {
        let pressure = if style.simulate_pressure {
            simulated_pressure(acc, curr.distance, size)
        } else {
            curr.pressure
        };
        (acc + pressure) / 2.0
    });

    let mut radius = stroke_radius(style, points[len - 1].pressure);
    let mut first_radius: Option<f32> = None;
    let mut prev_vector = points[0].vector;
    let mut pl = points[0].point;
    let mut pr = pl;
    let mut prev_was_sharp = false;

    for (i, sp) in points.iter().enumerate() {
        let StrokePoint { point, vector, distance, running_length, mut pressure } = *sp;

        if i < len - 1 && total_length - running_length < END_NOISE {
            continue;
        }

        if style.thinning != 0.0 {
            if style.simulate_pressure {
                pressure = simulated_pressure(prev_pressure, distance, size);
            }
            radius = stroke_radius(style, pressure);
        } else {
            radius = size / 2.0;
        }
        if first_radius.is_none() {
            first_radius = Some(radius);
        }
        radius = radius.max(0.01);

        let next_vector = if i < len - 1 { points[i + 1].vector } else { vector };
        let next_dpr = if i < len - 1 { vector.dot(next_vector) } else { 1.0 };
        let prev_dpr = vector.dot(prev_vector);
        let sharp = prev_dpr < 0.0 && !prev_was_sharp;
        let next_sharp = next_dpr < 0.0;

        // Sharp corner: draw a half-disc around the point instead of a join.
        if sharp || next_sharp {
            let offset = prev_vector.perpendicular() * radius;
            let step = 1.0 / 13.0;
            let mut t = 0.0;
            while t <= 1.0 {
                let tl = (point - offset).rotate_around(point, FIXED_PI * t);
                let tr = (point + offset).rotate_around(point, FIXED_PI * -t);
                left.push(tl);
                right.push(tr);
                pl = tl;
                pr = tr;
                t += step;
            }
            if next_sharp {
                prev_was_sharp = true;
            }
            continue;
        }
        prev_was_sharp = false;

        if i == len - 1 {
            let offset = vector.perpendicular() * radius;
            left.push(point - offset);
            right.push(point + offset);
            continue;
        }

        let offset = next_vector.lerp(vector, next_dpr).perpendicular() * radius;

        let tl = point - offset;
        if i <= 1 || pl.distance_squared(tl) > min_distance {
            left.push(tl);
            pl = tl;
        }
        let tr = point + offset;
        if i <= 1 || pr.distance_squared(tr) > min_distance {
            right.push(tr);
            pr = tr;
        }

        prev_pressure = pressure;
        prev_vector = vector;
    }

    let first_point = points[0].point;
    let last_point = if len > 1 { points[len - 1].point } else { first_point + Point::new(1.0, 1.0) };

    // A lone dot: a full circle around the first point.
    if len == 1 {
        let r = first_radius.unwrap_or(radius);
        let start = first_point + (first_point - last_point).perpendicular().normalized() * -r;
        let mut dot = Vec::new();
        let mut t = 1.0 / 13.0;
        while t <= 1.0 {
            dot.push(start.rotate_around(first_point, FIXED_PI * 2.0 * t));
            t += 1.0 / 13.0;
        }
        return dot;
    }

    let mut start_cap = Vec::new();
    if let Some(&r0) = right.first() {
        let mut t = 1.0 / 13.0;
        while t <= 1.0 {
            start_cap.push(r0.rotate_around(first_point, FIXED_PI * t));
            t += 1.0 / 13.0;
        }
    }

    let mut end_cap = Vec::new();
    let direction = (points[len - 1].vector * -1.0).perpendicular();
    let start = last_point + direction * radius;
    let mut t = 1.0 / 29.0;
    while t < 1.0 {
        end_cap.push(start.rotate_around(last_point, FIXED_PI * 3.0 * t));
        t += 1.0 / 29.0;
    }

    right.reverse();
    let mut ring = left;
    ring.extend(end_cap);
    ring.extend(right);
    ring.extend(start_cap);
    ring
}
