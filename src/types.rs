// Core types shared by the simulation and the software renderer.

use std::fmt;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the surface is (pixels)
    pub height: usize,     // how tall the surface is (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }

    /// Reallocate to a new surface size. Visual: the next frame fills the whole window.
    pub fn resize(&mut self, width: usize, height: usize) {
        if self.width == width && self.height == height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![0u32; width * height];
    }

    pub fn fill(&mut self, colour: Colour) {
        let packed = colour.packed();
        for p in &mut self.pixels {
            *p = packed;
        }
    }
}

/// A 2D point (or vector) in surface units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Point) -> f32 {
        (self - other).length()
    }

    pub fn distance_squared(self, other: Point) -> f32 {
        let d = self - other;
        d.x * d.x + d.y * d.y
    }

    pub fn dot(self, other: Point) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Perpendicular (rotated a quarter turn clockwise in screen space).
    pub fn perpendicular(self) -> Point {
        Point::new(self.y, -self.x)
    }

    /// Unit vector; the zero vector stays zero.
    pub fn normalized(self) -> Point {
        let len = self.length();
        if len == 0.0 { Point::ZERO } else { Point::new(self.x / len, self.y / len) }
    }

    pub fn lerp(self, other: Point, t: f32) -> Point {
        self + (other - self) * t
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Rotate by `angle` radians about the origin.
    pub fn rotate(self, angle: f32) -> Point {
        let (s, c) = angle.sin_cos();
        Point::new(self.x * c - self.y * s, self.x * s + self.y * c)
    }

    /// Rotate by `angle` radians about `center`.
    pub fn rotate_around(self, center: Point, angle: f32) -> Point {
        (self - center).rotate(angle) + center
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;
    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// An opaque RGB colour. Parsed from `#rrggbb` strings in the config file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Colour {
    pub const BLACK: Colour = Colour::rgb(0, 0, 0);
    pub const WHITE: Colour = Colour::rgb(255, 255, 255);
    pub const RED: Colour = Colour::rgb(255, 70, 70);
    pub const GREEN: Colour = Colour::rgb(0, 255, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// 0x00RRGGBB, the layout minifb expects.
    pub fn packed(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    pub fn from_packed(px: u32) -> Self {
        Self::rgb(((px >> 16) & 0xFF) as u8, ((px >> 8) & 0xFF) as u8, (px & 0xFF) as u8)
    }
}

impl TryFrom<String> for Colour {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 {
            return Err(format!("colour {value:?} is not of the form #rrggbb"));
        }
        let packed = u32::from_str_radix(hex, 16)
            .map_err(|e| format!("colour {value:?}: {e}"))?;
        Ok(Colour::from_packed(packed))
    }
}

impl From<Colour> for String {
    fn from(c: Colour) -> String {
        c.to_string()
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}
