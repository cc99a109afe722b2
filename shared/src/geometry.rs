//! 2D geometry primitives shared by the server simulation and the client mirror.
//!
//! The world uses screen coordinates: `x` grows to the right and `y` grows
//! downwards, so "up" is `(0, -1)`.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// Represents a point or a vector in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vector2D {
    /// Value along the x-axis. Positive direction is to the right.
    #[serde(rename = "X")]
    pub x: f64,
    /// Value along the y-axis. Positive direction is down.
    #[serde(rename = "Y")]
    pub y: f64,
}

impl Vector2D {
    pub const ZERO: Vector2D = Vector2D { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the length of the vector.
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Returns the unit vector pointing the same way, or zero for the zero vector.
    pub fn normalize(&self) -> Vector2D {
        let len = self.length();
        if len == 0.0 {
            Vector2D::ZERO
        } else {
            Vector2D::new(self.x / len, self.y / len)
        }
    }

    /// Returns the scaled vector.
    pub fn scale(&self, scalar: f64) -> Vector2D {
        Vector2D::new(self.x * scalar, self.y * scalar)
    }

    /// Returns the distance between two points.
    pub fn distance(&self, other: &Vector2D) -> f64 {
        (*self - *other).length()
    }

    /// True for the four axis-aligned unit vectors.
    pub fn is_cardinal(&self) -> bool {
        Direction::from_vector(*self).is_some()
    }

    /// True if both vectors are cardinal and `other` is exactly `-self`.
    pub fn is_opposite_cardinal(&self, other: &Vector2D) -> bool {
        self.is_cardinal() && other.is_cardinal() && *other == -*self
    }
}

impl Add for Vector2D {
    type Output = Vector2D;

    fn add(self, rhs: Vector2D) -> Vector2D {
        Vector2D::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector2D {
    type Output = Vector2D;

    fn sub(self, rhs: Vector2D) -> Vector2D {
        Vector2D::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vector2D {
    type Output = Vector2D;

    fn mul(self, rhs: f64) -> Vector2D {
        self.scale(rhs)
    }
}

impl Neg for Vector2D {
    type Output = Vector2D;

    fn neg(self) -> Vector2D {
        Vector2D::new(-self.x, -self.y)
    }
}

/// One of the four movement directives a client can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Left,
    Down,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Left,
        Direction::Down,
        Direction::Right,
    ];

    /// Unit vector for this direction in screen coordinates.
    pub fn to_vector(self) -> Vector2D {
        match self {
            Direction::Up => Vector2D::new(0.0, -1.0),
            Direction::Left => Vector2D::new(-1.0, 0.0),
            Direction::Down => Vector2D::new(0.0, 1.0),
            Direction::Right => Vector2D::new(1.0, 0.0),
        }
    }

    /// Maps an exact cardinal unit vector back to its direction.
    pub fn from_vector(v: Vector2D) -> Option<Direction> {
        Direction::ALL.into_iter().find(|d| d.to_vector() == v)
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Left => Direction::Right,
            Direction::Down => Direction::Up,
            Direction::Right => Direction::Left,
        }
    }
}

/// Direction of travel along the axis-aligned segment `from -> to`.
///
/// Returns `None` for zero-length or diagonal segments.
pub fn segment_direction(from: Vector2D, to: Vector2D) -> Option<Direction> {
    Direction::from_vector((to - from).normalize())
}

/// True if the segment `a -> b` is the jump a snake makes when it wraps
/// around the world: both endpoints sit on or beyond opposite edges of the
/// same axis. Such a segment is not part of the physical body.
pub fn spans_world_edge(a: Vector2D, b: Vector2D, world_size: f64) -> bool {
    let half = world_size / 2.0;
    let across = |p: f64, q: f64| p.abs() >= half && q.abs() >= half && p.signum() != q.signum();
    across(a.x, b.x) || across(a.y, b.y)
}

/// An axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Rect {
    /// Box spanned by two points, grown by `inflate` on every side.
    pub fn around(a: Vector2D, b: Vector2D, inflate: f64) -> Rect {
        Rect {
            min_x: a.x.min(b.x) - inflate,
            max_x: a.x.max(b.x) + inflate,
            min_y: a.y.min(b.y) - inflate,
            max_y: a.y.max(b.y) + inflate,
        }
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        rect_overlap(self, other)
    }
}

/// Separating-axis test on open intervals: boxes that only share an edge
/// do not overlap.
pub fn rect_overlap(a: &Rect, b: &Rect) -> bool {
    a.min_x < b.max_x && a.max_x > b.min_x && a.min_y < b.max_y && a.max_y > b.min_y
}
