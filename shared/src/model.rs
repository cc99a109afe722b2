//! Game entities as they exist on the server and travel over the wire.

use crate::geometry::{segment_direction, Direction, Vector2D};
use serde::{Deserialize, Serialize};

/// A player's avatar: a polyline of axis-aligned segments, tail first and
/// head last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snake {
    /// Connection id of the owning player
    #[serde(rename = "snake")]
    pub id: u32,
    pub name: String,
    /// At least two points, `body[0]` is the tail and the last point is the head
    pub body: Vec<Vector2D>,
    /// Current cardinal unit vector
    #[serde(rename = "dir")]
    pub direction: Vector2D,
    pub score: u32,
    /// True for exactly one tick after a death
    pub died: bool,
    pub alive: bool,
    #[serde(rename = "dc")]
    pub disconnected: bool,
    /// True until the first world update after creation
    #[serde(rename = "join")]
    pub joined: bool,
    #[serde(skip)]
    pub respawn_counter: u32,
    #[serde(skip)]
    pub growth_counter: u32,
}

impl Snake {
    /// Creates a freshly joined snake with a placeholder body. The server
    /// places it with the spawn search before it is ever broadcast.
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            body: vec![Vector2D::ZERO, Vector2D::ZERO],
            direction: Direction::Right.to_vector(),
            score: 0,
            died: false,
            alive: true,
            disconnected: false,
            joined: true,
            respawn_counter: 0,
            growth_counter: 0,
        }
    }

    pub fn head(&self) -> Vector2D {
        self.body[self.body.len() - 1]
    }

    /// The point right behind the head.
    pub fn neck(&self) -> Vector2D {
        self.body[self.body.len() - 2]
    }

    pub fn tail(&self) -> Vector2D {
        self.body[0]
    }

    pub fn heading(&self) -> Option<Direction> {
        Direction::from_vector(self.direction)
    }

    /// Direction the head segment was laid down in, if it has any length.
    pub fn head_segment_direction(&self) -> Option<Direction> {
        segment_direction(self.neck(), self.head())
    }

    /// Iterates over consecutive body point pairs from tail to head.
    pub fn segments(&self) -> impl DoubleEndedIterator<Item = (Vector2D, Vector2D)> + '_ {
        self.body.windows(2).map(|w| (w[0], w[1]))
    }

    /// Total length of the polyline, including any wrap jumps.
    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| a.distance(&b)).sum()
    }
}

/// A collectible item. Consumed powerups keep their id and are recycled by
/// the spawner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Powerup {
    #[serde(rename = "power")]
    pub id: u32,
    #[serde(rename = "loc")]
    pub location: Vector2D,
    #[serde(rename = "died")]
    pub consumed: bool,
}

impl Powerup {
    pub fn new(id: u32, location: Vector2D) -> Self {
        Self {
            id,
            location,
            consumed: false,
        }
    }
}

/// A static horizontal or vertical obstacle, loaded once from settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    #[serde(rename = "wall")]
    pub id: u32,
    pub p1: Vector2D,
    pub p2: Vector2D,
}

impl Wall {
    pub fn new(id: u32, p1: Vector2D, p2: Vector2D) -> Self {
        Self { id, p1, p2 }
    }

    /// Walls must be strictly horizontal or vertical.
    pub fn is_axis_aligned(&self) -> bool {
        self.p1.x == self.p2.x || self.p1.y == self.p2.y
    }
}
