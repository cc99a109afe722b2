//! Stateless geometric queries used by the simulation and the spawners.
//!
//! Everything is tested with axis-aligned bounding boxes: a segment's box
//! is the box spanned by its endpoints, inflated by the radius of whatever
//! moves along it.

use crate::world::SnakeMap;
use shared::{
    spans_world_edge, Powerup, Rect, Vector2D, Wall, POWERUP_WIDTH, SNAKE_RADIUS, WALL_WIDTH,
};

/// Everything a moving object can die against.
#[derive(Debug, Clone, Copy)]
pub struct Obstacles<'a> {
    pub walls: &'a [Wall],
    pub snakes: &'a SnakeMap,
    pub world_size: f64,
}

impl<'a> Obstacles<'a> {
    pub fn new(walls: &'a [Wall], snakes: &'a SnakeMap, world_size: f64) -> Self {
        Self {
            walls,
            snakes,
            world_size,
        }
    }

    /// True if the segment `a -> b`, inflated by `radius`, overlaps a wall or
    /// the body of any other living snake.
    pub fn death_collision(
        &self,
        a: Vector2D,
        b: Vector2D,
        exclude: Option<u32>,
        radius: f64,
    ) -> bool {
        let object = Rect::around(a, b, radius);
        self.hits_wall(&object) || self.hits_snake(&object, exclude)
    }

    fn hits_wall(&self, object: &Rect) -> bool {
        self.walls
            .iter()
            .any(|wall| Rect::around(wall.p1, wall.p2, WALL_WIDTH / 2.0).overlaps(object))
    }

    fn hits_snake(&self, object: &Rect, exclude: Option<u32>) -> bool {
        self.snakes
            .values()
            .filter(|other| other.alive && Some(other.id) != exclude)
            .any(|other| {
                other
                    .segments()
                    .filter(|(p, q)| !spans_world_edge(*p, *q, self.world_size))
                    .any(|(p, q)| Rect::around(p, q, SNAKE_RADIUS).overlaps(object))
            })
    }
}

/// Samples the straight segment starting at `tail` along `direction` every
/// powerup width and reports whether any sample is too close to a live
/// powerup.
pub fn segment_hits_powerup<'p>(
    tail: Vector2D,
    direction: Vector2D,
    length: f64,
    powerups: impl IntoIterator<Item = &'p Powerup>,
) -> bool {
    let samples = (length / POWERUP_WIDTH).floor() as usize + 1;
    let reach = POWERUP_WIDTH + SNAKE_RADIUS;

    powerups.into_iter().filter(|p| !p.consumed).any(|powerup| {
        (0..samples).any(|i| {
            let point = tail + direction * (POWERUP_WIDTH * i as f64);
            powerup.location.distance(&point) < reach
        })
    })
}

/// True if a snake head at `head` picks up `powerup`.
pub fn head_reaches_powerup(head: Vector2D, powerup: &Powerup) -> bool {
    !powerup.consumed && powerup.location.distance(&head) < POWERUP_WIDTH / 2.0 + SNAKE_RADIUS
}

/// True if `location` sits within one powerup width of another live powerup.
pub fn powerup_crowded<'p>(
    location: Vector2D,
    exclude: u32,
    powerups: impl IntoIterator<Item = &'p Powerup>,
) -> bool {
    powerups
        .into_iter()
        .filter(|p| p.id != exclude && !p.consumed)
        .any(|p| p.location.distance(&location) <= POWERUP_WIDTH)
}
