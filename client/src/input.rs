//! Autopilot input for the headless client.
//!
//! Looks a short distance ahead of the head and turns away from walls and
//! living snakes. Every few ticks it also turns at random so the bot
//! wanders around the world instead of circling.

use crate::controller::direction_key;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{spans_world_edge, Direction, Rect, Snake, World, SNAKE_RADIUS, WALL_WIDTH};

/// How far ahead of the head the autopilot checks for obstacles
const LOOKAHEAD: f64 = 60.0;

pub struct InputManager {
    rng: StdRng,
    /// Ticks between random turns
    turn_every: u32,
    ticks_since_turn: u32,
}

impl InputManager {
    pub fn new(turn_every: u32) -> Self {
        Self::with_rng(turn_every, StdRng::from_entropy())
    }

    pub fn with_rng(turn_every: u32, rng: StdRng) -> Self {
        Self {
            rng,
            turn_every: turn_every.max(1),
            ticks_since_turn: 0,
        }
    }

    /// Picks the key to press this tick, if any.
    pub fn decide(&mut self, world: &World, me: &Snake) -> Option<char> {
        if !me.alive {
            return None;
        }
        let heading = me.heading()?;
        self.ticks_since_turn += 1;

        let sides = perpendicular(heading);
        if blocked_ahead(world, me, heading) {
            let open: Vec<Direction> = sides
                .into_iter()
                .filter(|d| !blocked_ahead(world, me, *d))
                .collect();
            let choice = if open.is_empty() {
                sides[self.rng.gen_range(0..sides.len())]
            } else {
                open[self.rng.gen_range(0..open.len())]
            };
            self.ticks_since_turn = 0;
            return Some(direction_key(choice));
        }

        if self.ticks_since_turn >= self.turn_every {
            self.ticks_since_turn = 0;
            let choice = sides[self.rng.gen_range(0..sides.len())];
            if !blocked_ahead(world, me, choice) {
                return Some(direction_key(choice));
            }
        }
        None
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new(40)
    }
}

fn perpendicular(direction: Direction) -> [Direction; 2] {
    match direction {
        Direction::Up | Direction::Down => [Direction::Left, Direction::Right],
        Direction::Left | Direction::Right => [Direction::Up, Direction::Down],
    }
}

/// True if moving `LOOKAHEAD` units along `direction` would run into a wall
/// or another living snake.
fn blocked_ahead(world: &World, me: &Snake, direction: Direction) -> bool {
    let head = me.head();
    let lane = Rect::around(
        head + direction.to_vector() * SNAKE_RADIUS * 2.0,
        head + direction.to_vector() * LOOKAHEAD,
        SNAKE_RADIUS,
    );

    let wall_hit = world
        .walls
        .values()
        .any(|wall| Rect::around(wall.p1, wall.p2, WALL_WIDTH / 2.0).overlaps(&lane));
    if wall_hit {
        return true;
    }

    let size = world.size as f64;
    world
        .snakes
        .values()
        .filter(|other| other.alive && other.id != me.id)
        .flat_map(|other| other.segments())
        .filter(|(a, b)| !spans_world_edge(*a, *b, size))
        .any(|(a, b)| Rect::around(a, b, SNAKE_RADIUS).overlaps(&lane))
}
