//! Plain data view of a game world, keyed by entity id.

use crate::model::{Powerup, Snake, Wall};
use std::collections::HashMap;

/// A `size x size` square world centered at the origin.
#[derive(Debug, Clone, Default)]
pub struct World {
    pub size: u32,
    pub snakes: HashMap<u32, Snake>,
    pub powerups: HashMap<u32, Powerup>,
    pub walls: HashMap<u32, Wall>,
}

impl World {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn half_size(&self) -> f64 {
        self.size as f64 / 2.0
    }

    pub fn snake(&self, id: u32) -> Option<&Snake> {
        self.snakes.get(&id)
    }

    /// Inserts or replaces a snake, returning the previous record.
    pub fn upsert_snake(&mut self, snake: Snake) -> Option<Snake> {
        self.snakes.insert(snake.id, snake)
    }

    pub fn remove_snake(&mut self, id: u32) -> Option<Snake> {
        self.snakes.remove(&id)
    }

    pub fn upsert_powerup(&mut self, powerup: Powerup) -> Option<Powerup> {
        self.powerups.insert(powerup.id, powerup)
    }

    pub fn remove_powerup(&mut self, id: u32) -> Option<Powerup> {
        self.powerups.remove(&id)
    }

    pub fn add_wall(&mut self, wall: Wall) {
        self.walls.insert(wall.id, wall);
    }

    pub fn has_entities(&self) -> bool {
        !self.snakes.is_empty() || !self.powerups.is_empty()
    }
}
