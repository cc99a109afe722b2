//! Timed powerup spawning with id recycling.

use crate::collision::Obstacles;
use crate::settings::GameSettings;
use crate::spawn;
use crate::world::{PowerupPool, SnakeMap};
use log::debug;
use rand::Rng;

/// Runs the spawner for one tick.
///
/// When the delay has elapsed and there is room (a recycled id waiting or
/// fewer powerups than the cap), one powerup is brought in and a new random
/// delay in `[0, max_powerup_delay)` starts. Otherwise the delay counter
/// advances. Returns the id placed this tick, if any.
pub fn spawn_tick<R: Rng>(
    snakes: &SnakeMap,
    pool: &mut PowerupPool,
    settings: &GameSettings,
    rng: &mut R,
) -> Option<u32> {
    let cap = settings.max_powerups as usize;
    let room = pool.has_recycled() || pool.len() < cap;

    if !room || pool.current_frame < pool.max_frame {
        pool.current_frame = pool.current_frame.saturating_add(1);
        return None;
    }

    pool.current_frame = 0;
    pool.max_frame = if settings.max_powerup_delay == 0 {
        0
    } else {
        rng.gen_range(0..settings.max_powerup_delay)
    };

    let id = if pool.len() < cap {
        pool.allocate()
    } else {
        pool.revive()?
    };

    let obstacles = Obstacles::new(&settings.walls, snakes, settings.world_size());
    let location = spawn::place_powerup(settings, &obstacles, pool, id, rng);
    pool.place(id, location);
    debug!("Powerup {} placed at ({}, {})", id, location.x, location.y);

    Some(id)
}
