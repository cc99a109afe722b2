//! Randomised, collision-free placement of snakes and powerups.
//!
//! Both searches resample until a valid spot turns up. They never give up,
//! so a world packed with walls can keep the tick busy; a warning is logged
//! every `WARN_EVERY` failed attempts.

use crate::collision::{powerup_crowded, segment_hits_powerup, Obstacles};
use crate::settings::GameSettings;
use crate::world::PowerupPool;
use log::warn;
use rand::Rng;
use shared::{Direction, Vector2D, POWERUP_WIDTH, SNAKE_RADIUS, SPAWN_EDGE_MARGIN};

const WARN_EVERY: u64 = 10_000;

/// A valid starting pose for a snake: tail first, head last.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub body: Vec<Vector2D>,
    pub direction: Vector2D,
}

/// Picks a random whole-unit point with both coordinates in `[-limit, limit]`.
fn random_point<R: Rng>(rng: &mut R, limit: f64) -> Vector2D {
    let bound = limit.floor().max(0.0) as i64;
    Vector2D::new(
        rng.gen_range(-bound..=bound) as f64,
        rng.gen_range(-bound..=bound) as f64,
    )
}

/// Finds a straight starting body for snake `id` that touches no wall, no
/// living snake, no live powerup, and keeps clear of the world edge.
pub fn place_snake<R: Rng>(
    settings: &GameSettings,
    obstacles: &Obstacles<'_>,
    powerups: &PowerupPool,
    id: u32,
    rng: &mut R,
) -> Placement {
    let limit = settings.half_size() - SPAWN_EDGE_MARGIN;
    let length = settings.snake_start_length as f64;
    let mut attempts: u64 = 0;

    loop {
        attempts += 1;

        let direction = Direction::ALL[rng.gen_range(0..Direction::ALL.len())].to_vector();
        let tail = random_point(rng, limit);
        let head = tail + direction * length;

        let inside = [tail, head]
            .iter()
            .all(|p| p.x.abs() <= limit && p.y.abs() <= limit);

        if inside
            && !obstacles.death_collision(tail, head, Some(id), SNAKE_RADIUS)
            && !segment_hits_powerup(tail, direction, length, powerups.iter())
        {
            return Placement {
                body: vec![tail, head],
                direction,
            };
        }

        if attempts % WARN_EVERY == 0 {
            warn!(
                "Still searching for a spawn point for snake {} after {} attempts",
                id, attempts
            );
        }
    }
}

/// Finds a location for powerup `id` clear of walls, living snakes and the
/// other live powerups.
pub fn place_powerup<R: Rng>(
    settings: &GameSettings,
    obstacles: &Obstacles<'_>,
    powerups: &PowerupPool,
    id: u32,
    rng: &mut R,
) -> Vector2D {
    let limit = settings.half_size() - SPAWN_EDGE_MARGIN;
    let mut attempts: u64 = 0;

    loop {
        attempts += 1;

        let location = random_point(rng, limit);
        if !obstacles.death_collision(location, location, None, POWERUP_WIDTH / 2.0)
            && !powerup_crowded(location, id, powerups.iter())
        {
            return location;
        }

        if attempts % WARN_EVERY == 0 {
            warn!(
                "Still searching for a location for powerup {} after {} attempts",
                id, attempts
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::SnakeMap;
    use rand::{rngs::StdRng, SeedableRng};
    use shared::{Rect, Snake, Wall, WALL_WIDTH};

    fn crowded_settings() -> GameSettings {
        GameSettings {
            universe_size: 600,
            walls: vec![
                Wall::new(1, Vector2D::new(-200.0, 0.0), Vector2D::new(200.0, 0.0)),
                Wall::new(2, Vector2D::new(0.0, -250.0), Vector2D::new(0.0, -60.0)),
                Wall::new(3, Vector2D::new(150.0, 80.0), Vector2D::new(150.0, 250.0)),
            ],
            ..GameSettings::default()
        }
    }

    #[test]
    fn test_snake_placement_avoids_walls_snakes_and_edges() {
        let settings = crowded_settings();
        let limit = settings.half_size() - SPAWN_EDGE_MARGIN;

        for seed in 0..40 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut snakes = SnakeMap::new();
            let pool = PowerupPool::new(0);

            for id in 1..=4 {
                let obstacles = Obstacles::new(&settings.walls, &snakes, settings.world_size());
                let placement = place_snake(&settings, &obstacles, &pool, id, &mut rng);

                let tail = placement.body[0];
                let head = placement.body[1];
                assert_eq!(head.distance(&tail), settings.snake_start_length as f64);
                assert!(placement.direction.is_cardinal());
                for p in [tail, head] {
                    assert!(p.x.abs() <= limit && p.y.abs() <= limit);
                }

                let body_box = Rect::around(tail, head, SNAKE_RADIUS);
                for wall in &settings.walls {
                    assert!(!Rect::around(wall.p1, wall.p2, WALL_WIDTH / 2.0).overlaps(&body_box));
                }
                for other in snakes.values() {
                    for (p, q) in other.segments() {
                        assert!(!Rect::around(p, q, SNAKE_RADIUS).overlaps(&body_box));
                    }
                }

                let mut snake = Snake::new(id, "spawned");
                snake.body = placement.body;
                snake.direction = placement.direction;
                snakes.insert(id, snake);
            }
        }
    }

    #[test]
    fn test_snake_placement_avoids_powerups() {
        let settings = GameSettings {
            universe_size: 400,
            ..GameSettings::default()
        };
        let mut pool = PowerupPool::new(0);
        for (i, x) in (-180..=180).step_by(40).enumerate() {
            for y in [-90.0, 0.0, 90.0] {
                let id = pool.allocate();
                pool.place(id, Vector2D::new(x as f64, y + i as f64 % 2.0));
            }
        }
        let snakes = SnakeMap::new();
        let obstacles = Obstacles::new(&settings.walls, &snakes, settings.world_size());
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..20 {
            let placement = place_snake(&settings, &obstacles, &pool, 1, &mut rng);
            assert!(!segment_hits_powerup(
                placement.body[0],
                placement.direction,
                settings.snake_start_length as f64,
                pool.iter()
            ));
        }
    }

    #[test]
    fn test_powerup_placement_keeps_distance() {
        let settings = crowded_settings();
        let snakes = SnakeMap::new();
        let obstacles = Obstacles::new(&settings.walls, &snakes, settings.world_size());
        let mut rng = StdRng::seed_from_u64(9);
        let mut pool = PowerupPool::new(0);

        for _ in 0..30 {
            let id = pool.allocate();
            let location = place_powerup(&settings, &obstacles, &pool, id, &mut rng);
            assert!(!obstacles.death_collision(location, location, None, POWERUP_WIDTH / 2.0));
            assert!(!powerup_crowded(location, id, pool.iter()));
            pool.place(id, location);
        }
    }
}
