//! Per-tick snake simulation: respawn, pickups, movement, growth and death.

use crate::collision::{head_reaches_powerup, Obstacles};
use crate::settings::GameSettings;
use crate::spawn;
use crate::world::{PowerupPool, SnakeMap};
use rand::Rng;
use shared::{spans_world_edge, Direction, Rect, Snake, Vector2D, SNAKE_RADIUS};

/// Advances every snake by one tick.
///
/// Disconnected snakes are dropped first. The rest are visited in id order;
/// each one is taken out of the map while it moves so the others can be
/// borrowed as obstacles.
pub fn update_snakes<R: Rng>(
    snakes: &mut SnakeMap,
    powerups: &mut PowerupPool,
    settings: &GameSettings,
    rng: &mut R,
) {
    snakes.retain(|_, snake| !snake.disconnected);

    let ids: Vec<u32> = snakes.keys().copied().collect();
    for id in ids {
        if let Some(mut snake) = snakes.remove(&id) {
            update_snake(&mut snake, snakes, powerups, settings, rng);
            snakes.insert(id, snake);
        }
    }
}

/// Runs one tick for a single snake. `others` must not contain it.
pub fn update_snake<R: Rng>(
    snake: &mut Snake,
    others: &SnakeMap,
    powerups: &mut PowerupPool,
    settings: &GameSettings,
    rng: &mut R,
) {
    snake.joined = false;
    snake.died = false;

    if !snake.alive {
        if snake.respawn_counter < settings.respawn_rate {
            snake.respawn_counter += 1;
            return;
        }
        respawn(snake, others, powerups, settings, rng);
    }

    let head = snake.head();
    let eaten: Vec<u32> = powerups
        .iter()
        .filter(|p| head_reaches_powerup(head, p))
        .map(|p| p.id)
        .collect();
    for id in eaten {
        if powerups.consume(id) {
            snake.score += 1;
            snake.growth_counter = 1;
        }
    }

    advance(snake, settings);

    let obstacles = Obstacles::new(&settings.walls, others, settings.world_size());
    if hits_obstacle(snake, &obstacles) || self_collision(snake, settings.world_size()) {
        snake.alive = false;
        snake.died = true;
        snake.score = 0;
    }
}

fn respawn<R: Rng>(
    snake: &mut Snake,
    others: &SnakeMap,
    powerups: &PowerupPool,
    settings: &GameSettings,
    rng: &mut R,
) {
    let obstacles = Obstacles::new(&settings.walls, others, settings.world_size());
    let placement = spawn::place_snake(settings, &obstacles, powerups, snake.id, rng);

    snake.body = placement.body;
    snake.direction = placement.direction;
    snake.alive = true;
    snake.respawn_counter = 0;
    snake.growth_counter = 0;
}

/// Applies a movement directive, refusing turns that would fold the snake
/// back onto itself. Returns whether the direction was taken.
pub fn apply_direction(snake: &mut Snake, direction: Direction) -> bool {
    if !snake.alive {
        return false;
    }

    let wanted = direction.to_vector();
    if snake.direction.is_opposite_cardinal(&wanted) {
        return false;
    }

    let len = snake.body.len();
    if len >= 3 {
        let previous = (snake.body[len - 2] - snake.body[len - 3]).normalize();
        if previous.is_opposite_cardinal(&wanted)
            && snake.neck().distance(&snake.head()) <= 2.0 * SNAKE_RADIUS
        {
            return false;
        }
    }

    snake.direction = wanted;
    true
}

/// Moves the head one step, wraps it across the world edge if needed and
/// then grows or shrinks the tail.
pub fn advance(snake: &mut Snake, settings: &GameSettings) {
    let velocity = snake.direction * settings.speed();
    let head = snake.head();
    let new_head = head + velocity;

    match (snake.head_segment_direction(), snake.heading()) {
        (Some(laid), Some(heading)) if laid == heading => {
            let last = snake.body.len() - 1;
            snake.body[last] = new_head;
        }
        _ => snake.body.push(new_head),
    }

    wrap_head(snake, settings.half_size());

    if snake.growth_counter >= settings.snake_growth {
        snake.growth_counter = 0;
    } else if snake.growth_counter > 0 {
        snake.growth_counter += 1;
    } else {
        shrink_tail(snake, settings.speed(), settings.world_size());
    }
}

/// Once the head is past an edge, continue the body from the opposite edge.
fn wrap_head(snake: &mut Snake, half: f64) {
    let head = snake.head();
    if head.x.abs() > half {
        snake.body.push(Vector2D::new(-half * head.x.signum(), head.y));
    } else if head.y.abs() > half {
        snake.body.push(Vector2D::new(head.x, -half * head.y.signum()));
    }
}

/// Pulls the tail `distance` units towards the head, dropping tail points
/// as they reach the next one. Never leaves fewer than two points.
pub fn shrink_tail(snake: &mut Snake, distance: f64, world_size: f64) {
    let mut remaining = distance;

    while remaining > 0.0 && snake.body.len() >= 2 {
        let tail = snake.body[0];
        let next = snake.body[1];

        if spans_world_edge(tail, next, world_size) && snake.body.len() > 2 {
            snake.body.remove(0);
            continue;
        }

        let gap = tail.distance(&next);
        if remaining < gap {
            snake.body[0] = tail + (next - tail).normalize() * remaining;
            return;
        }

        remaining -= gap;
        if snake.body.len() > 2 {
            snake.body.remove(0);
        } else {
            snake.body[0] = next;
            return;
        }
    }
}

/// The head segment tested against obstacles. Right after a wrap it is the
/// jump across the world, so only the head point itself counts.
fn head_box_points(snake: &Snake, world_size: f64) -> (Vector2D, Vector2D) {
    let (neck, head) = (snake.neck(), snake.head());
    if spans_world_edge(neck, head, world_size) {
        (head, head)
    } else {
        (neck, head)
    }
}

fn hits_obstacle(snake: &Snake, obstacles: &Obstacles<'_>) -> bool {
    let (a, b) = head_box_points(snake, obstacles.world_size);
    obstacles.death_collision(a, b, Some(snake.id), SNAKE_RADIUS)
}

/// True if the head runs into the snake's own body.
///
/// Walking back from the head, nothing is tested until a segment points
/// exactly against the current direction; from that segment on every
/// segment is tested against the head.
pub fn self_collision(snake: &Snake, world_size: f64) -> bool {
    let (a, b) = head_box_points(snake, world_size);
    let head_box = Rect::around(a, b, SNAKE_RADIUS);
    let mut armed = false;

    for (from, to) in snake.segments().rev() {
        if spans_world_edge(from, to, world_size) {
            continue;
        }
        if !armed {
            armed = (to - from).normalize().is_opposite_cardinal(&snake.direction);
        }
        if armed && Rect::around(from, to, SNAKE_RADIUS).overlaps(&head_box) {
            return true;
        }
    }
    false
}
