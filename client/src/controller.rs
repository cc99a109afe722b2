//! Client-side protocol state machine.
//!
//! The controller is fed raw bytes as they arrive. It expects the player id
//! first, then the world size, and from then on keeps a `World` mirror up to
//! date with every wall, snake and powerup record. Interested parties
//! register a `ControllerObserver` to hear about it.

use log::{debug, warn};
use shared::{
    decode_scalar, decode_server_record, encode_move, Direction, LineBuffer, ServerRecord, Snake,
    World,
};

/// Events raised by the controller. Observers run synchronously, in the
/// order they were added.
pub trait ControllerObserver: Send + Sync {
    fn connected(&self) {}
    fn dimensions_received(&self, _size: u32) {}
    fn player_connected(&self, _name: &str) {}
    fn player_disconnected(&self, _name: &str) {}
    fn update_received(&self) {}
    fn network_error(&self, _message: &str) {}
}

/// Maps a movement key to the direction it requests.
pub fn key_direction(key: char) -> Option<Direction> {
    match key.to_ascii_lowercase() {
        'w' => Some(Direction::Up),
        'a' => Some(Direction::Left),
        's' => Some(Direction::Down),
        'd' => Some(Direction::Right),
        _ => None,
    }
}

/// The key that requests a direction.
pub fn direction_key(direction: Direction) -> char {
    match direction {
        Direction::Up => 'w',
        Direction::Left => 'a',
        Direction::Down => 's',
        Direction::Right => 'd',
    }
}

#[derive(Default)]
pub struct GameController {
    buffer: LineBuffer,
    player_id: Option<u32>,
    world: Option<World>,
    observers: Vec<Box<dyn ControllerObserver>>,
    updates: u64,
}

impl GameController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_observer(&mut self, observer: Box<dyn ControllerObserver>) {
        self.observers.push(observer);
    }

    pub fn player_id(&self) -> Option<u32> {
        self.player_id
    }

    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    /// The local player's snake, once the server has sent it.
    pub fn player_snake(&self) -> Option<&Snake> {
        self.world.as_ref()?.snake(self.player_id?)
    }

    /// Number of update batches processed since the world arrived.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Called once the transport is up. Returns the first line to send.
    pub fn handle_connected(&mut self, name: &str) -> String {
        for observer in &self.observers {
            observer.connected();
        }
        format!("{}\n", name)
    }

    pub fn handle_error(&mut self, message: &str) {
        warn!("Network error: {}", message);
        for observer in &self.observers {
            observer.network_error(message);
        }
    }

    /// Consumes a received chunk. Records split across chunks are kept
    /// until the rest arrives. Returns the number of records applied.
    pub fn receive(&mut self, chunk: &[u8]) -> usize {
        if let Err(e) = self.buffer.push(chunk) {
            self.buffer.clear();
            self.handle_error(&e.to_string());
            return 0;
        }

        let mut applied = 0;
        while let Some(line) = self.buffer.next_line() {
            if self.apply_line(&line) {
                applied += 1;
            }
        }

        if applied > 0 && self.world.is_some() {
            self.updates += 1;
            for observer in &self.observers {
                observer.update_received();
            }
        }
        applied
    }

    fn apply_line(&mut self, line: &str) -> bool {
        if self.player_id.is_none() {
            return match decode_scalar(line) {
                Ok(id) if id >= 0 => {
                    debug!("Assigned player id {}", id);
                    self.player_id = Some(id as u32);
                    true
                }
                _ => {
                    warn!("Expected player id, discarding {:?}", line);
                    false
                }
            };
        }

        let world = match self.world.as_mut() {
            Some(world) => world,
            None => {
                return match decode_scalar(line) {
                    Ok(size) if size > 0 => {
                        self.world = Some(World::new(size as u32));
                        for observer in &self.observers {
                            observer.dimensions_received(size as u32);
                        }
                        true
                    }
                    _ => {
                        warn!("Expected world size, discarding {:?}", line);
                        false
                    }
                };
            }
        };

        let record = match decode_server_record(line) {
            Ok(record) => record,
            Err(e) => {
                warn!("Discarding malformed record: {}", e);
                return false;
            }
        };

        match record {
            ServerRecord::Scalar(value) => {
                warn!("Unexpected integer record {}", value);
                return false;
            }
            ServerRecord::Wall(wall) => world.add_wall(wall),
            ServerRecord::Powerup(powerup) => {
                if powerup.consumed {
                    world.remove_powerup(powerup.id);
                } else {
                    world.upsert_powerup(powerup);
                }
            }
            ServerRecord::Snake(snake) => {
                if snake.disconnected {
                    world.remove_snake(snake.id);
                    for observer in &self.observers {
                        observer.player_disconnected(&snake.name);
                    }
                } else {
                    if snake.joined {
                        for observer in &self.observers {
                            observer.player_connected(&snake.name);
                        }
                    }
                    world.upsert_snake(snake);
                }
            }
        }
        true
    }

    /// Turns a movement key into a directive for the server. Nothing is
    /// sent before the world has any snakes or powerups in it.
    pub fn move_command(&self, key: char) -> Option<String> {
        let direction = key_direction(key)?;
        self.direction_command(direction)
    }

    pub fn direction_command(&self, direction: Direction) -> Option<String> {
        if !self.world.as_ref()?.has_entities() {
            return None;
        }
        Some(encode_move(direction))
    }
}
