//! Authoritative world state shared between the game loop and the tests.
//!
//! Each collection sits behind its own lock. When an operation needs more
//! than one of them it always takes `snakes` before `powerups`, and neither
//! is ever held while waiting on the session registry.

use crate::collision::Obstacles;
use crate::settings::GameSettings;
use crate::{powerup, snake, spawn};
use log::warn;
use rand::Rng;
use shared::{encode_record, encode_scalar, Direction, Powerup, Snake, Vector2D, Wall, WireRecord};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Snakes keyed by id. Ordered so every tick visits them the same way.
pub type SnakeMap = BTreeMap<u32, Snake>;

/// All powerups ever created, with the recycling queue and spawn timer.
#[derive(Debug, Clone)]
pub struct PowerupPool {
    pub(crate) powerups: BTreeMap<u32, Powerup>,
    /// Ids of consumed powerups in the order they were eaten
    pub(crate) dead: VecDeque<u32>,
    pub(crate) current_frame: u32,
    pub(crate) max_frame: u32,
}

impl PowerupPool {
    pub fn new(initial_delay: u32) -> Self {
        Self {
            powerups: BTreeMap::new(),
            dead: VecDeque::new(),
            current_frame: 0,
            max_frame: initial_delay,
        }
    }

    pub fn get(&self, id: u32) -> Option<&Powerup> {
        self.powerups.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Powerup> + '_ {
        self.powerups.values()
    }

    /// Number of ids ever allocated, consumed or not.
    pub fn len(&self) -> usize {
        self.powerups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.powerups.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.powerups.values().filter(|p| !p.consumed).count()
    }

    /// Marks a live powerup as eaten and queues its id for reuse.
    pub fn consume(&mut self, id: u32) -> bool {
        match self.powerups.get_mut(&id) {
            Some(powerup) if !powerup.consumed => {
                powerup.consumed = true;
                self.dead.push_back(id);
                true
            }
            _ => false,
        }
    }

    pub fn has_recycled(&self) -> bool {
        !self.dead.is_empty()
    }

    /// Creates a fresh powerup with the next id. It is live at the origin
    /// until `place` moves it.
    pub fn allocate(&mut self) -> u32 {
        let id = self.powerups.len() as u32 + 1;
        self.powerups.insert(id, Powerup::new(id, Vector2D::ZERO));
        id
    }

    /// Takes the oldest consumed powerup off the queue and brings it back.
    pub fn revive(&mut self) -> Option<u32> {
        let id = self.dead.pop_front()?;
        if let Some(powerup) = self.powerups.get_mut(&id) {
            powerup.consumed = false;
        }
        Some(id)
    }

    pub fn place(&mut self, id: u32, location: Vector2D) {
        if let Some(powerup) = self.powerups.get_mut(&id) {
            powerup.location = location;
            powerup.consumed = false;
        }
    }
}

/// The single shared world of a server process.
///
/// Walls and the world size come from the immutable settings; snakes and
/// powerups are only reachable through the methods below.
pub struct WorldStore {
    settings: Arc<GameSettings>,
    snakes: Mutex<SnakeMap>,
    powerups: Mutex<PowerupPool>,
}

impl WorldStore {
    pub fn new(settings: Arc<GameSettings>) -> Self {
        let powerups = PowerupPool::new(settings.max_powerup_delay);
        Self {
            settings,
            snakes: Mutex::new(SnakeMap::new()),
            powerups: Mutex::new(powerups),
        }
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn size(&self) -> u32 {
        self.settings.universe_size
    }

    pub fn walls(&self) -> &[Wall] {
        &self.settings.walls
    }

    /// Records sent once to a new player: id, world size, then every wall.
    pub fn handshake(&self, id: u32) -> Vec<String> {
        let mut lines = vec![encode_scalar(id as i64), encode_scalar(self.size() as i64)];
        lines.extend(encode_all(self.walls()));
        lines
    }

    /// Creates the snake for a newly joined player at a free spot.
    pub async fn spawn_snake<R: Rng>(&self, id: u32, name: &str, rng: &mut R) -> Snake {
        let mut snakes = self.snakes.lock().await;
        let powerups = self.powerups.lock().await;

        let placement = {
            let obstacles = Obstacles::new(self.walls(), &snakes, self.settings.world_size());
            spawn::place_snake(&self.settings, &obstacles, &powerups, id, rng)
        };

        let mut snake = Snake::new(id, name);
        snake.body = placement.body;
        snake.direction = placement.direction;
        snakes.insert(id, snake.clone());
        snake
    }

    /// Applies a movement directive. Returns false if it was ignored.
    pub async fn steer(&self, id: u32, direction: Direction) -> bool {
        let mut snakes = self.snakes.lock().await;
        match snakes.get_mut(&id) {
            Some(snake) => snake::apply_direction(snake, direction),
            None => false,
        }
    }

    /// Flags a player's snake for removal on the next update.
    pub async fn mark_disconnected(&self, id: u32) -> Option<String> {
        let mut snakes = self.snakes.lock().await;
        let snake = snakes.get_mut(&id)?;
        snake.disconnected = true;
        snake.died = true;
        snake.alive = false;
        Some(snake.name.clone())
    }

    /// Runs one simulation step: every snake, then the powerup spawner.
    pub async fn update<R: Rng>(&self, rng: &mut R) {
        let mut snakes = self.snakes.lock().await;
        let mut powerups = self.powerups.lock().await;

        snake::update_snakes(&mut snakes, &mut powerups, &self.settings, rng);
        powerup::spawn_tick(&snakes, &mut powerups, &self.settings, rng);
    }

    /// Encodes every snake, then every powerup, as one block of records.
    pub async fn snapshot(&self) -> String {
        let mut out = String::new();
        {
            let snakes = self.snakes.lock().await;
            out.extend(encode_all(snakes.values()));
        }
        {
            let powerups = self.powerups.lock().await;
            out.extend(encode_all(powerups.iter()));
        }
        out
    }

    pub async fn snake(&self, id: u32) -> Option<Snake> {
        self.snakes.lock().await.get(&id).cloned()
    }

    pub async fn snakes(&self) -> Vec<Snake> {
        self.snakes.lock().await.values().cloned().collect()
    }

    pub async fn powerups(&self) -> Vec<Powerup> {
        self.powerups.lock().await.iter().cloned().collect()
    }

    pub async fn snake_count(&self) -> usize {
        self.snakes.lock().await.len()
    }

    pub async fn live_powerups(&self) -> usize {
        self.powerups.lock().await.live_count()
    }

    /// Puts a snake into the world as-is, bypassing the spawn search.
    pub async fn insert_snake(&self, snake: Snake) {
        self.snakes.lock().await.insert(snake.id, snake);
    }

    /// Eats a powerup without a snake, queueing it for recycling.
    pub async fn consume_powerup(&self, id: u32) -> bool {
        self.powerups.lock().await.consume(id)
    }
}

fn encode_all<'a, T: WireRecord + 'a>(records: impl IntoIterator<Item = &'a T>) -> Vec<String> {
    records
        .into_iter()
        .filter_map(|record| match encode_record(record) {
            Ok(line) => Some(line),
            Err(e) => {
                warn!("Failed to encode {:?} record: {}", T::KIND, e);
                None
            }
        })
        .collect()
}
