//! The fixed-rate game loop.
//!
//! Each tick applies the commands queued by connection tasks, broadcasts
//! the state left by the previous tick, advances the world and finally
//! admits players whose name arrived since the last tick. A player who left
//! is therefore broadcast once with `dc` set before the update removes it.

use crate::client_manager::{ClientManager, Session};
use crate::network::{GameCommand, Outbound};
use crate::world::WorldStore;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::Direction;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{interval, MissedTickBehavior};

/// Notifications about players coming and going. Observers are called in
/// registration order, on the loop task, before the tick continues.
pub trait GameObserver: Send + Sync {
    fn player_joined(&self, _id: u32, _name: &str) {}
    fn player_left(&self, _id: u32, _name: &str) {}
    fn connection_error(&self, _id: u32, _message: &str) {}
}

/// Writes every notification to the log.
pub struct LogObserver;

impl GameObserver for LogObserver {
    fn player_joined(&self, id: u32, name: &str) {
        info!("Player {} ({}) joined", id, name);
    }

    fn player_left(&self, id: u32, name: &str) {
        info!("Player {} ({}) left", id, name);
    }

    fn connection_error(&self, id: u32, message: &str) {
        warn!("Connection error for player {}: {}", id, message);
    }
}

struct PendingJoin {
    id: u32,
    name: String,
    addr: SocketAddr,
    outbound: mpsc::UnboundedSender<Outbound>,
}

pub struct GameLoop {
    world: Arc<WorldStore>,
    clients: Arc<Mutex<ClientManager>>,
    commands: mpsc::UnboundedReceiver<GameCommand>,
    observers: Vec<Box<dyn GameObserver>>,
    rng: StdRng,
    tick: u64,
}

impl GameLoop {
    pub fn new(
        world: Arc<WorldStore>,
        max_clients: usize,
        commands: mpsc::UnboundedReceiver<GameCommand>,
    ) -> Self {
        Self {
            world,
            clients: Arc::new(Mutex::new(ClientManager::new(max_clients))),
            commands,
            observers: Vec::new(),
            rng: StdRng::from_entropy(),
            tick: 0,
        }
    }

    /// Replaces the random source, for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn add_observer(&mut self, observer: Box<dyn GameObserver>) {
        self.observers.push(observer);
    }

    pub fn world(&self) -> Arc<WorldStore> {
        Arc::clone(&self.world)
    }

    pub fn clients(&self) -> Arc<Mutex<ClientManager>> {
        Arc::clone(&self.clients)
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Runs one full tick.
    pub async fn tick(&mut self) {
        let joins = self.drain_commands().await;

        let frames_per_shot = self.world.settings().frames_per_shot.max(1) as u64;
        if self.tick % frames_per_shot == 0 {
            self.broadcast().await;
        }

        self.world.update(&mut self.rng).await;
        for join in joins {
            self.admit(join).await;
        }

        self.tick += 1;
    }

    /// Ticks forever at the configured frame time.
    pub async fn run(mut self) {
        let period = self.world.settings().tick_duration();
        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Skip the first tick since it fires immediately
        timer.tick().await;
        info!("Game loop running every {:?}", period);

        loop {
            timer.tick().await;
            self.tick().await;

            if self.tick % 60 == 0 {
                let sessions = self.clients.lock().await.len();
                debug!(
                    "Tick {}: {} sessions, {} snakes, {} live powerups",
                    self.tick,
                    sessions,
                    self.world.snake_count().await,
                    self.world.live_powerups().await
                );
            }
        }
    }

    async fn broadcast(&mut self) {
        let snapshot = self.world.snapshot().await;
        if snapshot.is_empty() {
            return;
        }

        let snapshot = Outbound::from(snapshot);
        let failed = self.clients.lock().await.broadcast(&snapshot);
        for id in failed {
            self.drop_session(id, Some("send failed")).await;
        }
    }

    /// Applies queued commands. Only the latest directive per player in a
    /// tick counts. Returns the joins to admit after the world update.
    async fn drain_commands(&mut self) -> Vec<PendingJoin> {
        let mut joins: Vec<PendingJoin> = Vec::new();
        let mut moves: BTreeMap<u32, Direction> = BTreeMap::new();

        while let Ok(command) = self.commands.try_recv() {
            match command {
                GameCommand::Join {
                    id,
                    name,
                    addr,
                    outbound,
                } => joins.push(PendingJoin {
                    id,
                    name,
                    addr,
                    outbound,
                }),
                GameCommand::Move { id, direction } => {
                    moves.insert(id, direction);
                }
                GameCommand::Disconnect { id, error } => {
                    joins.retain(|join| join.id != id);
                    moves.remove(&id);
                    self.drop_session(id, error.as_deref()).await;
                }
            }
        }

        for (id, direction) in moves {
            self.world.steer(id, direction).await;
        }
        joins
    }

    async fn admit(&mut self, join: PendingJoin) {
        if !self.clients.lock().await.has_capacity() {
            warn!(
                "Rejecting {} ({}) from {}: server full",
                join.id, join.name, join.addr
            );
            // Dropping the outbound sender closes the connection.
            return;
        }

        self.world.spawn_snake(join.id, &join.name, &mut self.rng).await;

        let delivered = self
            .world
            .handshake(join.id)
            .into_iter()
            .all(|line| join.outbound.send(Outbound::from(line)).is_ok());
        if !delivered {
            self.world.mark_disconnected(join.id).await;
            return;
        }

        let session = Session::new(join.id, join.name.clone(), join.addr, join.outbound);
        if self.clients.lock().await.add(session).is_err() {
            self.world.mark_disconnected(join.id).await;
            return;
        }

        for observer in &self.observers {
            observer.player_joined(join.id, &join.name);
        }
    }

    /// Forgets a session and flags its snake for removal.
    async fn drop_session(&mut self, id: u32, error: Option<&str>) {
        let session = self.clients.lock().await.remove(id);
        let snake_name = self.world.mark_disconnected(id).await;

        let Some(session) = session else {
            return;
        };
        let name = snake_name.unwrap_or(session.name);

        if let Some(message) = error {
            for observer in &self.observers {
                observer.connection_error(id, message);
            }
        }
        for observer in &self.observers {
            observer.player_left(id, &name);
        }
    }
}
