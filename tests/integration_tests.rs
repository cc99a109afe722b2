//! End-to-end tests: a real server on a loopback port, driven by raw TCP
//! clients and by the client crate.

use client::controller::GameController;
use client::network::Client;
use serde_json::Value;
use server::client_manager::ClientManager;
use server::game::GameLoop;
use server::network::NetworkServer;
use server::settings::GameSettings;
use server::world::WorldStore;
use shared::{Direction, Vector2D, Wall};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn fast_settings() -> GameSettings {
    GameSettings {
        ms_per_frame: 5,
        universe_size: 1000,
        max_powerups: 5,
        max_powerup_delay: 10,
        walls: vec![Wall::new(
            1,
            Vector2D::new(-400.0, 450.0),
            Vector2D::new(400.0, 450.0),
        )],
        ..GameSettings::default()
    }
}

/// No walls, so a freshly spawned snake cannot die while a test steers it.
fn open_settings() -> GameSettings {
    GameSettings {
        walls: Vec::new(),
        ..fast_settings()
    }
}

struct TestServer {
    addr: SocketAddr,
    world: Arc<WorldStore>,
    clients: Arc<Mutex<ClientManager>>,
}

async fn start_server(settings: GameSettings) -> TestServer {
    let world = Arc::new(WorldStore::new(Arc::new(settings)));
    let network = NetworkServer::bind("127.0.0.1:0").await.unwrap();
    let addr = network.local_addr().unwrap();

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let game = GameLoop::new(Arc::clone(&world), 8, cmd_rx).with_seed(11);
    let clients = game.clients();

    tokio::spawn(network.run(cmd_tx));
    tokio::spawn(game.run());

    TestServer {
        addr,
        world,
        clients,
    }
}

/// A client speaking the raw line protocol.
struct RawClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: tokio::net::tcp::OwnedWriteHalf,
}

impl RawClient {
    async fn join(addr: SocketAddr, name: &str) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        writer
            .write_all(format!("{}\n", name).as_bytes())
            .await
            .unwrap();
        Self {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    async fn next_line(&mut self) -> String {
        timeout(WAIT, self.lines.next_line())
            .await
            .expect("timed out waiting for the server")
            .unwrap()
            .expect("server closed the connection")
    }

    async fn next_record(&mut self) -> Value {
        let line = self.next_line().await;
        serde_json::from_str(&line).unwrap()
    }

    /// Reads the id and world size.
    async fn handshake(&mut self) -> (u32, u32) {
        let id = self.next_line().await.trim().parse().unwrap();
        let size = self.next_line().await.trim().parse().unwrap();
        (id, size)
    }

    /// Reads records until one satisfies `pred`.
    async fn wait_for(&mut self, pred: impl Fn(&Value) -> bool) -> Value {
        loop {
            let record = self.next_record().await;
            if pred(&record) {
                return record;
            }
        }
    }
}

fn is_snake(record: &Value, id: u32) -> bool {
    record.get("snake").and_then(Value::as_u64) == Some(id as u64)
}

mod handshake_tests {
    use super::*;

    /// The id and the world size arrive before anything else, then the walls.
    #[tokio::test]
    async fn test_handshake_precedes_entities() {
        let server = start_server(fast_settings()).await;
        let mut client = RawClient::join(server.addr, "Tester").await;

        let (id, size) = client.handshake().await;
        assert!(id > 0);
        assert_eq!(size, 1000);

        let wall = client.next_record().await;
        assert_eq!(wall["wall"], 1);
        assert_eq!(wall["p1"]["X"], -400.0);
        assert_eq!(wall["p2"]["Y"], 450.0);

        let first = client.next_record().await;
        assert!(first.get("snake").is_some() || first.get("power").is_some());
    }

    /// Names are trimmed to the allowed length.
    #[tokio::test]
    async fn test_long_name_is_truncated() {
        let server = start_server(fast_settings()).await;
        let mut client = RawClient::join(server.addr, "AVeryLongPlayerNameIndeed").await;
        let (id, _) = client.handshake().await;

        let me = client.wait_for(|r| is_snake(r, id)).await;
        assert_eq!(me["name"], "AVeryLongPlayerN");
    }
}

mod gameplay_tests {
    use super::*;

    /// A joined player sees its own snake and, soon after, powerups.
    #[tokio::test]
    async fn test_steady_state_records() {
        let server = start_server(fast_settings()).await;
        let mut client = RawClient::join(server.addr, "Tester").await;
        let (id, _) = client.handshake().await;

        let me = client.wait_for(|r| is_snake(r, id)).await;
        assert_eq!(me["name"], "Tester");
        assert_eq!(me["alive"], true);
        assert_eq!(me["dc"], false);
        let body = me["body"].as_array().unwrap();
        assert!(body.len() >= 2);
        for point in body {
            assert!(point["X"].is_number() && point["Y"].is_number());
        }

        let powerup = client.wait_for(|r| r.get("power").is_some()).await;
        assert!(powerup["loc"]["X"].is_number());
        assert!(powerup["died"].is_boolean());
    }

    /// Directives from the wire turn the snake.
    #[tokio::test]
    async fn test_directive_turns_snake() {
        let server = start_server(open_settings()).await;
        let mut client = RawClient::join(server.addr, "Tester").await;
        let (id, _) = client.handshake().await;

        let me = client.wait_for(|r| is_snake(r, id)).await;
        let heading = Direction::from_vector(Vector2D::new(
            me["dir"]["X"].as_f64().unwrap(),
            me["dir"]["Y"].as_f64().unwrap(),
        ))
        .unwrap();
        let turn = match heading {
            Direction::Up | Direction::Down => Direction::Left,
            Direction::Left | Direction::Right => Direction::Up,
        };

        client
            .writer
            .write_all(shared::encode_move(turn).as_bytes())
            .await
            .unwrap();

        let target = turn.to_vector();
        client
            .wait_for(|r| {
                is_snake(r, id)
                    && r["dir"]["X"].as_f64() == Some(target.x)
                    && r["dir"]["Y"].as_f64() == Some(target.y)
            })
            .await;
    }

    /// A player who leaves is broadcast once with `dc` and then removed.
    #[tokio::test]
    async fn test_disconnect_cleanup() {
        let server = start_server(fast_settings()).await;
        let mut stayer = RawClient::join(server.addr, "Stayer").await;
        stayer.handshake().await;

        let mut leaver = RawClient::join(server.addr, "Leaver").await;
        let (leaver_id, _) = leaver.handshake().await;
        stayer.wait_for(|r| is_snake(r, leaver_id)).await;
        drop(leaver);

        let gone = stayer
            .wait_for(|r| is_snake(r, leaver_id) && r["dc"] == true)
            .await;
        assert_eq!(gone["alive"], false);

        timeout(WAIT, async {
            while server.world.snake(leaver_id).await.is_some() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("snake was never removed");
        assert_eq!(server.clients.lock().await.len(), 1);
    }

    /// Players beyond the capacity are never admitted.
    #[tokio::test]
    async fn test_capacity_limit() {
        let world = Arc::new(WorldStore::new(Arc::new(fast_settings())));
        let network = NetworkServer::bind("127.0.0.1:0").await.unwrap();
        let addr = network.local_addr().unwrap();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let game = GameLoop::new(Arc::clone(&world), 1, cmd_rx);
        tokio::spawn(network.run(cmd_tx));
        tokio::spawn(game.run());

        let mut first = RawClient::join(addr, "First").await;
        first.handshake().await;

        let mut second = RawClient::join(addr, "Second").await;
        let line = timeout(WAIT, second.lines.next_line())
            .await
            .expect("server kept the connection open");
        assert!(matches!(line, Ok(None) | Err(_)));
        assert_eq!(world.snake_count().await, 1);
    }
}

mod client_tests {
    use super::*;

    async fn poll_until(client: &mut Client, pred: impl Fn(&GameController) -> bool) {
        timeout(WAIT, async {
            while !pred(client.controller()) {
                client.poll().await.unwrap();
            }
        })
        .await
        .expect("timed out polling the server");
    }

    /// The client crate completes the handshake and mirrors its own snake.
    #[tokio::test]
    async fn test_client_mirrors_world() {
        let server = start_server(fast_settings()).await;
        let mut client = Client::connect(&server.addr.to_string(), "Tester", GameController::new())
            .await
            .unwrap();

        poll_until(&mut client, |c| c.player_snake().is_some()).await;

        let controller = client.controller();
        let world = controller.world().unwrap();
        assert_eq!(world.size, 1000);
        assert_eq!(world.walls.len(), 1);
        assert_eq!(controller.player_snake().unwrap().name, "Tester");
    }

    /// Keys sent through the client steer the server-side snake.
    #[tokio::test]
    async fn test_client_steers_snake() {
        let server = start_server(open_settings()).await;
        let mut client = Client::connect(&server.addr.to_string(), "Tester", GameController::new())
            .await
            .unwrap();
        poll_until(&mut client, |c| c.player_snake().is_some()).await;

        let heading = client.controller().player_snake().unwrap().heading().unwrap();
        let turn = match heading {
            Direction::Up | Direction::Down => Direction::Right,
            Direction::Left | Direction::Right => Direction::Down,
        };
        assert!(client.send_direction(turn).await.unwrap());

        poll_until(&mut client, |c| {
            c.player_snake().and_then(|s| s.heading()) == Some(turn)
        })
        .await;
        let id = client.controller().player_id().unwrap();
        assert_eq!(
            server.world.snake(id).await.unwrap().heading(),
            Some(turn)
        );
    }
}

mod settings_tests {
    use super::*;

    /// The bundled settings file is valid and usable without a runtime.
    #[test]
    fn test_bundled_settings_load() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/settings.json");
        let settings = GameSettings::load(path).unwrap();
        assert!(!settings.walls.is_empty());

        let world = WorldStore::new(Arc::new(settings));
        let handshake = world.handshake(1);
        assert_eq!(handshake.len(), 2 + world.walls().len());

        let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(3);
        let snake = tokio_test::block_on(world.spawn_snake(1, "Tester", &mut rng));
        assert!(snake.alive);
        let snapshot = tokio_test::block_on(world.snapshot());
        assert!(snapshot.starts_with("{\"snake\":1"));
    }
}
