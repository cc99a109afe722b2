//! TCP transport for the line protocol.
//!
//! Every accepted connection gets a reader task and a writer task. The
//! reader turns received bytes into `GameCommand`s for the game loop; the
//! writer drains an outbound queue that the game loop fills. Neither task
//! touches the world.

use log::{debug, error, info, warn};
use shared::{decode_move, decode_player_name, Direction, LineBuffer, MAX_NAME_LEN};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// Text queued for one connection. Shared so a broadcast is built once.
pub type Outbound = Arc<str>;

/// Messages sent from connection tasks to the game loop
#[derive(Debug)]
pub enum GameCommand {
    /// The client sent its name; `outbound` feeds its writer task
    Join {
        id: u32,
        name: String,
        addr: SocketAddr,
        outbound: mpsc::UnboundedSender<Outbound>,
    },
    Move {
        id: u32,
        direction: Direction,
    },
    /// The connection is gone. `error` is set for transport failures.
    Disconnect {
        id: u32,
        error: Option<String>,
    },
}

/// Accepts player connections and hands out connection ids.
pub struct NetworkServer {
    listener: TcpListener,
    next_id: AtomicU32,
}

impl NetworkServer {
    pub async fn bind(addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            next_id: AtomicU32::new(1),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until the game loop goes away.
    pub async fn run(self, commands: mpsc::UnboundedSender<GameCommand>) {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    info!("Connection {} accepted from {}", id, addr);

                    let commands = commands.clone();
                    tokio::spawn(async move {
                        handle_connection(stream, addr, id, commands).await;
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }

            if commands.is_closed() {
                info!("Game loop stopped, no longer accepting connections");
                break;
            }
        }
    }
}

/// Longest line a client may send. Names and directives are far shorter.
const MAX_CLIENT_LINE: usize = 4 * 1024;

/// Drives one connection until it closes or fails, then reports it.
///
/// The reader also stops once the writer task ends, which happens when the
/// game loop drops the outbound sender (rejected join, dropped session) or
/// a write fails.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    id: u32,
    commands: mpsc::UnboundedSender<GameCommand>,
) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!("Could not disable Nagle for connection {}: {}", id, e);
    }

    let (mut reader, writer) = stream.into_split();
    let (out_tx, out_rx) = mpsc::unbounded_channel::<Outbound>();
    let mut writer_task = tokio::spawn(write_outbound(writer, out_rx, id));

    // Handed to the game loop with the join; dropping it closes the writer.
    let mut outbound = Some(out_tx);
    let mut buffer = LineBuffer::with_limit(MAX_CLIENT_LINE);
    let mut chunk = [0u8; 4096];

    let error = loop {
        let n = tokio::select! {
            read = reader.read(&mut chunk) => match read {
                Ok(0) => break None,
                Ok(n) => n,
                Err(e) => break Some(e.to_string()),
            },
            written = &mut writer_task => match written {
                Ok(Ok(())) => {
                    debug!("Outbound queue for connection {} closed", id);
                    break None;
                }
                Ok(Err(e)) => break Some(e),
                Err(e) => break Some(e.to_string()),
            },
        };
        if let Err(e) = buffer.push(&chunk[..n]) {
            break Some(e.to_string());
        }

        let mut loop_gone = false;
        while let Some(line) = buffer.next_line() {
            let command = match outbound.take() {
                Some(sender) => GameCommand::Join {
                    id,
                    name: decode_player_name(&line, MAX_NAME_LEN),
                    addr,
                    outbound: sender,
                },
                None => match decode_move(&line) {
                    Ok(direction) => GameCommand::Move { id, direction },
                    Err(e) => {
                        warn!("Discarding record from connection {}: {}", id, e);
                        continue;
                    }
                },
            };

            if commands.send(command).is_err() {
                loop_gone = true;
                break;
            }
        }

        if loop_gone {
            return;
        }
    };

    match &error {
        Some(e) => warn!("Connection {} from {} failed: {}", id, addr, e),
        None => info!("Connection {} from {} closed", id, addr),
    }
    let _ = commands.send(GameCommand::Disconnect { id, error });
}

/// Writes queued records until the queue closes. Returns the write error,
/// if any.
async fn write_outbound(
    mut writer: OwnedWriteHalf,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    id: u32,
) -> Result<(), String> {
    while let Some(text) = outbound.recv().await {
        if let Err(e) = writer.write_all(text.as_bytes()).await {
            warn!("Failed to send to connection {}: {}", id, e);
            return Err(e.to_string());
        }
    }
    let _ = writer.shutdown().await;
    Ok(())
}
