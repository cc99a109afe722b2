//! Raw protocol client: joins the server, optionally steers, and prints the
//! first records it receives.

use clap::Parser;
use shared::{decode_server_record, encode_move, Direction, LineBuffer, ServerRecord};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server address
    #[clap(short, long, default_value = "127.0.0.1:11000")]
    server: String,
    /// Display name to join with
    #[clap(short, long, default_value = "watcher")]
    name: String,
    /// Number of records to print before leaving
    #[clap(short, long, default_value = "20")]
    records: usize,
    /// Direction to request after joining (up, left, down, right)
    #[clap(short, long)]
    direction: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut stream = TcpStream::connect(&args.server).await?;
    println!("Connected to {}", stream.peer_addr()?);
    stream.write_all(format!("{}\n", args.name).as_bytes()).await?;

    if let Some(direction) = &args.direction {
        let direction = match direction.as_str() {
            "up" => Direction::Up,
            "left" => Direction::Left,
            "down" => Direction::Down,
            "right" => Direction::Right,
            other => return Err(format!("unknown direction {}", other).into()),
        };
        stream.write_all(encode_move(direction).as_bytes()).await?;
    }

    let mut buffer = LineBuffer::new();
    let mut chunk = [0u8; 4096];
    let mut printed = 0;

    while printed < args.records {
        let n = match timeout(Duration::from_secs(5), stream.read(&mut chunk)).await {
            Ok(result) => result?,
            Err(_) => {
                println!("No data for 5 seconds, giving up");
                break;
            }
        };
        if n == 0 {
            println!("Server closed the connection");
            break;
        }
        buffer.push(&chunk[..n])?;

        for line in buffer.drain_lines() {
            if printed >= args.records {
                break;
            }
            printed += 1;
            match decode_server_record(&line) {
                Ok(ServerRecord::Scalar(value)) => println!("[{}] scalar {}", printed, value),
                Ok(ServerRecord::Snake(s)) => println!(
                    "[{}] snake {} {:?} head=({}, {}) score={} alive={}",
                    printed,
                    s.id,
                    s.name,
                    s.head().x,
                    s.head().y,
                    s.score,
                    s.alive
                ),
                Ok(ServerRecord::Powerup(p)) => println!(
                    "[{}] powerup {} at ({}, {}) consumed={}",
                    printed, p.id, p.location.x, p.location.y, p.consumed
                ),
                Ok(ServerRecord::Wall(w)) => println!(
                    "[{}] wall {} ({}, {}) -> ({}, {})",
                    printed, w.id, w.p1.x, w.p1.y, w.p2.x, w.p2.y
                ),
                Err(e) => println!("[{}] malformed record {:?}: {}", printed, line, e),
            }
        }
    }

    println!("Test client finished");
    Ok(())
}
