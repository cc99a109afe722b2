//! TCP connection to the game server, feeding a `GameController`.

use crate::controller::GameController;
use log::info;
use shared::Direction;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Client {
    stream: TcpStream,
    controller: GameController,
    chunk: Vec<u8>,
}

impl Client {
    /// Connects, sends the player name and hands back the live client.
    /// Failures are reported to the controller's observers as well.
    pub async fn connect(
        server_addr: &str,
        name: &str,
        mut controller: GameController,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = match timeout(CONNECT_TIMEOUT, TcpStream::connect(server_addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                controller.handle_error(&e.to_string());
                return Err(e.into());
            }
            Err(_) => {
                let message = format!("timed out connecting to {}", server_addr);
                controller.handle_error(&message);
                return Err(message.into());
            }
        };
        stream.set_nodelay(true)?;
        info!("Connected to {}", stream.peer_addr()?);

        let mut client = Self {
            stream,
            controller,
            chunk: vec![0u8; 8192],
        };
        let hello = client.controller.handle_connected(name);
        client.write(&hello).await?;
        Ok(client)
    }

    pub fn controller(&self) -> &GameController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut GameController {
        &mut self.controller
    }

    /// Waits for the next chunk from the server and applies it. Returns the
    /// number of records applied.
    pub async fn poll(&mut self) -> Result<usize, Box<dyn std::error::Error>> {
        let n = match self.stream.read(&mut self.chunk).await {
            Ok(0) => {
                let message = "server closed the connection";
                self.controller.handle_error(message);
                return Err(message.into());
            }
            Ok(n) => n,
            Err(e) => {
                self.controller.handle_error(&e.to_string());
                return Err(e.into());
            }
        };
        Ok(self.controller.receive(&self.chunk[..n]))
    }

    /// Sends a movement key. Returns false if the controller is not ready
    /// to move yet or the key is not a movement key.
    pub async fn send_key(&mut self, key: char) -> Result<bool, Box<dyn std::error::Error>> {
        match self.controller.move_command(key) {
            Some(command) => {
                self.write(&command).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn send_direction(
        &mut self,
        direction: Direction,
    ) -> Result<bool, Box<dyn std::error::Error>> {
        match self.controller.direction_command(direction) {
            Some(command) => {
                self.write(&command).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn write(&mut self, text: &str) -> Result<(), Box<dyn std::error::Error>> {
        if let Err(e) = self.stream.write_all(text.as_bytes()).await {
            self.controller.handle_error(&e.to_string());
            return Err(e.into());
        }
        Ok(())
    }
}
