//! Line-oriented wire protocol.
//!
//! Every record is one line of text terminated by `\n`. The server opens a
//! session with two bare integers (player id, world size) followed by one
//! JSON object per wall; after that it sends one JSON object per snake and
//! per powerup every broadcast. Clients send their display name as the first
//! line and `{"moving":"<direction>"}` directives afterwards.

use crate::geometry::Direction;
use crate::model::{Powerup, Snake, Wall};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const RECORD_TERMINATOR: u8 = b'\n';

/// Longest unterminated fragment a `LineBuffer` holds by default.
pub const DEFAULT_MAX_LINE: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed json record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("record is not a json object")]
    NotAnObject,
    #[error("record carries no known kind discriminator")]
    UnknownKind,
    #[error("unknown movement directive: {0}")]
    UnknownDirective(String),
    #[error("expected an integer record, got {0:?}")]
    Scalar(String),
    #[error("unterminated record of {len} bytes exceeds the {max} byte limit")]
    LineTooLong { len: usize, max: usize },
    #[error("snake {0} has fewer than two body points")]
    ShortBody(u32),
}

/// Entity kind carried by a JSON record, identified by its id key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Snake,
    Powerup,
    Wall,
}

impl RecordKind {
    /// The key that both names the kind and holds the entity id.
    pub fn discriminator(self) -> &'static str {
        match self {
            RecordKind::Snake => "snake",
            RecordKind::Powerup => "power",
            RecordKind::Wall => "wall",
        }
    }

    /// Determines the kind of a decoded object from the keys it carries.
    pub fn of(object: &Map<String, Value>) -> Option<RecordKind> {
        [RecordKind::Snake, RecordKind::Powerup, RecordKind::Wall]
            .into_iter()
            .find(|kind| object.contains_key(kind.discriminator()))
    }
}

/// Entities that can be sent as a tagged record.
pub trait WireRecord: Serialize {
    const KIND: RecordKind;
}

impl WireRecord for Snake {
    const KIND: RecordKind = RecordKind::Snake;
}

impl WireRecord for Powerup {
    const KIND: RecordKind = RecordKind::Powerup;
}

impl WireRecord for Wall {
    const KIND: RecordKind = RecordKind::Wall;
}

/// A decoded server-to-client line.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerRecord {
    /// Handshake integer: the player id first, the world size second
    Scalar(i64),
    Snake(Snake),
    Powerup(Powerup),
    Wall(Wall),
}

/// Encodes an entity as one newline-terminated record.
pub fn encode_record<T: WireRecord>(record: &T) -> Result<String, ProtocolError> {
    let mut line = serde_json::to_string(record)?;
    line.push('\n');
    Ok(line)
}

/// Encodes a handshake integer as one newline-terminated record.
pub fn encode_scalar(value: i64) -> String {
    format!("{}\n", value)
}

/// Decodes one server record. The trailing terminator is optional.
pub fn decode_server_record(line: &str) -> Result<ServerRecord, ProtocolError> {
    let line = trim_terminator(line);

    if let Ok(value) = line.trim().parse::<i64>() {
        return Ok(ServerRecord::Scalar(value));
    }

    let object = match serde_json::from_str::<Value>(line)? {
        Value::Object(object) => object,
        _ => return Err(ProtocolError::NotAnObject),
    };

    match RecordKind::of(&object) {
        Some(RecordKind::Snake) => {
            let snake: Snake = serde_json::from_value(Value::Object(object))?;
            if snake.body.len() < 2 {
                return Err(ProtocolError::ShortBody(snake.id));
            }
            Ok(ServerRecord::Snake(snake))
        }
        Some(RecordKind::Powerup) => Ok(ServerRecord::Powerup(serde_json::from_value(
            Value::Object(object),
        )?)),
        Some(RecordKind::Wall) => Ok(ServerRecord::Wall(serde_json::from_value(
            Value::Object(object),
        )?)),
        None => Err(ProtocolError::UnknownKind),
    }
}

/// Parses a handshake integer line.
pub fn decode_scalar(line: &str) -> Result<i64, ProtocolError> {
    let line = trim_terminator(line);
    line.trim()
        .parse::<i64>()
        .map_err(|_| ProtocolError::Scalar(line.to_string()))
}

#[derive(Debug, Deserialize)]
struct MoveCommand {
    moving: String,
}

/// Encodes a movement directive.
pub fn encode_move(direction: Direction) -> String {
    let moving = match direction {
        Direction::Up => "up",
        Direction::Left => "left",
        Direction::Down => "down",
        Direction::Right => "right",
    };
    format!("{{\"moving\":\"{}\"}}\n", moving)
}

/// Decodes a movement directive line.
pub fn decode_move(line: &str) -> Result<Direction, ProtocolError> {
    let command: MoveCommand = serde_json::from_str(trim_terminator(line))?;
    match command.moving.as_str() {
        "up" => Ok(Direction::Up),
        "left" => Ok(Direction::Left),
        "down" => Ok(Direction::Down),
        "right" => Ok(Direction::Right),
        other => Err(ProtocolError::UnknownDirective(other.to_string())),
    }
}

/// Normalises the first line a client sends into a display name.
pub fn decode_player_name(line: &str, max_len: usize) -> String {
    trim_terminator(line).chars().take(max_len).collect()
}

fn trim_terminator(line: &str) -> &str {
    line.trim_end_matches('\n').trim_end_matches('\r')
}

/// Accumulates raw received bytes and hands out complete records.
///
/// A trailing fragment without a terminator stays buffered until the rest
/// of it arrives, up to `max_line` bytes.
#[derive(Debug)]
pub struct LineBuffer {
    pending: Vec<u8>,
    /// Bytes of `pending` already searched for a terminator
    scanned: usize,
    /// Length of the unterminated fragment at the end of `pending`
    fragment: usize,
    max_line: usize,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::with_limit(DEFAULT_MAX_LINE)
    }
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(max_line: usize) -> Self {
        Self {
            pending: Vec::new(),
            scanned: 0,
            fragment: 0,
            max_line,
        }
    }

    /// Appends a received chunk. Fails if the unterminated fragment grows
    /// past the limit; the buffer is left as it was.
    pub fn push(&mut self, chunk: &[u8]) -> Result<(), ProtocolError> {
        let fragment = match chunk.iter().rposition(|b| *b == RECORD_TERMINATOR) {
            Some(end) => chunk.len() - end - 1,
            None => self.fragment + chunk.len(),
        };
        if fragment > self.max_line {
            return Err(ProtocolError::LineTooLong {
                len: fragment,
                max: self.max_line,
            });
        }

        self.pending.extend_from_slice(chunk);
        self.fragment = fragment;
        Ok(())
    }

    /// Removes and returns the next complete record without its terminator.
    pub fn next_line(&mut self) -> Option<String> {
        let found = self.pending[self.scanned..]
            .iter()
            .position(|b| *b == RECORD_TERMINATOR);
        let end = match found {
            Some(offset) => self.scanned + offset,
            None => {
                self.scanned = self.pending.len();
                return None;
            }
        };

        let line: Vec<u8> = self.pending.drain(..=end).collect();
        self.scanned = 0;
        let text = String::from_utf8_lossy(&line[..line.len() - 1]);
        Some(text.trim_end_matches('\r').to_string())
    }

    /// Drops everything buffered.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.scanned = 0;
        self.fragment = 0;
    }

    /// Removes and returns every complete record currently buffered.
    pub fn drain_lines(&mut self) -> Vec<String> {
        std::iter::from_fn(|| self.next_line()).collect()
    }

    /// Number of buffered bytes that do not yet form a complete record.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
