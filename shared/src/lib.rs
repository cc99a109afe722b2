//! # Shared Game Definitions
//!
//! Types used by both the authoritative server and the client: the geometry
//! primitives, the entity model, a plain world mirror, and the line-oriented
//! wire protocol that synchronizes them.

pub mod geometry;
pub mod model;
pub mod protocol;
pub mod world;

pub use geometry::{
    rect_overlap, segment_direction, spans_world_edge, Direction, Rect, Vector2D,
};
pub use model::{Powerup, Snake, Wall};
pub use protocol::{
    decode_move, decode_player_name, decode_scalar, decode_server_record, encode_move,
    encode_record, encode_scalar, LineBuffer, ProtocolError, RecordKind, ServerRecord,
    WireRecord, DEFAULT_MAX_LINE,
};
pub use world::World;

/// Collision radius of a snake body around its polyline.
pub const SNAKE_RADIUS: f64 = 5.0;
/// Diameter of a powerup.
pub const POWERUP_WIDTH: f64 = 10.0;
/// Thickness of a wall around its centerline.
pub const WALL_WIDTH: f64 = 50.0;
/// Spawned snakes keep at least this distance from the world edge.
pub const SPAWN_EDGE_MARGIN: f64 = 10.0;
pub const DEFAULT_PORT: u16 = 11000;
/// Longest display name the server keeps.
pub const MAX_NAME_LEN: usize = 16;
