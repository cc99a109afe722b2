//! Game settings loaded once at startup.

use serde::{Deserialize, Serialize};
use shared::{Wall, SPAWN_EDGE_MARGIN};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Rules of the game. Immutable after loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GameSettings {
    /// Distance a snake head travels per tick
    pub snake_speed: u32,
    pub snake_start_length: u32,
    /// Ticks of tail growth granted per powerup
    pub snake_growth: u32,
    pub max_powerups: u32,
    /// Upper bound (exclusive) of the random delay between powerup spawns
    pub max_powerup_delay: u32,
    /// Broadcast every this many ticks
    pub frames_per_shot: u32,
    #[serde(rename = "MSPerFrame")]
    pub ms_per_frame: u64,
    /// Side length of the square world
    pub universe_size: u32,
    /// Ticks a dead snake waits before respawning
    pub respawn_rate: u32,
    pub walls: Vec<Wall>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            snake_speed: 3,
            snake_start_length: 120,
            snake_growth: 12,
            max_powerups: 20,
            max_powerup_delay: 200,
            frames_per_shot: 1,
            ms_per_frame: 34,
            universe_size: 2000,
            respawn_rate: 300,
            walls: Vec::new(),
        }
    }
}

impl GameSettings {
    /// Reads and validates a JSON settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        let settings: GameSettings = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.ms_per_frame == 0 {
            return Err(SettingsError::Invalid("MSPerFrame must be positive".into()));
        }
        if self.universe_size == 0 {
            return Err(SettingsError::Invalid("UniverseSize must be positive".into()));
        }
        if self.frames_per_shot == 0 {
            return Err(SettingsError::Invalid("FramesPerShot must be positive".into()));
        }
        if self.snake_start_length == 0 {
            return Err(SettingsError::Invalid(
                "SnakeStartLength must be positive".into(),
            ));
        }
        if self.snake_start_length as f64 + 2.0 * SPAWN_EDGE_MARGIN > self.universe_size as f64 {
            return Err(SettingsError::Invalid(format!(
                "UniverseSize {} cannot fit a snake of length {}",
                self.universe_size, self.snake_start_length
            )));
        }
        if let Some(wall) = self.walls.iter().find(|w| !w.is_axis_aligned()) {
            return Err(SettingsError::Invalid(format!(
                "wall {} is neither horizontal nor vertical",
                wall.id
            )));
        }
        Ok(())
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_millis(self.ms_per_frame)
    }

    pub fn world_size(&self) -> f64 {
        self.universe_size as f64
    }

    pub fn half_size(&self) -> f64 {
        self.universe_size as f64 / 2.0
    }

    pub fn speed(&self) -> f64 {
        self.snake_speed as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = GameSettings::default();
        assert_eq!(settings.snake_speed, 3);
        assert_eq!(settings.snake_start_length, 120);
        assert_eq!(settings.snake_growth, 12);
        assert_eq!(settings.max_powerups, 20);
        assert_eq!(settings.max_powerup_delay, 200);
        assert!(settings.validate().is_ok());
        assert_eq!(settings.tick_duration(), Duration::from_millis(34));
    }

    #[test]
    fn test_parse_with_partial_keys() {
        let text = r#"{
            "MSPerFrame": 17,
            "UniverseSize": 1200,
            "RespawnRate": 100,
            "Walls": [
                {"wall": 1, "p1": {"X": -50.0, "Y": 0.0}, "p2": {"X": 50.0, "Y": 0.0}}
            ]
        }"#;

        let settings = GameSettings::from_json(text).unwrap();
        assert_eq!(settings.ms_per_frame, 17);
        assert_eq!(settings.universe_size, 1200);
        assert_eq!(settings.respawn_rate, 100);
        assert_eq!(settings.walls.len(), 1);
        assert_eq!(settings.walls[0].id, 1);
        assert_eq!(settings.snake_speed, 3);
        assert_eq!(settings.half_size(), 600.0);
    }

    #[test]
    fn test_rejects_diagonal_wall() {
        let text = r#"{"Walls": [{"wall": 4, "p1": {"X": 0.0, "Y": 0.0}, "p2": {"X": 50.0, "Y": 50.0}}]}"#;
        match GameSettings::from_json(text) {
            Err(SettingsError::Invalid(msg)) => assert!(msg.contains("wall 4")),
            other => panic!("Expected invalid settings, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_zero_frame_time() {
        let text = r#"{"MSPerFrame": 0}"#;
        assert!(matches!(
            GameSettings::from_json(text),
            Err(SettingsError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_world_smaller_than_snake() {
        let text = r#"{"UniverseSize": 100, "SnakeStartLength": 90}"#;
        match GameSettings::from_json(text) {
            Err(SettingsError::Invalid(msg)) => assert!(msg.contains("cannot fit")),
            other => panic!("Expected invalid settings, got {:?}", other),
        }
        assert!(GameSettings::from_json(r#"{"UniverseSize": 140, "SnakeStartLength": 120}"#).is_ok());
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            GameSettings::from_json("{\"MSPerFrame\": "),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            GameSettings::load("/definitely/not/here/settings.json"),
            Err(SettingsError::Io(_))
        ));
    }
}
