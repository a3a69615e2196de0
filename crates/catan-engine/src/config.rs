//! Game configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Tunables for a single game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for every random draw in the game; entropy when absent
    pub seed: Option<u64>,
    /// Full rotations played before the game ends without a winner
    pub max_rounds: u32,
    pub victory_points_to_win: u32,
    /// Actions an agent may apply in one turn before it is ended for them
    pub max_actions_per_turn: u32,
    /// Setup placements requested from an agent before falling back
    pub max_setup_attempts: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_rounds: 500,
            victory_points_to_win: 10,
            max_actions_per_turn: 50,
            max_setup_attempts: 64,
        }
    }
}

/// Errors loading or validating a [`GameConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{field} must be at least 1")]
    Zero { field: &'static str },
}

impl GameConfig {
    /// Config with a fixed seed and defaults elsewhere
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Parse and validate a JSON config. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` on malformed JSON or a zero-valued limit.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or is invalid.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Check that every limit is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = [
            ("max_rounds", self.max_rounds),
            ("victory_points_to_win", self.victory_points_to_win),
            ("max_actions_per_turn", self.max_actions_per_turn),
            ("max_setup_attempts", self.max_setup_attempts),
        ];
        match limits.into_iter().find(|&(_, value)| value == 0) {
            Some((field, _)) => Err(ConfigError::Zero { field }),
            None => Ok(()),
        }
    }
}
