//! Engine configuration.
//!
//! Read from an optional JSON file; every field has a default so a partial
//! file (or none at all) works.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Engine strength presets
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Grandmaster,
}

impl Difficulty {
    /// Search depth passed to `go depth`
    pub fn depth(self) -> u32 {
        8
    }

    /// Value for the `Skill Level` option, 0..=20
    pub fn skill(self) -> u8 {
        match self {
            Difficulty::Beginner => 0,
            Difficulty::Intermediate => 5,
            Difficulty::Advanced => 12,
            Difficulty::Grandmaster => 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Engine executable; a bare name is looked up on PATH
    pub path: PathBuf,
    /// NNUE network for `setoption name EvalFile`
    pub eval_file: Option<PathBuf>,
    /// Small NNUE network for `setoption name EvalFileSmall`
    pub eval_file_small: Option<PathBuf>,
    pub difficulty: Difficulty,
    /// How long to wait for `bestmove`
    pub move_timeout_ms: u64,
    /// How long to wait for `readyok` after setup
    pub ready_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("stockfish"),
            eval_file: None,
            eval_file_small: None,
            difficulty: Difficulty::default(),
            move_timeout_ms: 30_000,
            ready_timeout_ms: 10_000,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn move_timeout(&self) -> Duration {
        Duration::from_millis(self.move_timeout_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    /// JSON Schema describing the config file
    pub fn json_schema() -> String {
        let schema = schemars::schema_for!(EngineConfig);
        serde_json::to_string_pretty(&schema).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_presets() {
        assert_eq!(Difficulty::Beginner.skill(), 0);
        assert_eq!(Difficulty::Intermediate.skill(), 5);
        assert_eq!(Difficulty::Advanced.skill(), 12);
        assert_eq!(Difficulty::Grandmaster.skill(), 20);
        assert!(
            [Difficulty::Beginner, Difficulty::Grandmaster]
                .iter()
                .all(|d| d.depth() == 8)
        );
    }

    #[test]
    fn test_empty_json_gives_defaults() {
        assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let config = EngineConfig::from_json(
            r#"{ "path": "/usr/games/stockfish", "difficulty": "advanced", "move_timeout_ms": 500 }"#,
        )
        .unwrap();
        assert_eq!(config.path, PathBuf::from("/usr/games/stockfish"));
        assert_eq!(config.difficulty, Difficulty::Advanced);
        assert_eq!(config.move_timeout(), Duration::from_millis(500));
        assert_eq!(config.ready_timeout(), Duration::from_secs(10));
        assert_eq!(config.eval_file, None);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(EngineConfig::from_json(r#"{ "depth": 20 }"#).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::load(Path::new("/nonexistent/engine.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_schema_mentions_fields() {
        let schema = EngineConfig::json_schema();
        assert!(schema.contains("move_timeout_ms"));
        assert!(schema.contains("grandmaster"));
    }
}
