pub mod engine;
pub mod game;

pub use engine::{EngineEvent, EngineSession};
pub use game::{GameMode, GameModel, GameStatus};
