pub mod board;
pub mod chess;
pub mod fen;
pub mod history;
pub mod moves;
pub mod rules;
pub mod uci;

pub use board::{Board, Grid};
pub use chess::{Piece, PieceColor, PieceType, Position};
pub use history::{GameHistory, SnapshotId};
pub use moves::Move;
pub use uci::{UciCommand, UciMove, UciOutput, UciOutputKind};
