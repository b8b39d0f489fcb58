//! View models and text rendering for the terminal front end.
//!
//! These types prepare game state for display; they do not change it.

use serde::Serialize;

use crate::domain::{Board, PieceColor, Position};
use crate::models::game::{GameModel, GameStatus};

/// Display data for one ply of the move list
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MoveDisplay {
    pub move_num: usize,
    pub is_black: bool,
    pub san: String,
    pub uci: String,
    /// Whether this move gives check
    pub is_check: bool,
    /// Whether this move gives checkmate
    pub is_checkmate: bool,
}

/// The played moves of `board` with move numbers attached.
///
/// A list that opens with a black move starts at "1...".
pub fn move_list_display(board: &Board) -> Vec<MoveDisplay> {
    let mut move_num = 1;
    board
        .moves()
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let is_black = m.piece.color == PieceColor::Black;
            if i > 0 && !is_black {
                move_num += 1;
            }
            MoveDisplay {
                move_num,
                is_black,
                san: m.to_string(),
                uci: m.to_uci(),
                is_check: m.is_check,
                is_checkmate: m.is_checkmate,
            }
        })
        .collect()
}

/// Render moves as "1. e4 e5 2. Nf3"
pub fn format_move_list(moves: &[MoveDisplay]) -> String {
    let mut parts = Vec::with_capacity(moves.len() * 3 / 2);
    for (i, m) in moves.iter().enumerate() {
        if !m.is_black {
            parts.push(format!("{}.", m.move_num));
        } else if i == 0 {
            parts.push(format!("{}...", m.move_num));
        }
        parts.push(m.san.clone());
    }
    parts.join(" ")
}

/// Text diagram with rank 8 at the top, FEN letters for pieces and `.` for
/// empty squares
pub fn board_diagram(board: &Board) -> String {
    let mut out = String::new();
    for row in 0..8 {
        out.push(Position::new(row, 0).rank_char());
        for col in 0..8 {
            out.push(' ');
            let square = board.piece_at(Position::new(row, col));
            out.push(square.map_or('.', |p| p.fen_char()));
        }
        out.push('\n');
    }
    out.push_str("  a b c d e f g h\n");
    out
}

/// Everything the CLI reports about a game, in serializable form
#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    pub moves: Vec<MoveDisplay>,
    pub fen: String,
    pub turn: PieceColor,
    pub status: GameStatus,
    pub status_text: String,
    /// Square of a pawn still waiting for its promotion choice
    pub promotion_pending: Option<String>,
    pub captured_by_white: Vec<char>,
    pub captured_by_black: Vec<char>,
}

impl GameSummary {
    pub fn from_game(game: &GameModel) -> Self {
        let board = game.board();
        let status = game.status();
        Self {
            moves: move_list_display(board),
            fen: board.to_fen(),
            turn: game.turn(),
            status,
            status_text: status.to_string(),
            promotion_pending: board.promotion_position().map(|p| p.to_string()),
            captured_by_white: board.captured_by_white().iter().map(|p| p.fen_char()).collect(),
            captured_by_black: board.captured_by_black().iter().map(|p| p.fen_char()).collect(),
        }
    }

    /// Multi-line human readable report
    pub fn render(&self, board: &Board) -> String {
        let mut out = board_diagram(board);
        if !self.moves.is_empty() {
            out.push('\n');
            out.push_str(&format_move_list(&self.moves));
            out.push('\n');
        }
        if !self.status_text.is_empty() {
            out.push('\n');
            out.push_str(&self.status_text);
            out.push('\n');
        }
        if let Some(square) = &self.promotion_pending {
            out.push_str(&format!("\nPromotion pending on {square}\n"));
        }
        out.push_str(&format!("\nFEN: {}\n", self.fen));
        out
    }
}
