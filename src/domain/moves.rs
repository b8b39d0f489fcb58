//! A single ply and its algebraic notation.

use std::fmt;

use serde::Serialize;

use super::chess::{Piece, PieceType, Position};

/// One completed ply.
///
/// `piece` is the mover as it stood before the move. `promoted_to` stays
/// `None` while a promotion choice is still pending on the board.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct Move {
    pub start: Position,
    pub end: Position,
    pub piece: Piece,
    pub captured_piece: Option<Piece>,
    pub promoted_to: Option<PieceType>,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub is_castling: bool,
    /// Disambiguation suffix, e.g. "b" for "Nbd7"
    pub ambiguity: String,
}

impl Move {
    /// A bare move record with no notation context
    pub fn new(start: Position, end: Position, piece: Piece) -> Self {
        Self {
            start,
            end,
            piece,
            captured_piece: None,
            promoted_to: None,
            is_check: false,
            is_checkmate: false,
            is_castling: false,
            ambiguity: String::new(),
        }
    }

    /// The same ply with its deferred promotion resolved
    pub fn with_promotion(&self, to: PieceType, is_check: bool, is_checkmate: bool) -> Self {
        Self {
            promoted_to: Some(to),
            is_check,
            is_checkmate,
            ..self.clone()
        }
    }

    /// Whether this was a pawn advancing two squares
    pub fn is_double_pawn_step(&self) -> bool {
        self.piece.piece_type == PieceType::Pawn && self.start.row.abs_diff(self.end.row) == 2
    }

    /// Long algebraic form used by UCI, e.g. `e7e8q`
    pub fn to_uci(&self) -> String {
        let mut uci = format!("{}{}", self.start, self.end);
        if let Some(promoted) = self.promoted_to {
            uci.push(promoted.fen_letter());
        }
        uci
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_castling {
            return f.write_str(if self.end.col > self.start.col { "O-O" } else { "O-O-O" });
        }

        let mut san = String::new();
        if let Some(letter) = self.piece.piece_type.san_letter() {
            san.push(letter);
            san.push_str(&self.ambiguity);
        }

        if self.captured_piece.is_some() {
            if self.piece.piece_type == PieceType::Pawn {
                san.push(self.start.file_char());
            }
            san.push('x');
        }

        san.push(self.end.file_char());
        san.push(self.end.rank_char());

        if let Some(letter) = self.promoted_to.and_then(PieceType::san_letter) {
            san.push('=');
            san.push(letter);
        }

        if self.is_checkmate {
            san.push('#');
        } else if self.is_check {
            san.push('+');
        }

        f.write_str(&san)
    }
}
