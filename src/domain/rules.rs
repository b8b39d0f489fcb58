//! Piece movement geometry.
//!
//! These predicates answer "can this piece get there" without asking whether
//! the mover's king survives the move. Full legality lives in `board.rs`.

use super::board::Board;
use super::chess::{Piece, PieceColor, PieceType, Position};

impl Board {
    /// Movement and occupancy rules only; the mover's king may end up in check
    pub fn is_valid_move_ignoring_check(&self, start: Position, end: Position) -> bool {
        let Some(piece) = self.piece_at(start) else {
            return false;
        };
        if self.piece_at(end).is_some_and(|target| target.color == piece.color) {
            return false;
        }

        match piece.piece_type {
            PieceType::Pawn => self.is_valid_pawn_move(start, end, piece.color),
            PieceType::Rook => self.is_valid_rook_move(start, end),
            PieceType::Knight => is_valid_knight_move(start, end),
            PieceType::Bishop => self.is_valid_bishop_move(start, end),
            PieceType::Queen => self.is_valid_queen_move(start, end),
            PieceType::King => self.is_valid_king_move(start, end, piece),
        }
    }

    /// Whether a pawn on `start` may take en passant by moving to `end`.
    ///
    /// Depends only on the previous ply: it must have been a two-square pawn
    /// advance, the capturer must stand beside that pawn, and `end` must be
    /// the square the pawn skipped over.
    pub fn is_en_passant(&self, start: Position, end: Position) -> bool {
        let Some(last) = self.last_move() else {
            return false;
        };
        let Some(advanced) = self.piece_at(last.end) else {
            return false;
        };
        if advanced.piece_type != PieceType::Pawn || last.start.row.abs_diff(last.end.row) != 2 {
            return false;
        }

        let behind = last.end.row as i32 - advanced.color.forward();
        start.row == last.end.row && end.col == last.end.col && end.row as i32 == behind
    }

    /// Whether any square strictly between `start` and `end` is occupied.
    /// Assumes the two share a rank, file or diagonal.
    pub(crate) fn is_path_blocked(&self, start: Position, end: Position) -> bool {
        let row_step = (end.row as i32 - start.row as i32).signum();
        let col_step = (end.col as i32 - start.col as i32).signum();

        let mut current = start.offset(row_step, col_step);
        while let Some(pos) = current {
            if pos == end {
                return false;
            }
            if self.piece_at(pos).is_some() {
                return true;
            }
            current = pos.offset(row_step, col_step);
        }
        false
    }

    fn is_valid_pawn_move(&self, start: Position, end: Position, color: PieceColor) -> bool {
        let direction = color.forward();
        let row_diff = end.row as i32 - start.row as i32;

        if start.col == end.col {
            if self.piece_at(end).is_some() {
                return false;
            }
            if row_diff == direction {
                return true;
            }
            if start.row == color.pawn_row() && row_diff == 2 * direction {
                return start
                    .offset(direction, 0)
                    .is_some_and(|skipped| self.piece_at(skipped).is_none());
            }
            return false;
        }

        start.col.abs_diff(end.col) == 1
            && row_diff == direction
            && (self.piece_at(end).is_some() || self.is_en_passant(start, end))
    }

    fn is_valid_rook_move(&self, start: Position, end: Position) -> bool {
        if start.row != end.row && start.col != end.col {
            return false;
        }
        !self.is_path_blocked(start, end)
    }

    fn is_valid_bishop_move(&self, start: Position, end: Position) -> bool {
        if start.row.abs_diff(end.row) != start.col.abs_diff(end.col) {
            return false;
        }
        !self.is_path_blocked(start, end)
    }

    fn is_valid_queen_move(&self, start: Position, end: Position) -> bool {
        self.is_valid_rook_move(start, end) || self.is_valid_bishop_move(start, end)
    }

    fn is_valid_king_move(&self, start: Position, end: Position, king: Piece) -> bool {
        let row_diff = start.row.abs_diff(end.row);
        let col_diff = start.col.abs_diff(end.col);

        if !king.has_moved && row_diff == 0 && col_diff == 2 {
            return self.can_castle(start, end, king);
        }
        row_diff <= 1 && col_diff <= 1
    }

    /// King and rook unmoved, nothing between them, king not in check and not
    /// crossing or landing on an attacked square.
    fn can_castle(&self, start: Position, end: Position, king: Piece) -> bool {
        let (rook_col, step) = if end.col > start.col { (7, 1) } else { (0, -1) };
        let rook_square = Position::new(start.row, rook_col);
        let Some(rook) = self.piece_at(rook_square) else {
            return false;
        };
        if !rook.is(PieceType::Rook, king.color) || rook.has_moved {
            return false;
        }

        let mut between = Vec::new();
        let mut current = start.offset(0, step);
        while let Some(pos) = current.filter(|&pos| pos != rook_square) {
            between.push(pos);
            current = pos.offset(0, step);
        }

        // the destination is always among these, so an occupied target
        // (including an enemy king) is rejected before any simulation
        if between.iter().any(|&pos| self.piece_at(pos).is_some()) {
            return false;
        }
        if self.is_king_in_check(king.color) {
            return false;
        }

        between
            .iter()
            .filter(|pos| pos.col.abs_diff(start.col) <= 2)
            .all(|&pos| !self.simulate(start, pos).is_king_in_check(king.color))
    }
}

fn is_valid_knight_move(start: Position, end: Position) -> bool {
    let row_diff = start.row.abs_diff(end.row);
    let col_diff = start.col.abs_diff(end.col);
    (row_diff == 2 && col_diff == 1) || (row_diff == 1 && col_diff == 2)
}
