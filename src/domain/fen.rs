//! FEN output for handing positions to an external engine.
//!
//! Write-only. The halfmove clock and fullmove number are not tracked and are
//! always written as `0 1`.

use super::board::Board;
use super::chess::{PieceColor, PieceType, Position};

impl Board {
    pub fn to_fen(&self) -> String {
        let mut fen = String::new();

        for (row, rank) in self.pieces().iter().enumerate() {
            if row > 0 {
                fen.push('/');
            }
            let mut empty = 0;
            for square in rank {
                match square {
                    Some(piece) => {
                        if empty > 0 {
                            fen.push_str(&empty.to_string());
                            empty = 0;
                        }
                        fen.push(piece.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
        }

        // side to move is simply whoever did not play last
        let turn = match self.last_move().map(|m| m.piece.color) {
            Some(PieceColor::White) => 'b',
            _ => 'w',
        };
        fen.push(' ');
        fen.push(turn);

        fen.push(' ');
        fen.push_str(&self.castling_field());

        fen.push(' ');
        match self.last_move().filter(|m| m.is_double_pawn_step()) {
            Some(last) => {
                fen.push(last.start.file_char());
                fen.push(match last.piece.color {
                    PieceColor::White => '3',
                    PieceColor::Black => '6',
                });
            }
            None => fen.push('-'),
        }

        fen.push_str(" 0 1");
        fen
    }

    /// Rights from the `has_moved` flags of kings and rooks on their home squares
    fn castling_field(&self) -> String {
        let mut rights = String::new();
        for (color, letters) in [(PieceColor::White, ['K', 'Q']), (PieceColor::Black, ['k', 'q'])] {
            let row = color.back_row();
            let unmoved = |col: usize, piece_type: PieceType| {
                self.piece_at(Position::new(row, col))
                    .is_some_and(|p| p.is(piece_type, color) && !p.has_moved)
            };
            if !unmoved(4, PieceType::King) {
                continue;
            }
            if unmoved(7, PieceType::Rook) {
                rights.push(letters[0]);
            }
            if unmoved(0, PieceType::Rook) {
                rights.push(letters[1]);
            }
        }
        if rights.is_empty() {
            rights.push('-');
        }
        rights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chess::Piece;

    fn sq(s: &str) -> Position {
        Position::from_algebraic(s).unwrap()
    }

    fn play(board: Board, moves: &[&str]) -> Board {
        moves
            .iter()
            .fold(board, |board, uci| board.move_piece(sq(&uci[0..2]), sq(&uci[2..4]), None))
    }

    #[test]
    fn test_initial_fen() {
        assert_eq!(
            Board::initial().to_fen(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
    }

    #[test]
    fn test_double_step_sets_en_passant_square() {
        let board = play(Board::initial(), &["e2e4"]);
        assert_eq!(
            board.to_fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
        let board = play(board, &["c7c5"]);
        assert_eq!(
            board.to_fen(),
            "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq c6 0 1"
        );
        let board = play(board, &["g1f3"]);
        assert_eq!(
            board.to_fen(),
            "rnbqkbnr/pp1ppppp/8/2p5/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 0 1"
        );
    }

    #[test]
    fn test_castling_rights_follow_moved_flags() {
        let board = play(
            Board::initial(),
            &["g1f3", "g8f6", "h1g1", "b8c6", "g1h1"],
        );
        // the rook is back on h1 but has moved
        assert!(board.to_fen().contains(" b Qkq "));

        let board = play(board, &["a8b8"]);
        assert!(board.to_fen().contains(" w Qk "));
    }

    #[test]
    fn test_no_castling_rights() {
        let board = Board::empty()
            .with_piece(sq("e1"), Piece::new(PieceType::King, PieceColor::White))
            .with_piece(sq("e8"), Piece::new(PieceType::King, PieceColor::Black));
        assert_eq!(board.to_fen(), "4k3/8/8/8/8/8/8/4K3 w - - 0 1");
    }
}
