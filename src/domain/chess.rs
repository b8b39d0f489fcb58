//! Pure chess value types.
//!
//! Squares are addressed by row/col with row 0 = rank 8 (black's back rank)
//! and col 0 = the a-file, matching the way the board is drawn.

use std::fmt;

use serde::Serialize;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
pub enum PieceType {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceType {
    /// Upper-case letter used in algebraic notation, `None` for pawns
    pub fn san_letter(self) -> Option<char> {
        match self {
            PieceType::King => Some('K'),
            PieceType::Queen => Some('Q'),
            PieceType::Rook => Some('R'),
            PieceType::Bishop => Some('B'),
            PieceType::Knight => Some('N'),
            PieceType::Pawn => None,
        }
    }

    /// Lower-case letter as used by FEN for black pieces
    pub fn fen_letter(self) -> char {
        match self {
            PieceType::King => 'k',
            PieceType::Queen => 'q',
            PieceType::Rook => 'r',
            PieceType::Bishop => 'b',
            PieceType::Knight => 'n',
            PieceType::Pawn => 'p',
        }
    }

    /// Parse a UCI promotion suffix (`q`, `r`, `b`, `n`)
    pub fn from_promotion_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'q' => Some(PieceType::Queen),
            'r' => Some(PieceType::Rook),
            'b' => Some(PieceType::Bishop),
            'n' => Some(PieceType::Knight),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
pub enum PieceColor {
    White,
    Black,
}

impl PieceColor {
    pub fn opposite(self) -> Self {
        match self {
            PieceColor::White => PieceColor::Black,
            PieceColor::Black => PieceColor::White,
        }
    }

    /// Row delta of a pawn step for this color
    pub(crate) fn forward(self) -> i32 {
        match self {
            PieceColor::White => -1,
            PieceColor::Black => 1,
        }
    }

    /// Row the pawns of this color start on
    pub(crate) fn pawn_row(self) -> usize {
        match self {
            PieceColor::White => 6,
            PieceColor::Black => 1,
        }
    }

    /// Row the pieces of this color start on
    pub(crate) fn back_row(self) -> usize {
        match self {
            PieceColor::White => 7,
            PieceColor::Black => 0,
        }
    }

    /// Row a pawn of this color promotes on
    pub(crate) fn promotion_row(self) -> usize {
        self.opposite().back_row()
    }
}

impl fmt::Display for PieceColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PieceColor::White => f.write_str("White"),
            PieceColor::Black => f.write_str("Black"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
pub struct Piece {
    pub piece_type: PieceType,
    pub color: PieceColor,
    /// Set once the piece has left its square; gates castling
    pub has_moved: bool,
}

impl Piece {
    pub const fn new(piece_type: PieceType, color: PieceColor) -> Self {
        Self {
            piece_type,
            color,
            has_moved: false,
        }
    }

    pub fn is(&self, piece_type: PieceType, color: PieceColor) -> bool {
        self.piece_type == piece_type && self.color == color
    }

    /// FEN letter: upper case for white, lower case for black
    pub fn fen_char(&self) -> char {
        let letter = self.piece_type.fen_letter();
        match self.color {
            PieceColor::White => letter.to_ascii_uppercase(),
            PieceColor::Black => letter,
        }
    }

    pub(crate) fn moved(self) -> Self {
        Self {
            has_moved: true,
            ..self
        }
    }
}

/// A square on the board
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        debug_assert!(row < 8 && col < 8);
        Self { row, col }
    }

    /// Parse a square such as `e4`
    pub fn from_algebraic(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        let file = chars.next()?;
        let rank = chars.next()?;
        if chars.next().is_some() || !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
            return None;
        }
        Some(Self {
            row: ('8' as usize) - (rank as usize),
            col: (file as usize) - ('a' as usize),
        })
    }

    pub fn file_char(self) -> char {
        (b'a' + self.col as u8) as char
    }

    pub fn rank_char(self) -> char {
        (b'8' - self.row as u8) as char
    }

    /// The square `drow`/`dcol` away, if it is still on the board
    pub(crate) fn offset(self, drow: i32, dcol: i32) -> Option<Self> {
        let row = self.row as i32 + drow;
        let col = self.col as i32 + dcol;
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Some(Self::new(row as usize, col as usize))
        } else {
            None
        }
    }

    /// All 64 squares, rank 8 first
    pub fn all() -> impl Iterator<Item = Position> {
        (0..8).flat_map(|row| (0..8).map(move |col| Position::new(row, col)))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algebraic_round_trip_corners() {
        assert_eq!(Position::from_algebraic("a8"), Some(Position::new(0, 0)));
        assert_eq!(Position::from_algebraic("h1"), Some(Position::new(7, 7)));
        assert_eq!(Position::from_algebraic("e4"), Some(Position::new(4, 4)));
        assert_eq!(Position::new(6, 4).to_string(), "e2");
    }

    #[test]
    fn test_algebraic_rejects_garbage() {
        assert_eq!(Position::from_algebraic("i1"), None);
        assert_eq!(Position::from_algebraic("a9"), None);
        assert_eq!(Position::from_algebraic("a"), None);
        assert_eq!(Position::from_algebraic("e44"), None);
    }

    #[test]
    fn test_offset_stays_on_board() {
        let corner = Position::new(0, 0);
        assert_eq!(corner.offset(-1, 0), None);
        assert_eq!(corner.offset(1, 2), Some(Position::new(1, 2)));
    }

    #[test]
    fn test_fen_chars() {
        assert_eq!(Piece::new(PieceType::Knight, PieceColor::White).fen_char(), 'N');
        assert_eq!(Piece::new(PieceType::Pawn, PieceColor::Black).fen_char(), 'p');
    }

    #[test]
    fn test_promotion_chars() {
        assert_eq!(PieceType::from_promotion_char('q'), Some(PieceType::Queen));
        assert_eq!(PieceType::from_promotion_char('n'), Some(PieceType::Knight));
        assert_eq!(PieceType::from_promotion_char('k'), None);
    }

    #[test]
    fn test_color_geometry() {
        assert_eq!(PieceColor::White.promotion_row(), 0);
        assert_eq!(PieceColor::Black.promotion_row(), 7);
        assert_eq!(PieceColor::White.forward(), -1);
    }

    #[test]
    fn test_serialized_shape() {
        let piece = serde_json::to_value(Piece::new(PieceType::Rook, PieceColor::Black)).unwrap();
        assert_eq!(
            piece,
            serde_json::json!({ "piece_type": "Rook", "color": "Black", "has_moved": false })
        );
        let square = serde_json::to_value(Position::new(4, 4)).unwrap();
        assert_eq!(square, serde_json::json!({ "row": 4, "col": 4 }));
    }
}
