//! Immutable board snapshots and the transitions between them.
//!
//! Every operation takes `&self` and either answers a question about the
//! position or returns the next `Board`. Move legality comes in two tiers:
//! pseudo-legal geometry (see `rules.rs`) and full legality, which also
//! requires that the mover's own king is safe afterwards. Check detection only
//! ever uses the pseudo-legal tier, so the two never recurse into each other.

use std::sync::LazyLock;

use super::chess::{Piece, PieceColor, PieceType, Position};
use super::moves::Move;

/// 8x8 grid indexed `[row][col]`
pub type Grid = [[Option<Piece>; 8]; 8];

static INITIAL_BOARD: LazyLock<Board> = LazyLock::new(|| {
    const BACK_RANK: [PieceType; 8] = [
        PieceType::Rook,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Queen,
        PieceType::King,
        PieceType::Bishop,
        PieceType::Knight,
        PieceType::Rook,
    ];

    let mut pieces: Grid = [[None; 8]; 8];
    for (col, piece_type) in BACK_RANK.into_iter().enumerate() {
        pieces[0][col] = Some(Piece::new(piece_type, PieceColor::Black));
        pieces[1][col] = Some(Piece::new(PieceType::Pawn, PieceColor::Black));
        pieces[6][col] = Some(Piece::new(PieceType::Pawn, PieceColor::White));
        pieces[7][col] = Some(Piece::new(piece_type, PieceColor::White));
    }
    Board {
        pieces,
        ..Board::empty()
    }
});

/// Full game state after some number of plies
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Board {
    pieces: Grid,
    /// Black pieces taken by white, in capture order
    captured_by_white: Vec<Piece>,
    /// White pieces taken by black, in capture order
    captured_by_black: Vec<Piece>,
    /// Square of a pawn waiting for its promotion choice
    promotion_position: Option<Position>,
    /// Every ply in play order
    moves: Vec<Move>,
}

/// Result of applying a move to a copy of the grid
struct GridChange {
    pieces: Grid,
    captured: Option<Piece>,
    is_castling: bool,
}

impl Board {
    /// The standard starting position
    pub fn initial() -> Self {
        INITIAL_BOARD.clone()
    }

    /// A board with no pieces and no history
    pub fn empty() -> Self {
        Self {
            pieces: [[None; 8]; 8],
            captured_by_white: Vec::new(),
            captured_by_black: Vec::new(),
            promotion_position: None,
            moves: Vec::new(),
        }
    }

    /// Place a piece, replacing whatever stood there. For setting up positions.
    pub fn with_piece(mut self, position: Position, piece: Piece) -> Self {
        self.pieces[position.row][position.col] = Some(piece);
        self
    }

    pub fn pieces(&self) -> &Grid {
        &self.pieces
    }

    pub fn piece_at(&self, position: Position) -> Option<Piece> {
        self.pieces[position.row][position.col]
    }

    pub fn captured_by_white(&self) -> &[Piece] {
        &self.captured_by_white
    }

    pub fn captured_by_black(&self) -> &[Piece] {
        &self.captured_by_black
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn last_move(&self) -> Option<&Move> {
        self.moves.last()
    }

    pub fn promotion_position(&self) -> Option<Position> {
        self.promotion_position
    }

    /// Whose turn it is. A side that still owes a promotion choice keeps the turn.
    pub fn side_to_move(&self) -> PieceColor {
        match (self.last_move(), self.promotion_position) {
            (None, _) => PieceColor::White,
            (Some(last), Some(_)) => last.piece.color,
            (Some(last), None) => last.piece.color.opposite(),
        }
    }

    /// Pseudo-legal and leaves the mover's own king out of check
    pub fn is_valid_move(&self, start: Position, end: Position) -> bool {
        let Some(piece) = self.piece_at(start) else {
            return false;
        };
        if !self.is_valid_move_ignoring_check(start, end) {
            return false;
        }
        !self.simulate(start, end).is_king_in_check(piece.color)
    }

    /// Destinations the piece on `from` can legally reach
    pub fn legal_moves_from(&self, from: Position) -> Vec<Position> {
        Position::all().filter(|&to| self.is_valid_move(from, to)).collect()
    }

    /// Every legal (from, to) pair for `color`
    pub fn legal_moves(&self, color: PieceColor) -> Vec<(Position, Position)> {
        self.squares_of(color)
            .flat_map(|from| self.legal_moves_from(from).into_iter().map(move |to| (from, to)))
            .collect()
    }

    /// Whether any opposing piece attacks `color`'s king
    pub fn is_king_in_check(&self, color: PieceColor) -> bool {
        let Some(king) = self.find_king(color) else {
            return false;
        };
        self.squares_of(color.opposite())
            .any(|from| self.is_valid_move_ignoring_check(from, king))
    }

    /// In check with no legal move. Stalemate is not reported here.
    pub fn is_checkmate(&self, color: PieceColor) -> bool {
        if !self.is_king_in_check(color) {
            return false;
        }
        !self
            .squares_of(color)
            .any(|from| Position::all().any(|to| self.is_valid_move(from, to)))
    }

    /// Play a move and return the resulting board.
    ///
    /// The caller is expected to have checked [`Board::is_valid_move`] first.
    /// When a pawn reaches its last rank without `promote_to`, the returned
    /// board has a pending promotion to be completed by [`Board::promote_pawn`].
    ///
    /// # Panics
    ///
    /// Panics if `start` is empty.
    pub fn move_piece(&self, start: Position, end: Position, promote_to: Option<PieceType>) -> Board {
        let Some(moving) = self.piece_at(start) else {
            panic!("no piece at {start}");
        };

        let ambiguity = self.calculate_ambiguity(start, end, moving);
        let change = self.apply_to_grid(start, end, moving, promote_to);

        let mut captured_by_white = self.captured_by_white.clone();
        let mut captured_by_black = self.captured_by_black.clone();
        match change.captured {
            Some(piece) if piece.color == PieceColor::Black => captured_by_white.push(piece),
            Some(piece) => captured_by_black.push(piece),
            None => {}
        }

        let mut played = Move {
            start,
            end,
            piece: moving,
            captured_piece: change.captured,
            promoted_to: promote_to,
            is_check: false,
            is_checkmate: false,
            is_castling: change.is_castling,
            ambiguity,
        };

        let opponent = moving.color.opposite();
        let probe = Board::probe(change.pieces, played.clone());
        played.is_check = probe.is_king_in_check(opponent);
        played.is_checkmate = probe.is_checkmate(opponent);

        let promotion_pending = promote_to.is_none()
            && moving.piece_type == PieceType::Pawn
            && end.row == moving.color.promotion_row();

        let mut moves = self.moves.clone();
        moves.push(played);

        Board {
            pieces: change.pieces,
            captured_by_white,
            captured_by_black,
            promotion_position: promotion_pending.then_some(end),
            moves,
        }
    }

    /// Resolve a pending promotion.
    ///
    /// The pawn on `position` becomes `to`, and the last ply in the history is
    /// replaced by the same ply with the promotion and fresh check flags.
    ///
    /// # Panics
    ///
    /// Panics if `position` is empty.
    pub fn promote_pawn(&self, position: Position, to: PieceType) -> Board {
        let Some(pawn) = self.piece_at(position) else {
            panic!("no piece to promote at {position}");
        };

        let mut pieces = self.pieces;
        pieces[position.row][position.col] = Some(Piece {
            piece_type: to,
            ..pawn
        });

        let mut moves = self.moves.clone();
        if let Some(last) = moves.pop() {
            let opponent = pawn.color.opposite();
            let probe = Board::probe(pieces, last.clone());
            let is_check = probe.is_king_in_check(opponent);
            let is_checkmate = probe.is_checkmate(opponent);
            moves.push(last.with_promotion(to, is_check, is_checkmate));
        }

        Board {
            pieces,
            captured_by_white: self.captured_by_white.clone(),
            captured_by_black: self.captured_by_black.clone(),
            promotion_position: None,
            moves,
        }
    }

    /// Board used only to ask questions about a hypothetical position.
    /// Carries the grid and the ply that produced it, nothing else.
    fn probe(pieces: Grid, last: Move) -> Board {
        Board {
            pieces,
            moves: vec![last],
            ..Board::empty()
        }
    }

    /// Grid-only transition for legality testing. Skips notation, captured
    /// lists and check flags so it can be called from inside those.
    pub(crate) fn simulate(&self, start: Position, end: Position) -> Board {
        let Some(piece) = self.piece_at(start) else {
            return self.clone();
        };
        let change = self.apply_to_grid(start, end, piece, None);
        Board::probe(change.pieces, Move::new(start, end, piece))
    }

    /// Move `moving` from `start` to `end` on a copy of the grid, including the
    /// rook hop of castling and the removal of a pawn taken en passant.
    fn apply_to_grid(
        &self,
        start: Position,
        end: Position,
        moving: Piece,
        promote_to: Option<PieceType>,
    ) -> GridChange {
        let mut pieces = self.pieces;
        let mut captured = self.piece_at(end);

        if moving.piece_type == PieceType::Pawn
            && start.col != end.col
            && captured.is_none()
            && self.is_en_passant(start, end)
        {
            let row = (end.row as i32 - moving.color.forward()) as usize;
            captured = pieces[row][end.col].take();
        }

        let is_castling = moving.piece_type == PieceType::King && start.col.abs_diff(end.col) == 2;
        if is_castling {
            let (rook_start, rook_end) = if end.col > start.col {
                (7, end.col - 1)
            } else {
                (0, end.col + 1)
            };
            let rook = pieces[start.row][rook_start].take();
            pieces[start.row][rook_end] = rook.map(Piece::moved);
        }

        pieces[end.row][end.col] = Some(Piece {
            piece_type: promote_to.unwrap_or(moving.piece_type),
            ..moving.moved()
        });
        pieces[start.row][start.col] = None;

        GridChange {
            pieces,
            captured,
            is_castling,
        }
    }

    /// File and/or rank needed to tell this move apart from the same kind of
    /// piece reaching the same square.
    fn calculate_ambiguity(&self, start: Position, end: Position, moving: Piece) -> String {
        if matches!(moving.piece_type, PieceType::Pawn | PieceType::King) {
            return String::new();
        }

        let alternatives: Vec<Position> = Position::all()
            .filter(|&pos| pos != start)
            .filter(|&pos| {
                self.piece_at(pos)
                    .is_some_and(|p| p.is(moving.piece_type, moving.color))
            })
            .filter(|&pos| self.is_valid_move(pos, end))
            .collect();

        if alternatives.is_empty() {
            return String::new();
        }

        let same_file = alternatives.iter().any(|pos| pos.col == start.col);
        let same_rank = alternatives.iter().any(|pos| pos.row == start.row);
        match (same_file, same_rank) {
            (true, true) => start.to_string(),
            (true, false) => start.rank_char().to_string(),
            _ => start.file_char().to_string(),
        }
    }

    fn find_king(&self, color: PieceColor) -> Option<Position> {
        Position::all().find(|&pos| {
            self.piece_at(pos)
                .is_some_and(|p| p.is(PieceType::King, color))
        })
    }

    /// Squares holding a piece of `color`
    pub(crate) fn squares_of(&self, color: PieceColor) -> impl Iterator<Item = Position> + '_ {
        Position::all().filter(move |&pos| self.piece_at(pos).is_some_and(|p| p.color == color))
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}
