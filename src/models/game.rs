//! Game state model - the application layer over immutable boards.
//!
//! Holds the snapshot history, enforces turn order and the pending-promotion
//! gate, and knows whether the engine is due to move.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Difficulty;
use crate::domain::{
    Board, GameHistory, Piece, PieceColor, PieceType, Position, SnapshotId, UciMove,
};
use crate::error::{GameError, GameResult};

/// Who is playing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameMode {
    /// Two people share the board
    TwoPlayer,
    /// One person against the engine
    VsEngine {
        human: PieceColor,
        difficulty: Difficulty,
    },
}

/// Check state of the viewed position
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum GameStatus {
    Ongoing,
    /// The given side is in check
    Check { side: PieceColor },
    Checkmate { winner: PieceColor },
}

impl GameStatus {
    pub fn is_over(self) -> bool {
        matches!(self, GameStatus::Checkmate { .. })
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::Ongoing => Ok(()),
            GameStatus::Check { .. } => write!(f, "Check!"),
            GameStatus::Checkmate { winner } => write!(f, "Checkmate! {winner} wins."),
        }
    }
}

/// The main game model
pub struct GameModel {
    history: GameHistory,
    mode: GameMode,
}

impl GameModel {
    pub fn new(mode: GameMode) -> Self {
        Self::from_board(mode, Board::initial())
    }

    /// Start from an arbitrary position
    pub fn from_board(mode: GameMode, board: Board) -> Self {
        Self {
            history: GameHistory::from_board(board),
            mode,
        }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn history(&self) -> &GameHistory {
        &self.history
    }

    /// The currently viewed board
    pub fn board(&self) -> &Board {
        self.history.current()
    }

    /// Side to move in the viewed position
    pub fn turn(&self) -> PieceColor {
        self.board().side_to_move()
    }

    pub fn status(&self) -> GameStatus {
        let board = self.board();
        for color in [PieceColor::White, PieceColor::Black] {
            if board.is_checkmate(color) {
                return GameStatus::Checkmate {
                    winner: color.opposite(),
                };
            }
        }
        for color in [PieceColor::White, PieceColor::Black] {
            if board.is_king_in_check(color) {
                return GameStatus::Check { side: color };
            }
        }
        GameStatus::Ongoing
    }

    /// Either king is checkmated
    pub fn is_game_over(&self) -> bool {
        self.status().is_over()
    }

    pub fn promotion_pending(&self) -> bool {
        self.board().promotion_position().is_some()
    }

    /// Try to make a move from one square to another.
    ///
    /// Returns `Ok(false)` for an illegal move, leaving the game untouched.
    /// Moving the wrong color, moving before a pending promotion is chosen,
    /// or moving after mate are errors. When a pawn reaches the last rank
    /// without `promotion`, the move is played and the choice stays pending
    /// until [`GameModel::promote`].
    ///
    /// Playing while viewing an earlier snapshot discards the later ones.
    pub fn try_move(
        &mut self,
        from: Position,
        to: Position,
        promotion: Option<PieceType>,
    ) -> GameResult<bool> {
        let board = self.board();
        if board.promotion_position().is_some() {
            return Err(GameError::PromotionPending);
        }
        if self.is_game_over() {
            return Err(GameError::GameOver);
        }
        let Some(piece) = board.piece_at(from) else {
            return Ok(false);
        };
        if piece.color != board.side_to_move() {
            return Err(GameError::NotYourTurn(piece.color));
        }
        if let Some(choice) = promotion {
            check_promotion_choice(choice)?;
            if !reaches_promotion(piece, to) {
                debug!(%from, %to, ?choice, "promotion piece given for a non-promoting move");
                return Ok(false);
            }
        }
        if !board.is_valid_move(from, to) {
            debug!(%from, %to, "rejected illegal move");
            return Ok(false);
        }

        let next = board.move_piece(from, to, promotion);
        if let Some(played) = next.last_move() {
            debug!(san = %played, "move played");
        }
        self.history.push(next);
        self.log_if_over();
        Ok(true)
    }

    /// Choose the piece for the pending promotion
    pub fn promote(&mut self, to: PieceType) -> GameResult<()> {
        let Some(position) = self.board().promotion_position() else {
            return Err(GameError::NoPromotionPending);
        };
        check_promotion_choice(to)?;

        let promoted = self.board().promote_pawn(position, to);
        if let Some(played) = promoted.last_move() {
            debug!(san = %played, "promotion chosen");
        }
        self.history.replace_current(promoted);
        self.log_if_over();
        Ok(())
    }

    /// Play a move given in UCI form. A promotion suffix resolves the
    /// promotion the move creates.
    pub fn play_uci(&mut self, uci: UciMove) -> GameResult<bool> {
        let promotes = self
            .board()
            .piece_at(uci.from)
            .is_some_and(|piece| reaches_promotion(piece, uci.to));
        if uci.promotion.is_some() && !promotes {
            debug!(%uci, "promotion suffix on a non-promoting move");
            return Ok(false);
        }
        if !self.try_move(uci.from, uci.to, None)? {
            return Ok(false);
        }
        if let Some(to) = uci.promotion.filter(|_| self.promotion_pending()) {
            self.promote(to)?;
        }
        Ok(true)
    }

    /// Whether the engine should be asked for a move now
    pub fn is_engine_turn(&self) -> bool {
        match self.mode {
            GameMode::TwoPlayer => false,
            GameMode::VsEngine { human, .. } => {
                !self.promotion_pending() && !self.is_game_over() && self.turn() != human
            }
        }
    }

    /// Apply the engine's answer. Its move is re-checked for legality; a
    /// missing promotion suffix becomes a queen.
    pub fn apply_engine_move(&mut self, uci: UciMove) -> GameResult<()> {
        let illegal = || GameError::IllegalEngineMove {
            uci: uci.to_string(),
        };
        match self.play_uci(uci) {
            Ok(true) => {}
            Ok(false) | Err(GameError::NotYourTurn(_)) => {
                warn!(%uci, "engine suggested an illegal move");
                return Err(illegal());
            }
            Err(err) => return Err(err),
        }
        if self.promotion_pending() {
            self.promote(PieceType::Queen)?;
        }
        Ok(())
    }

    pub fn current_id(&self) -> SnapshotId {
        self.history.current_id()
    }

    pub fn go_to(&mut self, id: SnapshotId) -> bool {
        self.history.go_to(id)
    }

    /// Go to the starting position
    pub fn go_to_start(&mut self) {
        self.history.go_to_root();
    }

    pub fn go_to_end(&mut self) {
        self.history.go_to_end();
    }

    /// Go back one move
    pub fn go_back(&mut self) -> bool {
        self.history.go_back()
    }

    /// Go forward one move
    pub fn go_forward(&mut self) -> bool {
        self.history.go_forward()
    }

    /// Check if we're viewing the newest position
    pub fn is_at_leaf(&self) -> bool {
        self.history.is_at_leaf()
    }

    fn log_if_over(&self) {
        if let GameStatus::Checkmate { winner } = self.status() {
            info!(%winner, "checkmate");
        }
    }
}

impl Default for GameModel {
    fn default() -> Self {
        Self::new(GameMode::TwoPlayer)
    }
}

/// A pawn landing on its last rank
fn reaches_promotion(piece: Piece, to: Position) -> bool {
    piece.piece_type == PieceType::Pawn && to.row == piece.color.promotion_row()
}

fn check_promotion_choice(to: PieceType) -> GameResult<()> {
    match to {
        PieceType::King | PieceType::Pawn => Err(GameError::InvalidPromotion(to)),
        _ => Ok(()),
    }
}
