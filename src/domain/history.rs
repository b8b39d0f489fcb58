//! Linear chain of board snapshots with a viewing cursor.
//!
//! Boards never change once built, so going back is just looking at an
//! earlier snapshot. Playing a move while looking at an earlier snapshot
//! discards everything after it.

use super::board::Board;

/// Index of a snapshot; 0 is the starting position
pub type SnapshotId = usize;

#[derive(Clone, Debug)]
pub struct GameHistory {
    snapshots: Vec<Board>,
    current_id: SnapshotId,
}

impl GameHistory {
    /// A history holding only the standard starting position
    pub fn new() -> Self {
        Self::from_board(Board::initial())
    }

    pub fn from_board(board: Board) -> Self {
        Self {
            snapshots: vec![board],
            current_id: 0,
        }
    }

    pub fn get(&self, id: SnapshotId) -> Option<&Board> {
        self.snapshots.get(id)
    }

    /// The snapshot being looked at
    pub fn current(&self) -> &Board {
        &self.snapshots[self.current_id]
    }

    pub fn current_id(&self) -> SnapshotId {
        self.current_id
    }

    /// The newest snapshot
    pub fn latest(&self) -> &Board {
        &self.snapshots[self.snapshots.len() - 1]
    }

    pub fn go_to(&mut self, id: SnapshotId) -> bool {
        if id < self.snapshots.len() {
            self.current_id = id;
            true
        } else {
            false
        }
    }

    pub fn go_to_root(&mut self) {
        self.current_id = 0;
    }

    pub fn go_back(&mut self) -> bool {
        if self.current_id > 0 {
            self.current_id -= 1;
            true
        } else {
            false
        }
    }

    pub fn go_forward(&mut self) -> bool {
        self.go_to(self.current_id + 1)
    }

    pub fn go_to_end(&mut self) {
        self.current_id = self.snapshots.len() - 1;
    }

    pub fn is_at_root(&self) -> bool {
        self.current_id == 0
    }

    pub fn is_at_leaf(&self) -> bool {
        self.current_id == self.snapshots.len() - 1
    }

    /// Record a board that follows the current one and move the cursor to it.
    /// Snapshots after the cursor are dropped.
    pub fn push(&mut self, board: Board) -> SnapshotId {
        self.snapshots.truncate(self.current_id + 1);
        self.snapshots.push(board);
        self.current_id = self.snapshots.len() - 1;
        self.current_id
    }

    /// Swap the current snapshot for a completed version of the same ply,
    /// as happens when a pending promotion is resolved.
    pub fn replace_current(&mut self, board: Board) {
        self.snapshots.truncate(self.current_id + 1);
        self.snapshots[self.current_id] = board;
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Only the starting snapshot is present
    pub fn is_empty(&self) -> bool {
        self.snapshots.len() == 1
    }
}

impl Default for GameHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chess::Position;

    fn advance(history: &mut GameHistory, from: &str, to: &str) -> SnapshotId {
        let board = history.current().move_piece(
            Position::from_algebraic(from).unwrap(),
            Position::from_algebraic(to).unwrap(),
            None,
        );
        history.push(board)
    }

    #[test]
    fn test_new_history() {
        let history = GameHistory::new();
        assert_eq!(history.len(), 1);
        assert!(history.is_empty());
        assert!(history.is_at_root());
        assert!(history.is_at_leaf());
    }

    #[test]
    fn test_push() {
        let mut history = GameHistory::new();
        assert_eq!(advance(&mut history, "e2", "e4"), 1);
        assert_eq!(advance(&mut history, "e7", "e5"), 2);
        assert_eq!(history.current_id(), 2);
        assert_eq!(history.current().moves().len(), 2);
    }

    #[test]
    fn test_navigation() {
        let mut history = GameHistory::new();
        advance(&mut history, "e2", "e4");
        advance(&mut history, "e7", "e5");

        assert!(history.go_back());
        assert_eq!(history.current_id(), 1);
        assert_eq!(history.current().moves().len(), 1);

        assert!(history.go_back());
        assert!(!history.go_back());

        assert!(history.go_forward());
        assert_eq!(history.current_id(), 1);

        history.go_to_end();
        assert!(history.is_at_leaf());
        assert!(!history.go_forward());
        assert!(!history.go_to(3));
    }

    #[test]
    fn test_push_from_earlier_snapshot_truncates() {
        let mut history = GameHistory::new();
        advance(&mut history, "e2", "e4");
        advance(&mut history, "e7", "e5");
        history.go_to_root();

        let id = advance(&mut history, "d2", "d4");
        assert_eq!(id, 1);
        assert_eq!(history.len(), 2);
        assert_eq!(history.latest().last_move().unwrap().to_string(), "d4");
    }
}
