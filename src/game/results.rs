//! Result types for game evaluation and committed moves.

use crate::game::board::{Cell, Mark};

/// Board status after evaluating the latest placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Won(Mark),
    Draw,
}

/// Outcome of submitting a move through the turn gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Mark placed, turn passed to the opponent.
    Valid,
    /// Cell already occupied; nothing changed and the mover keeps the turn.
    Invalid,
    /// Mark placed and it completed a line.
    Win(Cell),
    /// Mark placed and it filled the board without a line.
    Draw,
}

impl MoveOutcome {
    /// True if the move ended the game.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MoveOutcome::Win(_) | MoveOutcome::Draw)
    }
}
