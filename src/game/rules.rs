//! Win and draw evaluation.

use crate::game::board::{Board, Mark, Square};
use crate::game::results::GameStatus;

/// The eight winning triples: rows, columns, then diagonals.
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Returns true if `mark` fills any of the eight lines.
pub fn check_win(board: &Board, mark: Mark) -> bool {
    let squares = board.squares();
    let target = Square::Marked(mark);
    LINES
        .iter()
        .any(|[a, b, c]| squares[*a] == target && squares[*b] == target && squares[*c] == target)
}

/// Returns true if no square is empty, whoever holds them.
pub fn is_full(board: &Board) -> bool {
    board.squares().iter().all(|square| *square != Square::Empty)
}

/// Evaluates the board right after `mover` placed a mark: win first, then draw.
pub fn evaluate(board: &Board, mover: Mark) -> GameStatus {
    if check_win(board, mover) {
        GameStatus::Won(mover)
    } else if is_full(board) {
        GameStatus::Draw
    } else {
        GameStatus::InProgress
    }
}
