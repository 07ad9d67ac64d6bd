//! Game model
//!
//! Board state, win/draw evaluation and move outcomes. Nothing in here knows
//! about connections or turn order.

pub mod board;
pub mod results;
pub mod rules;

pub use board::{Board, CELL_COUNT, Cell, Mark, Square};
pub use results::{GameStatus, MoveOutcome};
pub use rules::{LINES, check_win, evaluate, is_full};
