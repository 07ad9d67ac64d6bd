//! Module `commands`
//!
//! Decodes the single client command: a line holding the index of the cell
//! the player wants to mark.

use crate::error::ProtocolError;
use crate::game::Cell;

/// Parses a raw client line into a board cell.
///
/// Surrounding whitespace (including a trailing `\r`) is ignored. Anything
/// other than a decimal integer in `0..=8` is rejected.
pub fn parse_move(raw: &str) -> Result<Cell, ProtocolError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ProtocolError::Empty);
    }

    let index: i64 = trimmed
        .parse()
        .map_err(|_| ProtocolError::NotANumber(trimmed.to_string()))?;

    usize::try_from(index)
        .ok()
        .and_then(Cell::new)
        .ok_or(ProtocolError::OutOfRange(index))
}
