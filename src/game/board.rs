//! Module `board`
//!
//! Defines the 3x3 grid, the cells it is made of and the marks players
//! place on it.

use std::fmt;

use crate::error::BoardError;

/// Number of cells on the board.
pub const CELL_COUNT: usize = 9;

/// The symbol a seat places on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn as_str(self) -> &'static str {
        match self {
            Mark::X => "X",
            Mark::O => "O",
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated cell index in `0..CELL_COUNT`, row-major from the top left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell(u8);

impl Cell {
    /// Returns `None` when `index` is off the board.
    pub fn new(index: usize) -> Option<Self> {
        if index < CELL_COUNT {
            Some(Cell(index as u8))
        } else {
            None
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Contents of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Square {
    #[default]
    Empty,
    Marked(Mark),
}

/// The authoritative game grid.
///
/// A square only ever goes from `Empty` to `Marked`; `place` refuses to
/// overwrite, and there is no way to clear a square.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Board {
    squares: [Square; CELL_COUNT],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, cell: Cell) -> Square {
        self.squares[cell.index()]
    }

    /// Places `mark` on `cell`, failing if the cell already holds a mark.
    pub fn place(&mut self, cell: Cell, mark: Mark) -> Result<(), BoardError> {
        match self.squares[cell.index()] {
            Square::Empty => {
                self.squares[cell.index()] = Square::Marked(mark);
                Ok(())
            }
            Square::Marked(existing) => Err(BoardError::Occupied {
                cell,
                mark: existing,
            }),
        }
    }

    pub fn squares(&self) -> &[Square; CELL_COUNT] {
        &self.squares
    }

    /// Number of marks placed so far.
    pub fn marks_placed(&self) -> usize {
        self.squares
            .iter()
            .filter(|square| **square != Square::Empty)
            .count()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, square) in self.squares.iter().enumerate() {
            let symbol = match square {
                Square::Empty => ".",
                Square::Marked(mark) => mark.as_str(),
            };
            f.write_str(symbol)?;
            if index % 3 == 2 && index + 1 < CELL_COUNT {
                f.write_str("/")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(index: usize) -> Cell {
        Cell::new(index).unwrap()
    }

    #[test]
    fn test_cell_bounds() {
        assert!(Cell::new(0).is_some());
        assert!(Cell::new(8).is_some());
        assert!(Cell::new(9).is_none());
        assert_eq!(Cell::new(8).unwrap().index(), CELL_COUNT - 1);
    }

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new();
        assert_eq!(board.marks_placed(), 0);
        assert!(board.squares().iter().all(|square| *square == Square::Empty));
    }

    #[test]
    fn test_place_marks_cell() {
        let mut board = Board::new();
        board.place(cell(4), Mark::X).unwrap();
        assert_eq!(board.get(cell(4)), Square::Marked(Mark::X));
        assert_eq!(board.marks_placed(), 1);
    }

    #[test]
    fn test_place_on_occupied_cell_is_refused() {
        let mut board = Board::new();
        board.place(cell(0), Mark::X).unwrap();

        let err = board.place(cell(0), Mark::O).unwrap_err();
        assert_eq!(
            err,
            BoardError::Occupied {
                cell: cell(0),
                mark: Mark::X
            }
        );
        // Square keeps its first mark.
        assert_eq!(board.get(cell(0)), Square::Marked(Mark::X));

        // Same mark twice is refused as well.
        assert!(board.place(cell(0), Mark::X).is_err());
        assert_eq!(board.marks_placed(), 1);
    }

    #[test]
    fn test_display() {
        let mut board = Board::new();
        board.place(cell(0), Mark::X).unwrap();
        board.place(cell(4), Mark::O).unwrap();
        assert_eq!(board.to_string(), "X../.O./...");
    }
}
