//! src/board.rs
//!
//! The pure 3x3 grid. No I/O, no async, no knowledge of peers or sessions —
//! just the rules of the game. Callers (the Peer core) are responsible for
//! serializing access; see the session lock in `peer::state`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two players' marks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    /// The symbol the opponent holds in a two-player session.
    pub fn opposite(self) -> Symbol {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::X => write!(f, "X"),
            Symbol::O => write!(f, "O"),
        }
    }
}

/// The contents of a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cell {
    Empty,
    Mark(Symbol),
}

/// The outcome of a completed or in-progress game, as returned by
/// `Board::check`. Carried wire-side in `updateMove` as the `result` field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    InProgress,
    Win(Symbol),
    Draw,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Outcome::InProgress)
    }
}

/// A 3x3 tic-tac-toe grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    cells: [[Cell; 3]; 3],
}

impl Default for Board {
    fn default() -> Self {
        Self {
            cells: [[Cell::Empty; 3]; 3],
        }
    }
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets all cells empty.
    pub fn reset(&mut self) {
        self.cells = [[Cell::Empty; 3]; 3];
    }

    /// 0 <= row,col <= 2 and the cell is empty.
    pub fn is_valid(&self, row: usize, col: usize) -> bool {
        row < 3 && col < 3 && self.cells[row][col] == Cell::Empty
    }

    /// Precondition: `is_valid(row, col)`. Places `symbol` in the cell.
    pub fn apply(&mut self, row: usize, col: usize, symbol: Symbol) {
        debug_assert!(self.is_valid(row, col), "apply called on an invalid cell");
        self.cells[row][col] = Cell::Mark(symbol);
    }

    /// Returns the winner, a draw, or in-progress. Row/column lines are
    /// scanned before diagonals; diagonals are only considered when the
    /// center cell is non-empty (a cheap short-circuit, since every
    /// diagonal win passes through the center).
    pub fn check(&self) -> Outcome {
        for row in 0..3 {
            if let Some(s) = Self::line_winner([self.cells[row][0], self.cells[row][1], self.cells[row][2]]) {
                return Outcome::Win(s);
            }
        }
        for col in 0..3 {
            if let Some(s) = Self::line_winner([self.cells[0][col], self.cells[1][col], self.cells[2][col]]) {
                return Outcome::Win(s);
            }
        }
        if self.cells[1][1] != Cell::Empty {
            if let Some(s) = Self::line_winner([self.cells[0][0], self.cells[1][1], self.cells[2][2]]) {
                return Outcome::Win(s);
            }
            if let Some(s) = Self::line_winner([self.cells[0][2], self.cells[1][1], self.cells[2][0]]) {
                return Outcome::Win(s);
            }
        }
        if self.cells.iter().flatten().all(|c| *c != Cell::Empty) {
            return Outcome::Draw;
        }
        Outcome::InProgress
    }

    fn line_winner(line: [Cell; 3]) -> Option<Symbol> {
        match (line[0], line[1], line[2]) {
            (Cell::Mark(a), Cell::Mark(b), Cell::Mark(c)) if a == b && b == c => Some(a),
            _ => None,
        }
    }

    /// Textual grid, rows separated by a line of five dashes.
    pub fn render(&self) -> String {
        let row_str = |row: [Cell; 3]| {
            row.iter()
                .map(|c| match c {
                    Cell::Empty => ' ',
                    Cell::Mark(Symbol::X) => 'X',
                    Cell::Mark(Symbol::O) => 'O',
                })
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join("|")
        };
        let mut out = String::new();
        for (i, row) in self.cells.iter().enumerate() {
            out.push_str(&row_str(*row));
            if i < 2 {
                out.push('\n');
                out.push_str("-----");
                out.push('\n');
            }
        }
        out
    }
}
