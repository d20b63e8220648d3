//! Board model for the 3x3 grid: cell states, mark placement, and
//! win/draw detection over the fixed set of eight win patterns.

use std::fmt;

/// One of the two sides. `First` always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    First,
    Second,
}

impl Player {
    /// Returns the other side.
    pub fn opponent(self) -> Player {
        match self {
            Player::First => Player::Second,
            Player::Second => Player::First,
        }
    }

    /// The mark drawn for this side.
    pub fn mark(self) -> char {
        match self {
            Player::First => 'X',
            Player::Second => 'O',
        }
    }

    /// Array index for per-player storage (name, control mode).
    pub fn index(self) -> usize {
        match self {
            Player::First => 0,
            Player::Second => 1,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mark())
    }
}

/// A board cell: empty or marked by one player.
pub type Cell = Option<Player>;

/// The eight winning index triples: rows, then columns, then diagonals.
/// Scanned in this order, so the first completed line is the one reported.
pub const WIN_PATTERNS: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Errors that can occur when placing a mark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidMove {
    /// Index is outside the 0..=8 range
    OutOfRange(usize),
    /// The target cell already holds a mark
    Occupied(usize),
}

impl fmt::Display for InvalidMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidMove::OutOfRange(i) => write!(f, "cell index {} is out of range", i),
            InvalidMove::Occupied(i) => write!(f, "cell {} is already occupied", i),
        }
    }
}

impl std::error::Error for InvalidMove {}

/// The 3x3 board as a fixed-size value type.
///
/// Cells are indexed 0..=8, row-major (index = row * 3 + col). The board
/// is `Copy`, so the search engine works on scratch copies and can never
/// mutate the caller's board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Board {
    cells: [Cell; 9],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Board { cells: [None; 9] }
    }

    /// Returns the cell at `index`, or `None` for an out-of-range index.
    pub fn cell(&self, index: usize) -> Cell {
        self.cells.get(index).copied().flatten()
    }

    /// Places `player`'s mark at `index`.
    pub fn apply_mark(&mut self, index: usize, player: Player) -> Result<(), InvalidMove> {
        let cell = self
            .cells
            .get_mut(index)
            .ok_or(InvalidMove::OutOfRange(index))?;
        if cell.is_some() {
            return Err(InvalidMove::Occupied(index));
        }
        *cell = Some(player);
        Ok(())
    }

    /// Returns a copy of the board with `player`'s mark placed at `index`.
    pub fn with_mark(self, index: usize, player: Player) -> Result<Board, InvalidMove> {
        let mut next = self;
        next.apply_mark(index, player)?;
        Ok(next)
    }

    /// Returns the winner together with the completed line, if any.
    ///
    /// Patterns are checked in the fixed `WIN_PATTERNS` order; under
    /// alternating play at most one player can hold a line, so the order
    /// only decides which cells are reported for highlighting.
    pub fn winning_line(&self) -> Option<(Player, [usize; 3])> {
        WIN_PATTERNS.iter().find_map(|&line| {
            let [a, b, c] = line;
            match (self.cells[a], self.cells[b], self.cells[c]) {
                (Some(p), Some(q), Some(r)) if p == q && q == r => Some((p, line)),
                _ => None,
            }
        })
    }

    /// Returns the player owning three in a row, if any.
    pub fn winner(&self) -> Option<Player> {
        self.winning_line().map(|(player, _)| player)
    }

    /// True when no empty cell remains.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_some())
    }

    /// True when the game can no longer continue from this board.
    pub fn is_terminal(&self) -> bool {
        self.winner().is_some() || self.is_full()
    }

    /// Iterates over the indices of all empty cells, ascending.
    pub fn empty_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(index, _)| index)
    }

    /// Number of marks placed so far.
    pub fn mark_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..3 {
            for col in 0..3 {
                let c = match self.cells[row * 3 + col] {
                    Some(player) => player.mark(),
                    None => '.',
                };
                write!(f, "{}", c)?;
                if col < 2 {
                    write!(f, " ")?;
                }
            }
            if row < 2 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
