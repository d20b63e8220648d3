//! # Search Engine - Computer Move Selection
//!
//! Exhaustive adversarial search over the 3x3 board. The board is small
//! enough that full-depth minimax is always tractable, so no pruning is
//! used. Scores are depth-aware: a win in fewer plies scores higher and
//! a loss in more plies scores less negative, which biases the computer
//! toward the quickest win and the slowest loss.
//!
//! All randomness (random fallback moves, the difficulty draw) flows
//! through a caller-supplied [`rand::Rng`], so computer behavior is
//! reproducible under a fixed seed.

use crate::board::{Board, Player};
use rand::Rng;
use std::str::FromStr;

/// Difficulty level for the computer opponent.
///
/// Each level maps to the probability that the computer plays the
/// minimax-optimal move instead of a uniformly random one. The draw
/// happens once per computer turn, independently of prior turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    /// Always random
    Easy,
    /// 70% optimal / 30% random
    Medium,
    /// 90% optimal / 10% random
    Hard,
    /// Always optimal
    Impossible,
}

impl Difficulty {
    /// Probability of playing the optimal move at this level.
    pub fn optimal_probability(self) -> f64 {
        match self {
            Difficulty::Easy => 0.0,
            Difficulty::Medium => 0.7,
            Difficulty::Hard => 0.9,
            Difficulty::Impossible => 1.0,
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "impossible" => Ok(Difficulty::Impossible),
            other => Err(format!(
                "unknown difficulty '{}' (expected easy, medium, hard or impossible)",
                other
            )),
        }
    }
}

/// Returns the minimax-optimal cell for `computer`, or `None` if the
/// board has no empty cell left.
///
/// Cells are scanned in ascending index order and the first strictly
/// greater score wins, so ties resolve to the lowest-index optimal cell.
pub fn best_move(board: Board, computer: Player) -> Option<usize> {
    let mut best_score = i32::MIN;
    let mut best_index = None;

    for index in 0..9 {
        let Ok(child) = board.with_mark(index, computer) else {
            continue;
        };
        let score = minimax(child, 0, false, computer);
        if score > best_score {
            best_score = score;
            best_index = Some(index);
        }
    }

    best_index
}

/// Evaluates a position for `computer`, alternating the maximizing role
/// between the two sides.
///
/// `depth` counts plies from the search root, not from game start: a
/// terminal leaf scores `10 - depth` for a computer win, `depth - 10`
/// for an opponent win, and `0` for a draw.
fn minimax(board: Board, depth: i32, maximizing: bool, computer: Player) -> i32 {
    if let Some(winner) = board.winner() {
        return if winner == computer {
            10 - depth
        } else {
            depth - 10
        };
    }
    if board.is_full() {
        return 0;
    }

    let mover = if maximizing {
        computer
    } else {
        computer.opponent()
    };
    let mut best = if maximizing { i32::MIN } else { i32::MAX };

    for index in 0..9 {
        let Ok(child) = board.with_mark(index, mover) else {
            continue;
        };
        let score = minimax(child, depth + 1, !maximizing, computer);
        best = if maximizing {
            best.max(score)
        } else {
            best.min(score)
        };
    }

    best
}

/// Uniformly selects one of the empty cells, or `None` if the board is full.
pub fn random_move(board: Board, rng: &mut impl Rng) -> Option<usize> {
    let open: Vec<usize> = board.empty_cells().collect();
    if open.is_empty() {
        None
    } else {
        Some(open[rng.random_range(0..open.len())])
    }
}

/// Selects the computer's move for one turn at the given difficulty.
pub fn choose_move(
    board: Board,
    computer: Player,
    difficulty: Difficulty,
    rng: &mut impl Rng,
) -> Option<usize> {
    if rng.random_bool(difficulty.optimal_probability()) {
        best_move(board, computer)
    } else {
        random_move(board, rng)
    }
}
