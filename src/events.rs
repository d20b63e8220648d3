//! Presentation adapter boundary.
//!
//! The core's only outward surface: after every state change it queues a
//! [`GameEvent`] that the rendering/audio layer drains and reflects.
//! Playback and drawing happen entirely outside this crate.

use crate::board::{Board, Player};
use crate::game::{Phase, ScoreBoard};

/// Full view of the game state pushed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSnapshot {
    /// Board contents at the time of the change
    pub board: Board,
    /// Side whose turn it is (meaningful only while in progress)
    pub active: Player,
    /// Current game phase
    pub phase: Phase,
    /// Session score tally
    pub scores: ScoreBoard,
    /// Whether the undo action should be offered
    pub undo_enabled: bool,
    /// The completed triple to highlight, present only on a win
    pub winning_line: Option<[usize; 3]>,
}

/// Named audio cues the core requests; playback is external.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// First player placed a mark
    MarkFirst,
    /// Second player placed a mark
    MarkSecond,
    /// Game ended in a win for the local/human perspective
    Win,
    /// Game ended in a loss against the computer
    Lose,
    /// Game ended in a draw
    Draw,
}

/// Outbound notifications emitted by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// The game state changed; carries a complete snapshot
    StateChanged(StateSnapshot),
    /// Request to play a named audio cue
    Sound(SoundCue),
}
