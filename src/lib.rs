//! Core library for a tic-tac-toe game with a minimax computer opponent.
//!
//! The crate is split along the game's natural seams:
//! - [`board`]: the 3x3 grid value type with win/draw detection
//! - [`search`]: exhaustive minimax move selection and the difficulty
//!   policy that mixes in random moves
//! - [`game`]: the state machine owning the authoritative state (turn
//!   order, undo, scoring, the deferred computer reply)
//! - [`events`]: the contract exposed to the presentation layer
//!
//! Rendering, input capture and audio playback live outside this crate;
//! they drive the core through its inbound operations and reflect the
//! [`events::GameEvent`] stream it emits.

pub mod board;
pub mod events;
pub mod game;
pub mod search;

pub use board::{Board, Cell, InvalidMove, Player, WIN_PATTERNS};
pub use events::{GameEvent, SoundCue, StateSnapshot};
pub use game::{Control, Game, Mode, Phase, PlayerSlot, ScoreBoard};
pub use search::{best_move, choose_move, random_move, Difficulty};
