//! # Game State Machine - Central Game State Management
//!
//! This module provides [`Game`], the single owner of the authoritative
//! game state. It ensures proper separation between:
//!
//! - **Authoritative game state**: the board, phase, scores and undo
//!   history owned by the state machine
//! - **Search scratch states**: board copies handed to the search engine
//!   for the duration of one call
//! - **Presentation views**: snapshots queued as events for the UI
//!
//! All invalid inputs degrade to silent no-ops: the UI is expected to
//! prevent most of them, but the core rejects them idempotently rather
//! than crashing.
//!
//! ## Deferred computer reply
//! The state machine never computes the computer's move synchronously
//! inside `make_move`. When the turn passes to a computer-controlled
//! side it records a [`PendingReply`] due after a randomized thinking
//! delay, and the driver polls [`Game::update`]. A pending reply carries
//! the turn counter it was scheduled for; if any mutation (undo,
//! restart, mode switch) advances the counter before the reply fires,
//! the reply is discarded on reconciliation instead of being applied to
//! a state it was not computed for.

use crate::board::{Board, Player};
use crate::events::{GameEvent, SoundCue, StateSnapshot};
use crate::search::{self, Difficulty};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Thinking-delay bounds for the computer's deferred reply, in ms.
const MIN_THINK_MS: u64 = 500;
const MAX_THINK_MS: u64 = 1500;

/// Current game phase. `Won` and `Drawn` are terminal: no move, undo or
/// further mutation is accepted until an explicit restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    InProgress,
    Won(Player),
    Drawn,
}

impl Phase {
    /// True once the game has ended.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Phase::InProgress)
    }
}

/// Session score tally. Persists across restarts, reset only explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreBoard {
    pub first_wins: u32,
    pub second_wins: u32,
    pub draws: u32,
}

impl ScoreBoard {
    /// Total games finished this session.
    pub fn games_played(&self) -> u32 {
        self.first_wins + self.second_wins + self.draws
    }

    /// First player's win percentage over finished games.
    pub fn first_win_rate(&self) -> f64 {
        let games = self.games_played();
        if games == 0 {
            0.0
        } else {
            f64::from(self.first_wins) / f64::from(games) * 100.0
        }
    }
}

/// Who controls a side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Human,
    Computer,
}

/// Game mode: one computer opponent, or two humans at the same board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    SingleOpponent,
    TwoHumans,
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "computer" | "single" => Ok(Mode::SingleOpponent),
            "two-player" | "multiplayer" => Ok(Mode::TwoHumans),
            other => Err(format!(
                "unknown mode '{}' (expected computer or two-player)",
                other
            )),
        }
    }
}

/// Display name and control mode for one side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSlot {
    pub name: String,
    pub control: Control,
}

/// Snapshot pushed onto the undo stack before each move.
#[derive(Debug, Clone, Copy)]
struct HistoryEntry {
    board: Board,
    active: Player,
}

/// A computer reply scheduled for a later point in time.
///
/// `turn` is the value of the monotonic turn counter at scheduling time;
/// the reply is only applied if the counter still matches when it fires.
#[derive(Debug, Clone, Copy)]
struct PendingReply {
    due: Instant,
    turn: u64,
}

/// The game state machine.
///
/// Owns the board, phase, score tally, undo history and player
/// assignment. All mutation paths run to completion on the caller's
/// thread; the only deferred work is the computer's reply, reconciled
/// through [`Game::update`].
pub struct Game<R: Rng> {
    board: Board,
    active: Player,
    phase: Phase,
    mode: Mode,
    difficulty: Difficulty,
    players: [PlayerSlot; 2],
    scores: ScoreBoard,
    history: Vec<HistoryEntry>,
    /// Bumped on every mutation; pending replies are pinned to it.
    turn: u64,
    pending: Option<PendingReply>,
    sound_enabled: bool,
    events: VecDeque<GameEvent>,
    rng: R,
}

impl Game<Xoshiro256StarStar> {
    /// Creates a game in single-opponent mode at medium difficulty,
    /// with the RNG seeded for reproducible computer behavior.
    pub fn new(seed: u64) -> Self {
        Self::with_rng(Xoshiro256StarStar::seed_from_u64(seed))
    }
}

impl<R: Rng> Game<R> {
    /// Creates a game with an explicit random source.
    pub fn with_rng(rng: R) -> Self {
        Game {
            board: Board::new(),
            active: Player::First,
            phase: Phase::InProgress,
            mode: Mode::SingleOpponent,
            difficulty: Difficulty::Medium,
            players: [
                PlayerSlot {
                    name: default_name(Player::First, Mode::SingleOpponent),
                    control: Control::Human,
                },
                PlayerSlot {
                    name: default_name(Player::Second, Mode::SingleOpponent),
                    control: Control::Computer,
                },
            ],
            scores: ScoreBoard::default(),
            history: Vec::new(),
            turn: 0,
            pending: None,
            sound_enabled: true,
            events: VecDeque::new(),
            rng,
        }
    }

    /// Current board.
    pub fn board(&self) -> Board {
        self.board
    }

    /// Side whose turn it is.
    pub fn active_player(&self) -> Player {
        self.active
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Current computer difficulty.
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Session score tally.
    pub fn scores(&self) -> ScoreBoard {
        self.scores
    }

    /// Display name for a side.
    pub fn player_name(&self, player: Player) -> &str {
        &self.players[player.index()].name
    }

    /// True while the active side is computer-controlled and the game is
    /// in progress.
    pub fn is_computer_turn(&self) -> bool {
        self.phase == Phase::InProgress && self.control_of(self.active) == Control::Computer
    }

    /// True when a computer reply is scheduled for the current state.
    pub fn reply_pending(&self) -> bool {
        self.pending
            .is_some_and(|p| p.turn == self.turn && self.phase == Phase::InProgress)
    }

    /// Undo is offered only mid-game with at least one recorded move.
    pub fn undo_enabled(&self) -> bool {
        self.phase == Phase::InProgress && !self.history.is_empty()
    }

    /// Builds a full presentation snapshot of the current state.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            board: self.board,
            active: self.active,
            phase: self.phase,
            scores: self.scores,
            undo_enabled: self.undo_enabled(),
            winning_line: self.board.winning_line().map(|(_, line)| line),
        }
    }

    /// Drains the next queued outbound event, if any.
    pub fn poll_event(&mut self) -> Option<GameEvent> {
        self.events.pop_front()
    }

    /// Places a mark for the active player at `index`.
    ///
    /// Silent no-op when the game is terminal, the cell is occupied, the
    /// index is out of range, or the active side is computer-controlled
    /// (the computer's own moves arrive through [`Game::update`]).
    pub fn make_move(&mut self, index: usize) {
        if self.phase.is_terminal() {
            debug!(index, "move ignored: game is over");
            return;
        }
        if self.control_of(self.active) == Control::Computer {
            debug!(index, "move ignored: computer's turn");
            return;
        }
        self.apply_move(index);
    }

    /// Restores the board and active player to the state before the most
    /// recent move. Silent no-op if the history is empty or the game is
    /// terminal.
    pub fn undo_move(&mut self) {
        if self.phase.is_terminal() {
            debug!("undo ignored: game is over");
            return;
        }
        let Some(entry) = self.history.pop() else {
            debug!("undo ignored: no moves to undo");
            return;
        };
        self.board = entry.board;
        self.active = entry.active;
        self.turn += 1;
        self.emit_state();
    }

    /// Resets board, active player, phase and history for a fresh game.
    /// The score tally is untouched.
    pub fn restart_game(&mut self) {
        self.board = Board::new();
        self.active = Player::First;
        self.phase = Phase::InProgress;
        self.history.clear();
        self.turn += 1;
        self.emit_state();
    }

    /// Zeroes the score tally without touching the board or phase.
    pub fn reset_score(&mut self) {
        self.scores = ScoreBoard::default();
        self.emit_state();
    }

    /// Switches between single-opponent and two-human play. Reassigns
    /// the second side's control mode and default name, then restarts.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        let second = &mut self.players[Player::Second.index()];
        second.control = match mode {
            Mode::SingleOpponent => Control::Computer,
            Mode::TwoHumans => Control::Human,
        };
        second.name = default_name(Player::Second, mode);
        self.restart_game();
    }

    /// Sets the computer's difficulty for subsequent turns.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    /// Sets a side's display name; an empty name restores the default.
    pub fn set_player_name(&mut self, player: Player, name: &str) {
        let trimmed = name.trim();
        self.players[player.index()].name = if trimmed.is_empty() {
            default_name(player, self.mode)
        } else {
            trimmed.to_string()
        };
        self.emit_state();
    }

    /// Enables or disables outbound audio cues.
    pub fn toggle_sound(&mut self) {
        self.sound_enabled = !self.sound_enabled;
    }

    /// Applies a due computer reply, if any.
    ///
    /// Called by the driver whenever time passes. The reply is applied
    /// only after re-validating that the game is still in progress, that
    /// the active side is still computer-controlled, and that no other
    /// mutation happened since the reply was scheduled; a stale reply is
    /// discarded.
    pub fn update(&mut self, now: Instant) {
        let Some(pending) = self.pending else {
            return;
        };
        if now < pending.due {
            return;
        }
        self.pending = None;

        if self.phase.is_terminal()
            || pending.turn != self.turn
            || self.control_of(self.active) != Control::Computer
        {
            debug!(
                scheduled_turn = pending.turn,
                current_turn = self.turn,
                "discarding stale computer reply"
            );
            return;
        }

        let chosen = search::choose_move(self.board, self.active, self.difficulty, &mut self.rng);
        if let Some(index) = chosen {
            debug!(index, "applying computer reply");
            self.apply_move(index);
        }
    }

    fn control_of(&self, player: Player) -> Control {
        self.players[player.index()].control
    }

    /// Shared mutation path for human and computer moves: snapshot for
    /// undo, place the mark, evaluate the terminal condition, and either
    /// finish the game or pass the turn.
    fn apply_move(&mut self, index: usize) {
        let snapshot = HistoryEntry {
            board: self.board,
            active: self.active,
        };
        let mover = self.active;

        if let Err(err) = self.board.apply_mark(index, mover) {
            debug!(%err, "move ignored");
            return;
        }

        self.history.push(snapshot);
        self.turn += 1;
        self.emit_sound(match mover {
            Player::First => SoundCue::MarkFirst,
            Player::Second => SoundCue::MarkSecond,
        });

        if let Some((winner, _)) = self.board.winning_line() {
            self.finish(Phase::Won(winner));
        } else if self.board.is_full() {
            self.finish(Phase::Drawn);
        } else {
            self.active = mover.opponent();
            if self.control_of(self.active) == Control::Computer {
                self.schedule_reply();
            }
        }

        self.emit_state();
    }

    /// Transitions into a terminal phase, updates the tally, clears the
    /// undo history and requests the end-of-game cue.
    fn finish(&mut self, phase: Phase) {
        self.phase = phase;
        self.history.clear();

        match phase {
            Phase::Won(winner) => {
                match winner {
                    Player::First => self.scores.first_wins += 1,
                    Player::Second => self.scores.second_wins += 1,
                }
                info!(winner = %winner, name = self.player_name(winner), "game over");
                let cue = match (self.mode, winner) {
                    (Mode::SingleOpponent, Player::First) => SoundCue::Win,
                    (Mode::SingleOpponent, Player::Second) => SoundCue::Lose,
                    (Mode::TwoHumans, _) => SoundCue::Win,
                };
                self.emit_sound(cue);
            }
            Phase::Drawn => {
                self.scores.draws += 1;
                info!("game over: draw");
                self.emit_sound(SoundCue::Draw);
            }
            Phase::InProgress => {}
        }
    }

    /// Schedules the computer's reply after a randomized thinking delay.
    fn schedule_reply(&mut self) {
        let delay = Duration::from_millis(self.rng.random_range(MIN_THINK_MS..=MAX_THINK_MS));
        debug!(?delay, turn = self.turn, "scheduling computer reply");
        self.pending = Some(PendingReply {
            due: Instant::now() + delay,
            turn: self.turn,
        });
    }

    fn emit_state(&mut self) {
        let snapshot = self.snapshot();
        self.events.push_back(GameEvent::StateChanged(snapshot));
    }

    fn emit_sound(&mut self, cue: SoundCue) {
        if self.sound_enabled {
            self.events.push_back(GameEvent::Sound(cue));
        }
    }
}

fn default_name(player: Player, mode: Mode) -> String {
    match (player, mode) {
        (Player::First, _) => "Player 1".to_string(),
        (Player::Second, Mode::SingleOpponent) => "Computer".to_string(),
        (Player::Second, Mode::TwoHumans) => "Player 2".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn far_future() -> Instant {
        Instant::now() + Duration::from_secs(10)
    }

    fn drain_events<R: Rng>(game: &mut Game<R>) -> Vec<GameEvent> {
        let mut events = Vec::new();
        while let Some(event) = game.poll_event() {
            events.push(event);
        }
        events
    }

    fn two_human_game(seed: u64) -> Game<Xoshiro256StarStar> {
        let mut game = Game::new(seed);
        game.set_mode(Mode::TwoHumans);
        drain_events(&mut game);
        game
    }

    #[test]
    fn test_move_then_undo_round_trips() {
        let mut game = two_human_game(1);
        game.make_move(4);
        assert_eq!(game.board().cell(4), Some(Player::First));
        assert_eq!(game.active_player(), Player::Second);
        assert!(game.undo_enabled());

        game.undo_move();
        assert_eq!(game.board(), Board::new());
        assert_eq!(game.active_player(), Player::First);
        assert!(!game.undo_enabled());
    }

    #[test]
    fn test_occupied_cell_is_silent_noop() {
        let mut game = two_human_game(1);
        game.make_move(4);
        let before = game.board();
        drain_events(&mut game);

        game.make_move(4);
        assert_eq!(game.board(), before);
        assert_eq!(game.active_player(), Player::Second);
        assert!(drain_events(&mut game).is_empty());
    }

    #[test]
    fn test_out_of_range_is_silent_noop() {
        let mut game = two_human_game(1);
        game.make_move(12);
        assert_eq!(game.board(), Board::new());
        assert_eq!(game.active_player(), Player::First);
    }

    #[test]
    fn test_win_updates_phase_and_scores() {
        let mut game = two_human_game(1);
        // X: 0, 1, 2 wins the top row; O: 3, 4
        for index in [0, 3, 1, 4, 2] {
            game.make_move(index);
        }
        assert_eq!(game.phase(), Phase::Won(Player::First));
        assert_eq!(game.scores().first_wins, 1);
        assert!(!game.undo_enabled());

        let snapshot = game.snapshot();
        assert_eq!(snapshot.winning_line, Some([0, 1, 2]));
    }

    #[test]
    fn test_terminal_game_rejects_moves_and_undo() {
        let mut game = two_human_game(1);
        for index in [0, 3, 1, 4, 2] {
            game.make_move(index);
        }
        let board = game.board();
        game.make_move(5);
        game.undo_move();
        assert_eq!(game.board(), board);
        assert_eq!(game.phase(), Phase::Won(Player::First));
    }

    #[test]
    fn test_draw_increments_tally_and_cues() {
        let mut game = two_human_game(1);
        // X O X / X X O / O X O -- full board, no line
        for index in [0, 1, 2, 5, 3, 6, 4, 8, 7] {
            game.make_move(index);
        }
        assert_eq!(game.phase(), Phase::Drawn);
        assert_eq!(game.scores().draws, 1);

        let events = drain_events(&mut game);
        assert!(events.contains(&GameEvent::Sound(SoundCue::Draw)));
    }

    #[test]
    fn test_restart_preserves_scores() {
        let mut game = two_human_game(1);
        for index in [0, 3, 1, 4, 2] {
            game.make_move(index);
        }
        game.restart_game();
        assert_eq!(game.phase(), Phase::InProgress);
        assert_eq!(game.board(), Board::new());
        assert_eq!(game.active_player(), Player::First);
        assert_eq!(game.scores().first_wins, 1);

        game.reset_score();
        assert_eq!(game.scores(), ScoreBoard::default());
    }

    #[test]
    fn test_set_mode_mid_game_clears_board_and_history() {
        let mut game = two_human_game(1);
        game.make_move(0);
        game.make_move(4);
        assert!(game.undo_enabled());

        game.set_mode(Mode::SingleOpponent);
        assert_eq!(game.board(), Board::new());
        assert!(!game.undo_enabled());
        assert_eq!(game.player_name(Player::Second), "Computer");
    }

    #[test]
    fn test_human_move_rejected_on_computer_turn() {
        let mut game = Game::new(2);
        game.make_move(0);
        assert_eq!(game.active_player(), Player::Second);
        assert!(game.reply_pending());

        game.make_move(1);
        assert_eq!(game.board().mark_count(), 1);
    }

    #[test]
    fn test_pending_reply_applies_after_delay() {
        let mut game = Game::new(2);
        game.set_difficulty(Difficulty::Impossible);
        game.make_move(0);

        // Not due yet: the delay is at least 500ms.
        game.update(Instant::now());
        assert_eq!(game.board().mark_count(), 1);

        game.update(far_future());
        assert_eq!(game.board().mark_count(), 2);
        // Optimal answer to a corner opening is the center.
        assert_eq!(game.board().cell(4), Some(Player::Second));
        assert_eq!(game.active_player(), Player::First);
        assert!(!game.reply_pending());
    }

    #[test]
    fn test_stale_reply_discarded_after_restart() {
        let mut game = Game::new(2);
        game.make_move(0);
        assert!(game.reply_pending());

        game.restart_game();
        game.update(far_future());
        assert_eq!(game.board(), Board::new());
        assert_eq!(game.active_player(), Player::First);
    }

    #[test]
    fn test_stale_reply_discarded_after_undo() {
        let mut game = Game::new(2);
        game.make_move(0);
        game.undo_move();

        game.update(far_future());
        assert_eq!(game.board(), Board::new());
        assert_eq!(game.active_player(), Player::First);
    }

    #[test]
    fn test_stale_reply_discarded_after_mode_switch() {
        let mut game = Game::new(2);
        game.make_move(0);
        game.set_mode(Mode::TwoHumans);

        game.update(far_future());
        assert_eq!(game.board(), Board::new());
    }

    #[test]
    fn test_computer_win_emits_lose_cue() {
        let mut game = Game::new(2);
        game.set_difficulty(Difficulty::Impossible);

        // X opens corner, then hands O a winning diagonal: after X 0,
        // O takes the center; X 1 forces the block at 2; X 3 leaves O
        // the immediate win at 6 (2-4-6).
        for index in [0, 1, 3] {
            game.make_move(index);
            game.update(far_future());
        }

        assert_eq!(game.phase(), Phase::Won(Player::Second));
        assert_eq!(game.scores().second_wins, 1);
        let events = drain_events(&mut game);
        assert!(events.contains(&GameEvent::Sound(SoundCue::Lose)));
    }

    #[test]
    fn test_human_win_emits_win_cue_in_two_human_mode() {
        let mut game = two_human_game(1);
        for index in [0, 3, 1, 4, 2] {
            game.make_move(index);
        }
        let events = drain_events(&mut game);
        assert!(events.contains(&GameEvent::Sound(SoundCue::Win)));
    }

    #[test]
    fn test_toggle_sound_suppresses_cues_only() {
        let mut game = two_human_game(1);
        game.toggle_sound();
        game.make_move(0);

        let events = drain_events(&mut game);
        assert!(events
            .iter()
            .all(|e| !matches!(e, GameEvent::Sound(_))));
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::StateChanged(_))));
    }

    #[test]
    fn test_state_change_reports_undo_availability() {
        let mut game = two_human_game(1);
        game.make_move(0);
        let events = drain_events(&mut game);
        let snapshot = events
            .iter()
            .find_map(|e| match e {
                GameEvent::StateChanged(s) => Some(*s),
                _ => None,
            })
            .expect("expected a state change event");
        assert!(snapshot.undo_enabled);
        assert_eq!(snapshot.active, Player::Second);
    }

    #[test]
    fn test_player_name_defaults() {
        let mut game = Game::new(1);
        assert_eq!(game.player_name(Player::Second), "Computer");

        game.set_player_name(Player::First, "Alice");
        assert_eq!(game.player_name(Player::First), "Alice");

        game.set_player_name(Player::First, "   ");
        assert_eq!(game.player_name(Player::First), "Player 1");
    }

    #[test]
    fn test_score_stats() {
        let mut scores = ScoreBoard::default();
        assert_eq!(scores.games_played(), 0);
        assert_eq!(scores.first_win_rate(), 0.0);

        scores.first_wins = 3;
        scores.draws = 1;
        assert_eq!(scores.games_played(), 4);
        assert!((scores.first_win_rate() - 75.0).abs() < f64::EPSILON);
    }
}
