//! # Tic-Tac-Toe Console Driver
//!
//! Thin presentation layer over the core library: reads commands from
//! stdin, forwards them to the game state machine, and reflects the
//! event stream (board snapshots, audio cue requests) on the terminal.
//! While a computer reply is pending it polls the state machine until
//! the thinking delay elapses.
//!
//! ## Usage
//! `play [--mode computer|two-player] [--difficulty easy|medium|hard|impossible] [--seed N]`

use clap::Parser;
use colored::Colorize;
use rand::Rng;
use std::io::{self, BufRead, Write};
use std::thread;
use std::time::{Duration, Instant};
use tictactoe::{Difficulty, Game, GameEvent, Mode, Phase, Player, SoundCue, StateSnapshot};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Game mode: "computer" or "two-player"
    #[clap(short, long, default_value = "computer")]
    mode: String,

    /// Computer difficulty: easy, medium, hard or impossible
    #[clap(short, long, default_value = "medium")]
    difficulty: String,

    /// RNG seed for reproducible computer behavior
    #[clap(short, long)]
    seed: Option<u64>,

    /// Display name for the first player
    #[clap(long)]
    player1: Option<String>,

    /// Display name for the second player
    #[clap(long)]
    player2: Option<String>,
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mode = match args.mode.parse::<Mode>() {
        Ok(mode) => mode,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(2);
        }
    };
    let difficulty = match args.difficulty.parse::<Difficulty>() {
        Ok(difficulty) => difficulty,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(2);
        }
    };
    let seed: u64 = args.seed.unwrap_or_else(|| rand::rng().random());

    let mut game = Game::new(seed);
    game.set_mode(mode);
    game.set_difficulty(difficulty);
    if let Some(name) = &args.player1 {
        game.set_player_name(Player::First, name);
    }
    if let Some(name) = &args.player2 {
        game.set_player_name(Player::Second, name);
    }
    // Discard setup notifications; the first render comes from a fresh
    // snapshot below.
    while game.poll_event().is_some() {}

    println!("{}", "Tic-Tac-Toe".bold());
    println!("Cells are numbered 0-8, left to right, top to bottom.");
    println!("Commands: 0-8, undo, restart, reset-score, sound, quit");
    render(&game.snapshot(), &game);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        // Let a scheduled computer reply fire before prompting again.
        while game.reply_pending() {
            game.update(Instant::now());
            thread::sleep(Duration::from_millis(50));
        }
        reflect_events(&mut game);

        if game.phase().is_terminal() {
            print!("Play again? [y/n] ");
            io::stdout().flush()?;
            let Some(line) = lines.next() else {
                break;
            };
            if line?.trim().eq_ignore_ascii_case("y") {
                game.restart_game();
                reflect_events(&mut game);
                continue;
            }
            break;
        }

        print!(
            "{} ({}) > ",
            game.player_name(game.active_player()),
            game.active_player()
        );
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        match line?.trim() {
            "quit" | "q" => break,
            "undo" => game.undo_move(),
            "restart" => game.restart_game(),
            "reset-score" => game.reset_score(),
            "sound" => game.toggle_sound(),
            "" => {}
            input => match input.parse::<usize>() {
                Ok(index) => game.make_move(index),
                Err(_) => println!("Unrecognized command: {}", input),
            },
        }
        reflect_events(&mut game);
    }

    Ok(())
}

/// Drains queued events: prints requested audio cues, then renders the
/// most recent state snapshot.
fn reflect_events<R: Rng>(game: &mut Game<R>) {
    let mut last_snapshot = None;
    let mut cues = Vec::new();
    while let Some(event) = game.poll_event() {
        match event {
            GameEvent::StateChanged(snapshot) => last_snapshot = Some(snapshot),
            GameEvent::Sound(cue) => cues.push(cue),
        }
    }
    for cue in cues {
        let label = match cue {
            SoundCue::MarkFirst => "mark-x",
            SoundCue::MarkSecond => "mark-o",
            SoundCue::Win => "win",
            SoundCue::Lose => "lose",
            SoundCue::Draw => "draw",
        };
        println!("{}", format!("[audio] {}", label).dimmed());
    }
    if let Some(snapshot) = last_snapshot {
        render(&snapshot, game);
    }
}

fn render<R: Rng>(snapshot: &StateSnapshot, game: &Game<R>) {
    println!();
    for row in 0..3 {
        let mut cells = Vec::new();
        for col in 0..3 {
            let index = row * 3 + col;
            let label = index.to_string();
            let text = match snapshot.board.cell(index) {
                Some(Player::First) => "X".red().bold(),
                Some(Player::Second) => "O".blue().bold(),
                None => label.as_str().dimmed(),
            };
            let on_winning_line = snapshot
                .winning_line
                .is_some_and(|line| line.contains(&index));
            let text = if on_winning_line { text.on_green() } else { text };
            cells.push(text.to_string());
        }
        println!("  {}", cells.join(" "));
    }
    println!();
    println!(
        "  {}: {}   {}: {}   draws: {}",
        game.player_name(Player::First),
        snapshot.scores.first_wins,
        game.player_name(Player::Second),
        snapshot.scores.second_wins,
        snapshot.scores.draws
    );
    match snapshot.phase {
        Phase::InProgress => {}
        Phase::Won(winner) => println!("  {} wins!", game.player_name(winner).green().bold()),
        Phase::Drawn => println!("  It's a draw."),
    }
    println!();
}
