//! src/interaction.rs
//!
//! The pluggable console adapter (spec §4.5/§6). Kept behind a trait so the
//! Peer core never touches stdin directly and the session lock is never
//! held while waiting on a human.

use std::future::Future;
use std::io::{self, BufRead, Write};
use std::pin::Pin;

/// What the user typed at the move prompt, already range-checked and
/// converted to 0-based coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveInput {
    Move(usize, usize),
    Quit,
}

/// Prompts for moves, rematch decisions, and the stay-in-queue decision.
/// Every method loops internally until it has a syntactically valid answer
/// (spec §7: malformed input is non-fatal, re-prompt) — callers never see a
/// parse failure, only the final answer.
pub trait Interaction: Send + Sync + 'static {
    fn prompt_move(&self) -> Pin<Box<dyn Future<Output = MoveInput> + Send + '_>>;

    /// `prompt` is shown before the `(s/n)` suffix. Used for both the
    /// rematch prompt and the stay-in-queue prompt (spec §6: yes iff the
    /// answer starts with 's'/'S').
    fn prompt_yes_no(&self, prompt: &str) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}

/// Reads moves and yes/no answers from stdin, one blocking line at a time.
/// Each prompt runs on a `spawn_blocking` task so it never stalls the
/// tokio runtime (or any inbound RPC) while waiting on the terminal.
pub struct StdIoInteraction;

impl Interaction for StdIoInteraction {
    fn prompt_move(&self) -> Pin<Box<dyn Future<Output = MoveInput> + Send + '_>> {
        Box::pin(async move {
            tokio::task::spawn_blocking(read_move_blocking)
                .await
                .unwrap_or(MoveInput::Quit)
        })
    }

    fn prompt_yes_no(&self, prompt: &str) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        let prompt = prompt.to_string();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || read_yes_no_blocking(&prompt))
                .await
                .unwrap_or(false)
        })
    }
}

fn read_move_blocking() -> MoveInput {
    let stdin = io::stdin();
    loop {
        print!("Your move (row col, 1-3) or 'quit': ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
            // EOF on stdin: treat like the player walked away.
            return MoveInput::Quit;
        }
        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") {
            return MoveInput::Quit;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 2 {
            println!("Enter two numbers separated by a space, e.g. '1 3', or 'quit'.");
            continue;
        }
        match (parts[0].parse::<usize>(), parts[1].parse::<usize>()) {
            (Ok(r), Ok(c)) if (1..=3).contains(&r) && (1..=3).contains(&c) => {
                return MoveInput::Move(r - 1, c - 1);
            }
            _ => println!("Row and column must each be 1, 2, or 3."),
        }
    }
}

fn read_yes_no_blocking(prompt: &str) -> bool {
    let stdin = io::stdin();
    print!("{prompt} (s/n): ");
    let _ = io::stdout().flush();
    let mut line = String::new();
    let _ = stdin.lock().read_line(&mut line);
    line.trim().to_ascii_lowercase().starts_with('s')
}
