//! src/peer/game_end.rs
//!
//! Terminal-outcome handling: rematch consensus and clean teardown. Both
//! peers reach `handle_game_end` independently
//! — one by playing the terminal move locally, the other by receiving it
//! via `updateMove` — so neither side assumes it is the only caller.

use super::client;
use super::PeerCore;
use crate::board::{Outcome, Symbol};
use crate::ids::PeerId;
use std::sync::Arc;

/// Entry point reached by both peers on a terminal board outcome. The
/// lexicographically smaller id is the coordinator; it drives the
/// consensus, the other side answers and waits.
pub(super) async fn handle_game_end(core: Arc<PeerCore>, outcome: Outcome) {
    let opponent_id = {
        let state = core.state.lock().await;
        match state.session.as_ref() {
            Some(session) => session.opponent_id.clone(),
            None => return,
        }
    };

    match outcome {
        Outcome::Win(symbol) => tracing::info!(winner = %symbol, "Game over"),
        Outcome::Draw => tracing::info!("Game over: draw"),
        Outcome::InProgress => return,
    }

    if *core.self_id() < opponent_id {
        run_coordinator(core, opponent_id).await;
    } else {
        run_non_coordinator(core).await;
    }
}

async fn run_coordinator(core: Arc<PeerCore>, opponent_id: PeerId) {
    let my_answer = core.interaction.prompt_yes_no("Play again?").await;
    core.rematch.set(my_answer);

    let opponent_answer = match client::get_rematch_decision(&opponent_id).await {
        Ok(answer) => answer,
        Err(_) => {
            tracing::warn!(opponent = %opponent_id, "Opponent unreachable while awaiting rematch decision.");
            end_game(&core).await;
            prompt_stay_in_queue(&core).await;
            return;
        }
    };

    if !(my_answer && opponent_answer) {
        tracing::info!("Opponent refused rematch.");
        let _ = client::no_rematch(&opponent_id).await;
        on_no_rematch(&core).await;
        return;
    }

    let my_previous_symbol = {
        let state = core.state.lock().await;
        state.session.as_ref().map(|s| s.my_symbol)
    };
    let Some(my_previous_symbol) = my_previous_symbol else {
        return;
    };

    // The peer whose previous symbol was O starts the next game; each
    // peer's new symbol is the flip of its previous one.
    let my_new_symbol = my_previous_symbol.opposite();
    let opponent_new_symbol = my_previous_symbol;
    let i_start = my_previous_symbol == Symbol::O;

    if client::start_rematch(&opponent_id, !i_start, opponent_new_symbol).await.is_err() {
        tracing::warn!(opponent = %opponent_id, "startRematch failed; declining the rematch instead.");
        let _ = client::no_rematch(&opponent_id).await;
        on_no_rematch(&core).await;
        return;
    }
    start_rematch_locally(&core, i_start, my_new_symbol).await;
}

async fn run_non_coordinator(core: Arc<PeerCore>) {
    let my_answer = core.interaction.prompt_yes_no("Play again?").await;
    core.rematch.set(my_answer);
    // The coordinator drives the rest: it will call either `startRematch`
    // or `noRematch` on us next, handled in `dispatcher.rs`.
}

/// Shared by the coordinator (after a successful `startRematch` RPC to the
/// opponent) and the non-coordinator's inbound `startRematch` handler. If the
/// session was already torn down by the time this arrives (e.g. a liveness
/// probe's `end_game` racing an in-flight `startRematch`), this is a no-op:
/// `in_game` is only ever set alongside a live session, never left dangling
/// with `session = None`.
pub(super) async fn start_rematch_locally(core: &Arc<PeerCore>, i_start_with_token: bool, new_symbol: Symbol) {
    let started = {
        let mut state = core.state.lock().await;
        match state.session.as_mut() {
            Some(session) => {
                session.my_symbol = new_symbol;
                session.has_token = i_start_with_token;
                session.board.reset();
                state.in_game = true;
                core.rematch.clear();
                true
            }
            None => false,
        }
    };
    if !started {
        tracing::debug!("startRematch arrived with no live session; ignoring");
        return;
    }
    tracing::info!("Rematch starting");
    if i_start_with_token {
        super::turn::schedule_turn(core.clone());
    }
}

/// Shared by the local `quit`/refusal path and the inbound `noRematch`
/// handler: print the closure message, end the game, then ask whether to
/// remain in the matchmaking pool.
pub(super) async fn on_no_rematch(core: &Arc<PeerCore>) {
    tracing::info!("Match over. No rematch.");
    end_game(core).await;
    prompt_stay_in_queue(core).await;
}

/// Atomic teardown: drops the session (board, opponent handle, token),
/// remembers the opponent for last-opponent avoidance, and clears the
/// rematch slot.
pub(super) async fn end_game(core: &Arc<PeerCore>) {
    let mut state = core.state.lock().await;
    if let Some(session) = state.session.take() {
        state.last_opponent_id = Some(session.opponent_id);
    }
    state.in_game = false;
    core.rematch.clear();
}

async fn prompt_stay_in_queue(core: &Arc<PeerCore>) {
    let stay = core.interaction.prompt_yes_no("Stay in the matchmaking queue?").await;
    if stay {
        core.state.lock().await.looking_for_matches = true;
        tracing::info!("Returning to queue.");
    } else {
        core.state.lock().await.looking_for_matches = false;
        tracing::info!("Opting out of matchmaking. Shutting down.");
        core.shutdown.cancel();
    }
}
