//! src/peer/turn.rs
//!
//! The token-passing game loop: while holding the token,
//! prompt for a move, apply it, announce it, then either hand off the
//! result (terminal outcome) or flip the token and hand off the move.

use super::client;
use super::game_end;
use super::PeerCore;
use crate::interaction::MoveInput;
use std::sync::Arc;

/// Spawns the interactive turn as its own task, so the caller (a
/// matchmaking round, an inbound `receiveToken`/`startRematch` handler)
/// never blocks on user input while holding the session lock.
pub(super) fn schedule_turn(core: Arc<PeerCore>) {
    tokio::spawn(async move {
        run_turn(core).await;
    });
}

async fn run_turn(core: Arc<PeerCore>) {
    let (opponent_id, my_symbol) = {
        let state = core.state.lock().await;
        let Some(session) = state.session.as_ref() else {
            return;
        };
        if !session.has_token {
            return;
        }
        (session.opponent_id.clone(), session.my_symbol)
    };

    let (row, col) = loop {
        match core.interaction.prompt_move().await {
            MoveInput::Quit => {
                let _ = client::no_rematch(&opponent_id).await;
                game_end::on_no_rematch(&core).await;
                return;
            }
            MoveInput::Move(row, col) => {
                let applied = {
                    let mut state = core.state.lock().await;
                    let Some(session) = state.session.as_mut() else {
                        return;
                    };
                    if !session.has_token {
                        // The token moved on without us (e.g. a concurrent
                        // teardown); a stale prompt is a no-op, not an error.
                        return;
                    }
                    if session.board.is_valid(row, col) {
                        session.board.apply(row, col, my_symbol);
                        true
                    } else {
                        false
                    }
                };
                if applied {
                    break (row, col);
                }
                tracing::warn!("That cell is taken or out of range; try again.");
            }
        }
    };

    let (outcome, rendered) = {
        let state = core.state.lock().await;
        match state.session.as_ref() {
            Some(session) => (session.board.check(), session.board.render()),
            None => return,
        }
    };
    tracing::info!("\n{rendered}");

    if client::update_move(&opponent_id, row, col, my_symbol, outcome).await.is_err() {
        tracing::warn!(opponent = %opponent_id, "updateMove failed; opponent unreachable, terminating match.");
        game_end::end_game(&core).await;
        return;
    }

    if outcome.is_terminal() {
        game_end::handle_game_end(core, outcome).await;
        return;
    }

    {
        let mut state = core.state.lock().await;
        if let Some(session) = state.session.as_mut() {
            session.has_token = false;
        }
    }
    // updateMove succeeded before we ever send receiveToken (spec §5
    // ordering guarantee). If this fails, the opponent is gone and we
    // must not sit forever without the token.
    if client::receive_token(&opponent_id).await.is_err() {
        tracing::warn!(opponent = %opponent_id, "receiveToken failed; opponent unreachable, terminating match.");
        game_end::end_game(&core).await;
    }
}
