//! src/peer/matchmaking.rs
//!
//! The distributed matchmaking timer: periodically samples
//! the membership view, filters to free peers, applies last-opponent
//! avoidance, picks a deterministic target, and runs the propose/confirm
//! handshake. Guarded throughout by "if inGame or not lookingForMatches,
//! abort" — a failed or aborted round is silent and simply waits for the
//! next tick.

use super::client;
use super::state::Session;
use super::PeerCore;
use crate::board::{Board, Symbol};
use crate::ids::PeerId;
use std::sync::Arc;
use tokio::time::{self, Duration};

pub(super) async fn run_loop(core: Arc<PeerCore>) {
    tracing::info!(peer_id = %core.self_id, "Matchmaking timer started");
    time::sleep(Duration::from_millis(core.config.matchmaking_initial_delay_ms)).await;
    let mut ticker = time::interval(Duration::from_millis(core.config.matchmaking_period_ms));

    loop {
        tokio::select! {
            _ = core.shutdown_signal() => {
                tracing::info!("Matchmaking timer received shutdown signal.");
                break;
            }
            _ = ticker.tick() => {
                run_round(&core).await;
            }
        }
    }
}

/// One matchmaking round. Returns early (aborts) at any of the guarded
/// points; every abort is silent by design.
async fn run_round(core: &Arc<PeerCore>) {
    {
        let state = core.state.lock().await;
        if state.in_game || !state.looking_for_matches {
            return;
        }
    }

    // Step 1: snapshot the view, drop self, sort.
    let mut candidates: Vec<PeerId> = core.view.snapshot();
    candidates.retain(|id| id != &core.self_id);
    if candidates.is_empty() {
        return;
    }
    candidates.sort();

    // Step 2: filter to peers that answer ping(true). RPC failures
    // silently exclude the candidate.
    let mut free = Vec::with_capacity(candidates.len());
    for id in candidates {
        if let Ok(true) = client::ping(&id).await {
            free.push(id);
        }
    }
    if free.is_empty() {
        return;
    }

    // Step 3: last-opponent avoidance.
    let last_opponent = core.state.lock().await.last_opponent_id.clone();
    if let Some(last) = last_opponent {
        if free.contains(&last) {
            if free.len() == 1 {
                return;
            }
            free.retain(|id| id != &last);
        }
    }

    // Step 4: deterministic target selection.
    let Some(target) = select_target(&core.self_id, free) else {
        return;
    };

    // Step 5: propose.
    match client::propose_match(&target, core.self_id.clone()).await {
        Ok(true) => {}
        _ => return,
    }

    // Step 6: commit under the lock.
    let i_start = core.self_id < target;
    {
        let mut state = core.state.lock().await;
        if state.in_game || !state.looking_for_matches {
            return;
        }
        let (my_symbol, has_token) = if i_start { (Symbol::X, true) } else { (Symbol::O, false) };
        state.in_game = true;
        state.session = Some(Session {
            opponent_id: target.clone(),
            my_symbol,
            has_token,
            board: Board::new(),
        });
        core.rematch.clear();
    }
    tracing::info!(opponent = %target, my_symbol = %if i_start { Symbol::X } else { Symbol::O }, "Match started with {target}");

    // Step 7: confirm. A failure here means the committed session must be
    // torn down immediately rather than left dangling.
    let opponent_symbol = if i_start { Symbol::O } else { Symbol::X };
    if client::confirm_match(&target, core.self_id.clone(), !i_start, opponent_symbol)
        .await
        .is_err()
    {
        tracing::warn!(opponent = %target, "confirmMatch failed; tearing down the session");
        super::game_end::end_game(core).await;
        return;
    }

    // Step 8.
    if i_start {
        super::turn::schedule_turn(core.clone());
    }
}

/// Deterministic successor rule: the lexicographic successor of `self_id`
/// among `candidates`, or the smallest candidate if `self_id` has no
/// successor in the list.
fn select_target(self_id: &str, mut candidates: Vec<PeerId>) -> Option<PeerId> {
    candidates.sort();
    if let Some(successor) = candidates.iter().find(|c| c.as_str() > self_id) {
        return Some(successor.clone());
    }
    candidates.into_iter().next()
}
