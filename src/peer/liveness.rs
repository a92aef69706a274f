//! src/peer/liveness.rs
//!
//! Opponent liveness monitoring: while inGame, periodically pings the
//! current opponent. The RPC transport itself never times out or retries,
//! so this probe is the only mechanism that notices a crashed or
//! disconnected opponent and reclaims the peer from a stranded session.

use super::client;
use super::game_end;
use super::PeerCore;
use std::sync::Arc;
use tokio::time::{self, Duration};

pub(super) async fn run_loop(core: Arc<PeerCore>) {
    tracing::info!(peer_id = %core.self_id, "Liveness probe started");
    let mut ticker = time::interval(Duration::from_millis(core.config.liveness_period_ms));

    loop {
        tokio::select! {
            _ = core.shutdown_signal() => {
                tracing::info!("Liveness probe received shutdown signal.");
                break;
            }
            _ = ticker.tick() => {
                probe(&core).await;
            }
        }
    }
}

async fn probe(core: &Arc<PeerCore>) {
    let opponent_id = {
        let state = core.state.lock().await;
        if !state.in_game {
            return;
        }
        match state.session.as_ref() {
            Some(session) => session.opponent_id.clone(),
            None => return,
        }
    };

    if client::ping(&opponent_id).await.is_err() {
        tracing::warn!(opponent = %opponent_id, "Opponent unreachable, terminating match.");
        game_end::end_game(core).await;
    }
}
