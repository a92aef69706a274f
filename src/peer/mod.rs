//! src/peer/mod.rs
//!
//! The Peer core (spec §4.4): the only inter-peer surface beyond discovery,
//! and the component that owns matchmaking, the token-passing game loop,
//! rematch consensus, teardown, and liveness monitoring. Submodules:
//!
//! - `state`      — `PeerState`/`Session`, guarded by one mutex.
//! - `rematch`    — the single-shot rematch answer slot.
//! - `client`     — typed wrappers around the raw RPC transport.
//! - `dispatcher` — answers inbound calls (implements `rpc::Dispatcher`).
//! - `matchmaking`— the periodic propose/confirm timer (§4.4.1).
//! - `turn`       — the token-passing game loop (§4.4.2).
//! - `game_end`   — rematch consensus and teardown (§4.4.3/§4.4.4).
//! - `liveness`   — the opponent liveness probe (§4.4.5).

mod client;
mod dispatcher;
mod game_end;
mod liveness;
mod matchmaking;
pub mod rematch;
pub mod state;
mod turn;

use crate::config::Config;
use crate::discovery::ViewHandle;
use crate::ids::PeerId;
use crate::interaction::Interaction;
use rematch::RematchSlot;
use state::PeerState;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// The Peer core actor. Cheaply clonable via `Arc`; every async entry point
/// (inbound RPC dispatch, each timer loop, the interactive turn task) holds
/// its own `Arc<PeerCore>` clone.
pub struct PeerCore {
    self_id: PeerId,
    config: Config,
    state: Mutex<PeerState>,
    view: ViewHandle,
    rematch: RematchSlot,
    interaction: Arc<dyn Interaction>,
    /// Cancelled when the local user opts out of the matchmaking pool after
    /// a `noRematch` (spec §4.4.3: "cancel all timers, close discovery,
    /// exit"), or on a fatal startup error. Shared with the rest of the app
    /// so discovery and the RPC server tear down in lockstep.
    shutdown: CancellationToken,
}

impl PeerCore {
    pub fn new(
        self_id: PeerId,
        config: Config,
        view: ViewHandle,
        interaction: Arc<dyn Interaction>,
        shutdown: CancellationToken,
    ) -> Arc<Self> {
        Arc::new(Self {
            self_id,
            config,
            state: Mutex::new(PeerState::new()),
            view,
            rematch: RematchSlot::new(),
            interaction,
            shutdown,
        })
    }

    pub fn self_id(&self) -> &PeerId {
        &self.self_id
    }

    /// Spawns the matchmaking timer and liveness probe loops (spec §5: both
    /// are independent daemon loops driven by the running flag / shutdown
    /// token). The inbound RPC dispatcher is driven separately by
    /// `rpc::RpcServer`, which calls back into `PeerCore` via the
    /// `rpc::Dispatcher` impl in `dispatcher.rs`.
    pub fn spawn_loops(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        vec![
            tokio::spawn(matchmaking::run_loop(self.clone())),
            tokio::spawn(liveness::run_loop(self.clone())),
        ]
    }

    /// True once the local user has opted out of the matchmaking pool and
    /// the whole app should shut down (spec §4.4.3 "Stay-in-queue").
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub async fn shutdown_signal(&self) {
        self.shutdown.cancelled().await
    }

    /// A handle to this peer's membership view, for a caller that wants to
    /// seed or inspect it directly (the integration test harness; a future
    /// status/metrics surface).
    pub fn view(&self) -> ViewHandle {
        self.view.clone()
    }

    pub async fn is_in_game(&self) -> bool {
        self.state.lock().await.in_game
    }

    pub async fn is_looking_for_matches(&self) -> bool {
        self.state.lock().await.looking_for_matches
    }

    pub async fn last_opponent(&self) -> Option<PeerId> {
        self.state.lock().await.last_opponent_id.clone()
    }

    /// The rendered board of the current session, if any — for tests and
    /// any future status surface to observe game progress without reaching
    /// into `PeerState` directly.
    pub async fn board_render(&self) -> Option<String> {
        self.state.lock().await.session.as_ref().map(|s| s.board.render())
    }

    pub async fn has_token(&self) -> bool {
        self.state.lock().await.session.as_ref().map(|s| s.has_token).unwrap_or(false)
    }

    pub async fn my_symbol(&self) -> Option<crate::board::Symbol> {
        self.state.lock().await.session.as_ref().map(|s| s.my_symbol)
    }
}
