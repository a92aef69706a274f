//! src/peer/state.rs
//!
//! Per-peer mutable state: game session, last-opponent memo, and the
//! looking-for-matches flag, all guarded by the single `tokio::sync::Mutex`
//! owned by `PeerCore`. Every mutation of session fields goes through that
//! one lock.

use crate::board::{Board, Symbol};
use crate::ids::PeerId;

/// An active two-peer game session. Exists only while `PeerState::in_game`
/// is true. The opponent handle is just `opponent_id` here — the RPC
/// binding resolves an id to a connection on every call, so there is
/// nothing else to cache.
pub struct Session {
    pub opponent_id: PeerId,
    pub my_symbol: Symbol,
    pub has_token: bool,
    pub board: Board,
}

/// All per-peer mutable state.
pub struct PeerState {
    pub in_game: bool,
    pub session: Option<Session>,
    pub looking_for_matches: bool,
    pub last_opponent_id: Option<PeerId>,
}

impl PeerState {
    pub fn new() -> Self {
        Self {
            in_game: false,
            session: None,
            looking_for_matches: true,
            last_opponent_id: None,
        }
    }
}

impl Default for PeerState {
    fn default() -> Self {
        Self::new()
    }
}
