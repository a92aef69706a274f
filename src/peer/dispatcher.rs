//! src/peer/dispatcher.rs
//!
//! Answers the eleven inbound remote operations of spec §4.4. This is the
//! `publish` side of the RPC contract: `PeerCore` implements `rpc::Dispatcher`
//! so `rpc::RpcServer` can hand it decoded requests and write back whatever
//! it returns.

use super::game_end;
use super::state::Session;
use super::PeerCore;
use crate::board::{Board, Outcome, Symbol};
use crate::ids::PeerId;
use crate::rpc::{self, Dispatcher, Request, Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::time::Duration;

impl Dispatcher for PeerCore {
    fn dispatch(self: Arc<Self>, request: Request) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        Box::pin(async move { self.handle(request).await })
    }
}

impl PeerCore {
    async fn handle(self: Arc<Self>, request: Request) -> Response {
        match request {
            Request::Ping => Response::Bool(self.handle_ping().await),
            Request::GetId => Response::Id(self.self_id.clone()),
            Request::IsInGame => Response::Bool(self.state.lock().await.in_game),
            Request::ProposeMatch { proposer_id } => Response::Bool(self.handle_propose_match(proposer_id).await),
            Request::ConfirmMatch {
                opponent_id,
                i_start_with_token,
                my_symbol,
            } => {
                self.handle_confirm_match(opponent_id, i_start_with_token, my_symbol).await;
                Response::Unit
            }
            Request::ReceiveToken => {
                self.handle_receive_token().await;
                Response::Unit
            }
            Request::UpdateMove { row, col, symbol, result } => {
                self.handle_update_move(row as usize, col as usize, symbol, result).await;
                Response::Unit
            }
            Request::GetRematchDecision => Response::Bool(self.rematch.wait().await),
            Request::StartRematch {
                i_start_with_token,
                new_symbol,
            } => {
                game_end::start_rematch_locally(&self, i_start_with_token, new_symbol).await;
                Response::Unit
            }
            Request::NoRematch => {
                game_end::on_no_rematch(&self).await;
                Response::Unit
            }
        }
    }

    /// `ping` result: true iff looking for matches and not currently in a
    /// game (spec §4.4).
    async fn handle_ping(&self) -> bool {
        let state = self.state.lock().await;
        state.looking_for_matches && !state.in_game
    }

    /// Accepted iff not in game, looking for matches, and the proposer's id
    /// is lexicographically smaller than ours (spec §4.4.1 inbound
    /// acceptance rule). On acceptance, a tentative session is recorded but
    /// `inGame` stays false until `confirmMatch` arrives — closing that
    /// window is `confirmMatch`'s job. A bounded timer reverts the
    /// tentative assignment if `confirmMatch` never shows up (spec §9 Open
    /// Questions: the source has no timer; this implementation adds the
    /// recommended one).
    async fn handle_propose_match(self: Arc<Self>, proposer_id: PeerId) -> bool {
        if rpc::resolve(&proposer_id).is_err() {
            return false;
        }
        {
            let mut state = self.state.lock().await;
            if state.in_game || !state.looking_for_matches || !(proposer_id < self.self_id) {
                return false;
            }
            state.session = Some(Session {
                opponent_id: proposer_id.clone(),
                my_symbol: Symbol::X, // placeholder; confirmMatch overwrites it before inGame ever becomes true.
                has_token: false,
                board: Board::new(),
            });
        }

        let core = self.clone();
        let timeout = Duration::from_millis(self.config.propose_confirm_timeout_ms);
        let reverted_for = proposer_id;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let mut state = core.state.lock().await;
            if !state.in_game {
                if matches!(&state.session, Some(s) if s.opponent_id == reverted_for) {
                    tracing::debug!(proposer = %reverted_for, "confirmMatch never arrived; reverting tentative assignment");
                    state.session = None;
                }
            }
        });

        true
    }

    /// Completes the matchmaking handshake (spec §4.4.1 step 7, received
    /// side): sets the session's symbols/token from the proposer's
    /// perspective and atomically flips `inGame` to true, closing the
    /// window opened by `proposeMatch`. Guarded against a delayed
    /// `confirmMatch` landing after this peer is already `inGame` (with this
    /// opponent via a race, or a different one via its own matchmaking round
    /// in the meantime) — committing unconditionally here would clobber a
    /// live session and violate the single-token-holder invariant.
    async fn handle_confirm_match(self: Arc<Self>, opponent_id: PeerId, i_start_with_token: bool, my_symbol: Symbol) {
        {
            let mut state = self.state.lock().await;
            if state.in_game {
                tracing::debug!(opponent = %opponent_id, "confirmMatch arrived too late; already in a game");
                return;
            }
            state.session = Some(Session {
                opponent_id: opponent_id.clone(),
                my_symbol,
                has_token: i_start_with_token,
                board: Board::new(),
            });
            state.in_game = true;
            self.rematch.clear();
        }
        tracing::info!(opponent = %opponent_id, "Match confirmed");
        if i_start_with_token {
            super::turn::schedule_turn(self);
        }
    }

    /// Yields the turn: sets `hasToken = true` and schedules the
    /// interactive turn (spec §4.4.2).
    async fn handle_receive_token(self: Arc<Self>) {
        {
            let mut state = self.state.lock().await;
            let Some(session) = state.session.as_mut() else {
                return;
            };
            session.has_token = true;
        }
        super::turn::schedule_turn(self);
    }

    /// Applies the opponent's move if valid (an invalid one is silently
    /// ignored per spec §7), renders the board, and — on a terminal
    /// outcome — schedules rematch handling. The token is never granted
    /// here; that is `receiveToken`'s job, sent separately and after this
    /// call returns (spec §4.4.2/§5 ordering guarantee).
    async fn handle_update_move(self: Arc<Self>, row: usize, col: usize, symbol: Symbol, result: Outcome) {
        let terminal = {
            let mut state = self.state.lock().await;
            let Some(session) = state.session.as_mut() else {
                return;
            };
            if session.board.is_valid(row, col) {
                session.board.apply(row, col, symbol);
            }
            tracing::info!("\n{}", session.board.render());
            result.is_terminal()
        };
        if terminal {
            tokio::spawn(async move { game_end::handle_game_end(self, result).await });
        }
    }
}
