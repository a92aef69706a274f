//! src/peer/client.rs
//!
//! Typed wrappers around the raw RPC transport, one per remote operation a
//! peer exposes, so call sites in `matchmaking`/`turn`/`game_end` never touch
//! `rpc::Request`/`rpc::Response` directly.

use crate::board::{Outcome, Symbol};
use crate::error::RpcError;
use crate::ids::PeerId;
use crate::rpc::{self, Request, Response};

pub async fn ping(id: &PeerId) -> Result<bool, RpcError> {
    Ok(rpc::invoke(id, &Request::Ping).await?.as_bool())
}

#[allow(dead_code)] // part of the public RPC surface; exercised via dispatcher tests.
pub async fn get_id(id: &PeerId) -> Result<PeerId, RpcError> {
    match rpc::invoke(id, &Request::GetId).await? {
        Response::Id(s) => Ok(s),
        _ => Err(RpcError::RemoteException("unexpected response to getId".into())),
    }
}

#[allow(dead_code)] // part of the public RPC surface; no caller needs it locally today.
pub async fn is_in_game(id: &PeerId) -> Result<bool, RpcError> {
    Ok(rpc::invoke(id, &Request::IsInGame).await?.as_bool())
}

pub async fn propose_match(id: &PeerId, proposer_id: PeerId) -> Result<bool, RpcError> {
    Ok(rpc::invoke(id, &Request::ProposeMatch { proposer_id }).await?.as_bool())
}

/// Arguments are from the callee's perspective, matching the
/// `confirmMatch(opponentId, iStartWithToken, mySymbol)` signature exactly.
pub async fn confirm_match(id: &PeerId, opponent_id: PeerId, i_start_with_token: bool, my_symbol: Symbol) -> Result<(), RpcError> {
    rpc::invoke(
        id,
        &Request::ConfirmMatch {
            opponent_id,
            i_start_with_token,
            my_symbol,
        },
    )
    .await?;
    Ok(())
}

pub async fn receive_token(id: &PeerId) -> Result<(), RpcError> {
    rpc::invoke(id, &Request::ReceiveToken).await?;
    Ok(())
}

pub async fn update_move(id: &PeerId, row: usize, col: usize, symbol: Symbol, result: Outcome) -> Result<(), RpcError> {
    rpc::invoke(
        id,
        &Request::UpdateMove {
            row: row as u8,
            col: col as u8,
            symbol,
            result,
        },
    )
    .await?;
    Ok(())
}

pub async fn get_rematch_decision(id: &PeerId) -> Result<bool, RpcError> {
    Ok(rpc::invoke(id, &Request::GetRematchDecision).await?.as_bool())
}

pub async fn start_rematch(id: &PeerId, i_start_with_token: bool, new_symbol: Symbol) -> Result<(), RpcError> {
    rpc::invoke(
        id,
        &Request::StartRematch {
            i_start_with_token,
            new_symbol,
        },
    )
    .await?;
    Ok(())
}

pub async fn no_rematch(id: &PeerId) -> Result<(), RpcError> {
    rpc::invoke(id, &Request::NoRematch).await?;
    Ok(())
}
