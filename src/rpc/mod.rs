//! src/rpc/mod.rs
//!
//! The RPC transport: a location-transparent request/response
//! channel keyed by peer id. `resolve`/`invoke` are free functions (no
//! connection pooling — one TCP connection per call, closed after the
//! response, matching the "no retries at this layer" contract exactly).
//! `RpcServer` is the `publish` half: it binds a listener and, for each
//! inbound call, hands the decoded `Request` to a `Dispatcher` and writes
//! back whatever `Response` it produces.

pub mod codec;

use crate::board::{Outcome, Symbol};
use crate::error::RpcError;
use crate::ids::PeerId;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

/// The ten remote operations a peer exposes to others, as an RPC request
/// envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Request {
    Ping,
    GetId,
    IsInGame,
    ProposeMatch { proposer_id: PeerId },
    ConfirmMatch { opponent_id: PeerId, i_start_with_token: bool, my_symbol: Symbol },
    ReceiveToken,
    UpdateMove { row: u8, col: u8, symbol: Symbol, result: Outcome },
    GetRematchDecision,
    StartRematch { i_start_with_token: bool, new_symbol: Symbol },
    NoRematch,
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::Ping => "ping",
            Request::GetId => "getId",
            Request::IsInGame => "isInGame",
            Request::ProposeMatch { .. } => "proposeMatch",
            Request::ConfirmMatch { .. } => "confirmMatch",
            Request::ReceiveToken => "receiveToken",
            Request::UpdateMove { .. } => "updateMove",
            Request::GetRematchDecision => "getRematchDecision",
            Request::StartRematch { .. } => "startRematch",
            Request::NoRematch => "noRematch",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Response {
    Bool(bool),
    Id(PeerId),
    Unit,
}

impl Response {
    pub fn as_bool(&self) -> bool {
        matches!(self, Response::Bool(true))
    }
}

/// Resolves a peer id to a socket address. The only failure mode at this
/// step is a malformed id.
pub fn resolve(id: &PeerId) -> Result<SocketAddr, RpcError> {
    id.parse().map_err(|_| RpcError::MalformedAddress(id.clone()))
}

/// Opens a one-shot TCP connection to `id`, sends `request`, and returns
/// the decoded response. Any I/O failure (connection refused, reset,
/// timeout) surfaces as `RpcError::Unreachable`; a response that fails to
/// decode surfaces as `RpcError::RemoteException`.
pub async fn invoke(id: &PeerId, request: &Request) -> Result<Response, RpcError> {
    let addr = resolve(id)?;
    let mut stream = TcpStream::connect(addr)
        .await
        .map_err(|e| RpcError::Unreachable(addr, e))?;
    let bytes = bincode::serialize(request).map_err(|e| RpcError::RemoteException(e.to_string()))?;
    codec::write_frame(&mut stream, &bytes)
        .await
        .map_err(|e| RpcError::Unreachable(addr, e))?;
    let response_bytes = codec::read_frame(&mut stream)
        .await
        .map_err(|e| RpcError::Unreachable(addr, e))?;
    bincode::deserialize(&response_bytes).map_err(|e| RpcError::RemoteException(e.to_string()))
}

/// Implemented by whatever owns the session state and should answer
/// inbound calls (the Peer core). Kept as a trait so `rpc` has no
/// dependency on `peer`.
pub trait Dispatcher: Send + Sync + 'static {
    fn dispatch(self: Arc<Self>, request: Request) -> Pin<Box<dyn Future<Output = Response> + Send>>;
}

/// The `publish` half of the transport contract: binds a TCP listener and
/// answers each inbound connection with exactly one request/response pair.
pub struct RpcServer {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl RpcServer {
    pub async fn bind(addr: SocketAddr) -> Result<Self, RpcError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| RpcError::Unreachable(addr, e))?;
        let local_addr = listener.local_addr().map_err(|e| RpcError::Unreachable(addr, e))?;
        Ok(Self { listener, local_addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn run<D: Dispatcher>(self, dispatcher: Arc<D>, shutdown: CancellationToken) {
        tracing::info!(addr = %self.local_addr, "RPC server listening");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("RPC server received shutdown signal.");
                    break;
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer_addr)) => {
                            let dispatcher = dispatcher.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, dispatcher).await {
                                    tracing::debug!(peer = %peer_addr, error = %e, "RPC connection ended with an error");
                                }
                            });
                        }
                        Err(e) => tracing::warn!(error = %e, "Failed to accept RPC connection"),
                    }
                }
            }
        }
    }
}

async fn handle_connection<D: Dispatcher>(mut stream: TcpStream, dispatcher: Arc<D>) -> std::io::Result<()> {
    let bytes = codec::read_frame(&mut stream).await?;
    let request: Request = bincode::deserialize(&bytes)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let response = dispatcher.dispatch(request).await;
    let response_bytes = bincode::serialize(&response)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    codec::write_frame(&mut stream, &response_bytes).await
}
