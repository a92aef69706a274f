//! src/error.rs
//!
//! Defines the library's custom, comprehensive `Error` enum using `thiserror`.

use std::net::SocketAddr;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize or deserialize: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Tokio task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Failed to join multicast group {0}: {1}")]
    MulticastJoin(std::net::Ipv4Addr, #[source] std::io::Error),

    #[error("RPC transport failed: {0}")]
    Rpc(#[from] RpcError),

    #[error("startup failed: {0}")]
    Startup(String),
}

/// The four failure modes the RPC transport contract (spec §4.2) surfaces to
/// callers. Any of these is a terminal signal for the current session; there
/// are no retries at this layer.
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("peer {0} unreachable: {1}")]
    Unreachable(SocketAddr, #[source] std::io::Error),
    #[error("local RPC server is not bound")]
    NotBound,
    #[error("malformed peer address '{0}'")]
    MalformedAddress(String),
    #[error("remote raised an exception: {0}")]
    RemoteException(String),
}
