//! src/app.rs
//!
//! Defines the main `App` struct, which resolves the bind address, wires
//! Discovery, the RPC transport, and the Peer core together, and manages
//! the lifecycle of all the concurrent services that make up one peer
//! process.

use crate::cli::Cli;
use crate::config::Config;
use crate::discovery::Discovery;
use crate::error::{Error, Result};
use crate::ids::PeerId;
use crate::interaction::{Interaction, StdIoInteraction};
use crate::peer::PeerCore;
use crate::rpc::RpcServer;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Encapsulates one peer process, from bind-address resolution through
/// graceful shutdown.
pub struct App {
    cli: Cli,
    config: Config,
    interaction: Arc<dyn Interaction>,
    shutdown: CancellationToken,
}

impl App {
    /// Creates a new `App` from parsed CLI arguments and loaded config,
    /// with the default stdin/stdout interaction adapter.
    pub fn new(cli: Cli, config: Config) -> Result<Self> {
        Ok(Self::with_interaction(cli, config, Arc::new(StdIoInteraction)))
    }

    /// As `new`, but with a caller-supplied `Interaction` adapter — used by
    /// the integration test harness to drive moves/rematch decisions
    /// programmatically instead of from a real terminal.
    pub fn with_interaction(cli: Cli, config: Config, interaction: Arc<dyn Interaction>) -> Self {
        Self {
            cli,
            config,
            interaction,
            shutdown: CancellationToken::new(),
        }
    }

    /// A handle that can be used to request shutdown externally (e.g. from
    /// a test harness that wants to tear a node down early).
    pub fn shutdown_handle(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// The main run loop:
    ///   1. Resolve the bind address (`[host [port]]`).
    ///   2. Bind the RPC listener — this is how we learn our logical id.
    ///   3. Bind Discovery and start advertising/gathering membership.
    ///   4. Construct the Peer core and spawn its timer loops.
    ///   5. Wait for a shutdown signal (Ctrl+C, or the peer opting out of
    ///      matchmaking after a declined rematch) and tear everything down.
    pub async fn run(self) -> Result<()> {
        let host = resolve_host(self.cli.host.clone())?;
        let requested_port = self.cli.port.unwrap_or(0);
        let bind_addr = SocketAddr::new(host, requested_port);

        let rpc_server = RpcServer::bind(bind_addr).await?;
        let self_id: PeerId = rpc_server.local_addr().to_string();
        tracing::info!(self_id = %self_id, "Starting peer");

        let discovery = Discovery::bind(&self.config, self_id.clone())?;
        let view = discovery.view();

        let peer = PeerCore::new(self_id, self.config, view, self.interaction, self.shutdown.clone());

        let discovery_task = tokio::spawn(discovery.run(self.shutdown.clone()));
        let rpc_task = tokio::spawn(rpc_server.run(peer.clone(), self.shutdown.clone()));
        let peer_tasks = peer.spawn_loops();

        let ctrl_c_shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl+C received. Initiating graceful shutdown...");
                ctrl_c_shutdown.cancel();
            }
        });

        self.shutdown.cancelled().await;

        if let Err(e) = discovery_task.await {
            tracing::error!(error = ?e, "Discovery task failed");
        }
        if let Err(e) = rpc_task.await {
            tracing::error!(error = ?e, "RPC server task failed");
        }
        for task in peer_tasks {
            if let Err(e) = task.await {
                tracing::error!(error = ?e, "Peer core task failed");
            }
        }

        tracing::info!("Peer shut down gracefully.");
        Ok(())
    }
}

/// Resolves the bind host: the given literal IP if one was supplied on the
/// command line, otherwise the local machine's routable address — with zero
/// args, a peer binds to the local machine's address.
fn resolve_host(host: Option<String>) -> Result<IpAddr> {
    match host {
        Some(h) => h
            .parse::<IpAddr>()
            .map_err(|_| Error::Startup(format!("invalid host '{h}'"))),
        None => local_ip(),
    }
}

/// Learns the local machine's outbound-routable address by connecting a
/// UDP socket to a public address; no packet is actually sent, this only
/// asks the OS's routing table which local interface it would use.
fn local_ip() -> Result<IpAddr> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0")?;
    socket.connect("8.8.8.8:80")?;
    Ok(socket.local_addr()?.ip())
}
