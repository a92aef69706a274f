//! src/cli.rs
//!
//! Command-line argument parsing for the launcher: zero, one, or two
//! positional arguments, `[host [port]]`, per spec §6.

use clap::Parser;

/// A fully decentralized peer-to-peer tic-tac-toe node.
#[derive(Parser, Debug)]
#[command(name = "tactoe-mesh", about = "Peer-to-peer tic-tac-toe node", version)]
pub struct Cli {
    /// Host/IP to bind the RPC listener on. Defaults to the local machine's
    /// address when omitted.
    pub host: Option<String>,

    /// Port to bind the RPC listener on. Defaults to an ephemeral port when
    /// omitted.
    pub port: Option<u16>,
}
